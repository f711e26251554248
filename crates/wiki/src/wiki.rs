//! The wiki and its per-chunk loop.
//!
//! For every chunk: build the prompt, ask the agent (with bounded retries),
//! dispatch the returned tool calls into section buffers, then run an update
//! pass over every attribute.

use chrono::Utc;
use lorewiki_core::error::{Error, ProviderError, WikiError};
use lorewiki_core::event::{EventBus, WikiEvent};
use lorewiki_core::message::Message;
use lorewiki_core::provider::{Provider, ProviderRequest, ToolDefinition};
use lorewiki_core::tool::{ToolCall, ToolResult};
use lorewiki_providers::RetryProvider;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::attribute::{NameSnapshot, UpdateContext, UpdateOutcome};
use crate::catalog::EntityKind;
use crate::chunker::{Chunk, estimate_tokens};
use crate::prompts;
use crate::section::Section;
use crate::store;
use crate::synth::{ProviderSynthesizer, Synthesizer};
use crate::tools::{self, TOOLS, WikiCommand};

/// Outcome of dispatching one agent response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub calls: usize,
    pub failed: usize,
    /// Whether a `generate_chunk_summary` call went through.
    pub summarized: bool,
}

/// Outcome of one update pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub updated: usize,
    pub failed: usize,
}

/// Totals over a run of chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub chunks: usize,
    pub tool_calls: usize,
    pub failed_calls: usize,
}

pub struct Wiki {
    name: String,
    sections: Vec<Section>,
    running_summary: VecDeque<String>,
    use_n_prev_chunks: usize,

    /// Provider the agent calls go to; wrapped in a retry per call
    agent: Option<Arc<dyn Provider>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_retries: u32,
    request_timeout: Option<Duration>,

    event_bus: Arc<EventBus>,
}

impl Wiki {
    /// An empty wiki with one section per entity kind and no backend.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sections: EntityKind::ALL.into_iter().map(Section::new).collect(),
            running_summary: VecDeque::new(),
            use_n_prev_chunks: 5,
            agent: None,
            synthesizer: None,
            model: String::new(),
            temperature: 0.7,
            max_tokens: None,
            max_retries: 10,
            request_timeout: None,
            event_bus: Arc::new(EventBus::default()),
        }
    }

    /// Build a wiki wired to `provider` for both the agent and update passes.
    pub fn from_config(config: &lorewiki_config::AppConfig, provider: Arc<dyn Provider>) -> Self {
        let model = lorewiki_providers::router::default_model(config);
        let synthesizer = ProviderSynthesizer::new(provider.clone(), &model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens);

        Self::new(&config.wiki.name)
            .with_agent(provider, model)
            .with_synthesizer(Arc::new(synthesizer))
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_prev_chunks(config.wiki.use_n_prev_chunks)
            .with_max_retries(config.wiki.max_retries)
            .with_request_timeout(Duration::from_secs(config.wiki.request_timeout_secs))
    }

    /// Set the provider and model used for agent calls.
    pub fn with_agent(mut self, provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        self.agent = Some(provider);
        self.model = model.into();
        self
    }

    /// Set the backend that rewrites text attributes.
    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Number of chunk summaries kept and shown to the agent.
    pub fn with_prev_chunks(mut self, n: usize) -> Self {
        self.use_n_prev_chunks = n;
        self
    }

    /// Attempts per agent call before the run is aborted.
    pub fn with_max_retries(mut self, max: u32) -> Self {
        self.max_retries = max;
        self
    }

    /// Limit on a single agent attempt; a timeout counts against the retries.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_event_bus(mut self, event_bus: Arc<EventBus>) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sections in declaration order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, kind: EntityKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind() == kind)
    }

    fn section_mut(&mut self, kind: EntityKind) -> Result<&mut Section, WikiError> {
        self.sections
            .iter_mut()
            .find(|s| s.kind() == kind)
            .ok_or_else(|| WikiError::SectionNotFound(kind.section_name().into()))
    }

    /// The last chunk summaries, oldest first.
    pub fn running_summary(&self) -> impl Iterator<Item = &str> {
        self.running_summary.iter().map(String::as_str)
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// Tool definitions for every section present plus the wiki-level tools.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        TOOLS
            .iter()
            .filter(|t| t.section().is_none_or(|kind| self.section(kind).is_some()))
            .map(|t| t.definition())
            .collect()
    }

    /// Push a chunk summary, keeping only the newest `use_n_prev_chunks`.
    pub fn generate_chunk_summary(&mut self, summary: impl Into<String>) {
        self.running_summary.push_back(summary.into());
        while self.running_summary.len() > self.use_n_prev_chunks {
            self.running_summary.pop_front();
        }
    }

    pub fn build_chunk_prompt(&self, chunk: &str) -> String {
        prompts::chunk_prompt(self.running_summary(), chunk)
    }

    /// Validate and execute one tool call.
    pub fn dispatch(&mut self, call: &ToolCall) -> lorewiki_core::Result<ToolResult> {
        let command = tools::parse(call)?;
        debug!(tool = %call.name, arguments = %call.arguments, "Dispatching tool call");
        let output = self.execute(command)?;
        Ok(ToolResult::ok(&call.id, output))
    }

    fn execute(&mut self, command: WikiCommand) -> Result<String, WikiError> {
        match command {
            WikiCommand::Create { kind, name } => {
                let section = self.section_mut(kind)?;
                let (_, created) = section.create(&name);
                if !created {
                    return Ok(format!("{kind} '{name}' already exists"));
                }
                self.event_bus.publish(WikiEvent::EntityCreated {
                    section: kind.section_name().into(),
                    name: name.clone(),
                    timestamp: Utc::now(),
                });
                Ok(format!("Added {kind} '{name}'"))
            }
            WikiCommand::Append {
                kind,
                name,
                attribute,
                content,
            } => {
                self.section_mut(kind)?.append(&name, attribute, &content)?;
                Ok(format!("Added to {name}'s {attribute}"))
            }
            WikiCommand::AddAlias { name, alias } => {
                self.section_mut(EntityKind::Character)?
                    .add_alias(&name, &alias)?;
                Ok(format!("'{alias}' is now an alias of {name}"))
            }
            WikiCommand::Summary(summary) => {
                self.generate_chunk_summary(summary);
                Ok("Summary recorded".into())
            }
            WikiCommand::DoNothing => Ok("Nothing to do".into()),
        }
    }

    /// Dispatch every tool call in an agent message. Failures are logged and
    /// skipped.
    pub fn process_response(&mut self, message: &Message) -> DispatchReport {
        let mut report = DispatchReport::default();

        for raw in &message.tool_calls {
            report.calls += 1;
            let result = ToolCall::from_message(raw)
                .map_err(Error::from)
                .and_then(|call| self.dispatch(&call));

            let success = result.is_ok();
            if let Err(e) = result {
                warn!(tool = %raw.name, error = %e, "Tool call failed");
                report.failed += 1;
            } else if raw.name == "generate_chunk_summary" {
                report.summarized = true;
            }

            self.event_bus.publish(WikiEvent::ToolDispatched {
                tool_name: raw.name.clone(),
                success,
                timestamp: Utc::now(),
            });
        }
        report
    }

    /// Run one chunk through the agent, dispatch, and update pass.
    ///
    /// Exhausting the retry bound is fatal and leaves the wiki untouched.
    pub async fn process_chunk(&mut self, chunk: &Chunk) -> lorewiki_core::Result<DispatchReport> {
        let Some(agent) = self.agent.clone() else {
            return Err(ProviderError::NotConfigured("no agent provider set".into()).into());
        };
        let mut provider = RetryProvider::new(agent, self.max_retries);
        if let Some(limit) = self.request_timeout {
            provider = provider.with_timeout(limit);
        }

        info!(
            chunk = chunk.index,
            source = %chunk.source,
            tokens = estimate_tokens(&chunk.text),
            "Processing chunk"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(prompts::AGENT_SYSTEM_PROMPT),
                Message::user(self.build_chunk_prompt(&chunk.text)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tool_definitions(),
        };
        let response = provider.complete(request).await?;

        if !response.message.content.is_empty() {
            debug!(text = %response.message.content, "Agent text output");
        }
        let report = self.process_response(&response.message);
        if !report.summarized {
            debug!(chunk = chunk.index, "Agent did not summarize the chunk");
        }

        let updates = self.update_sections(false).await;
        info!(
            chunk = chunk.index,
            calls = report.calls,
            failed = report.failed,
            updated = updates.updated,
            "Chunk done"
        );
        self.event_bus.publish(WikiEvent::ChunkProcessed {
            index: chunk.index,
            tool_calls: report.calls,
            failed_calls: report.failed,
            timestamp: Utc::now(),
        });
        Ok(report)
    }

    /// Process chunks in order until the source is exhausted.
    pub async fn read_chunks<'c>(
        &mut self,
        chunks: impl IntoIterator<Item = &'c Chunk>,
    ) -> lorewiki_core::Result<RunReport> {
        let mut run = RunReport::default();
        for chunk in chunks {
            let report = self.process_chunk(chunk).await?;
            run.chunks += 1;
            run.tool_calls += report.calls;
            run.failed_calls += report.failed;
        }
        Ok(run)
    }

    /// Update every due attribute, or every attribute when `force` is set.
    ///
    /// Order is section, then entity creation, then attribute declaration.
    /// Character names are resolved against a snapshot taken before the pass.
    pub async fn update_sections(&mut self, force: bool) -> UpdateReport {
        let characters: NameSnapshot = self
            .section(EntityKind::Character)
            .map(Section::name_snapshot)
            .unwrap_or_default();
        let synthesizer = self.synthesizer.clone();
        let event_bus = self.event_bus.clone();
        let mut report = UpdateReport::default();

        for section in &mut self.sections {
            let section_name = section.name();
            for entity in section.entities_mut() {
                let entity_name = entity.name().to_string();
                for attr in entity.attributes_mut() {
                    if !(force || attr.is_due()) {
                        debug!(
                            section = section_name,
                            entity = %entity_name,
                            attribute = attr.name(),
                            buffered = attr.buffer().len(),
                            "Not due"
                        );
                        continue;
                    }

                    let consumed = attr.buffer().len();
                    let ctx = UpdateContext {
                        section: section_name,
                        entity: &entity_name,
                    };
                    let outcome = attr.update(ctx, synthesizer.as_deref(), &characters).await;
                    if outcome == UpdateOutcome::Skipped {
                        continue;
                    }

                    info!(
                        section = section_name,
                        entity = %entity_name,
                        attribute = attr.name(),
                        consumed,
                        outcome = ?outcome,
                        "Updated attribute"
                    );
                    if outcome.is_success() {
                        report.updated += 1;
                    } else {
                        report.failed += 1;
                    }
                    event_bus.publish(WikiEvent::AttributeUpdated {
                        section: section_name.into(),
                        entity: entity_name.clone(),
                        attribute: attr.name().into(),
                        consumed,
                        success: outcome.is_success(),
                        timestamp: Utc::now(),
                    });
                }
            }
        }
        report
    }

    /// Write the markdown tree under `root`.
    pub async fn save(&self, root: &Path) -> lorewiki_core::Result<usize> {
        let files = store::save(&self.sections, root).await?;
        self.event_bus.publish(WikiEvent::WikiSaved {
            root: root.display().to_string(),
            files,
            timestamp: Utc::now(),
        });
        Ok(files)
    }

    /// Replace all sections with the tree saved under `root`.
    ///
    /// Buffers and the running summary are not persisted and start empty.
    pub async fn load(&mut self, root: &Path) -> lorewiki_core::Result<()> {
        self.sections = store::load(root).await?;
        self.running_summary.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedProvider, call, text_response, tool_response};
    use async_trait::async_trait;
    use lorewiki_core::error::ToolError;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records prompts and answers with a numbered rewrite.
    #[derive(Default)]
    struct RecordingSynth {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingSynth {
        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Synthesizer for RecordingSynth {
        async fn synthesize(&self, prompt: &str) -> Result<String, ProviderError> {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            Ok(format!("rewrite {}", prompts.len()))
        }
    }

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            source: "book.txt".into(),
            text: text.into(),
        }
    }

    fn tool(name: &str, arguments: serde_json::Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    fn characters(wiki: &Wiki) -> &Section {
        wiki.section(EntityKind::Character).unwrap()
    }

    #[test]
    fn new_wiki_has_all_sections() {
        let wiki = Wiki::new("Test");
        let names: Vec<_> = wiki.sections().iter().map(|s| s.name()).collect();
        assert_eq!(names, ["characters", "settings"]);
        assert_eq!(wiki.tool_definitions().len(), TOOLS.len());
    }

    #[test]
    fn running_summary_is_bounded_fifo() {
        let mut wiki = Wiki::new("Test").with_prev_chunks(2);
        for s in ["one", "two", "three"] {
            wiki.generate_chunk_summary(s);
        }
        let kept: Vec<_> = wiki.running_summary().collect();
        assert_eq!(kept, ["two", "three"]);
    }

    #[test]
    fn chunk_prompt_uses_running_summary() {
        let mut wiki = Wiki::new("Test");
        wiki.generate_chunk_summary("Klein woke up.");
        let prompt = wiki.build_chunk_prompt("He went to the club.");
        assert!(prompt.contains("```Klein woke up.```"));
        assert!(prompt.ends_with("#Current chunk:\n\nHe went to the club."));
    }

    #[test]
    fn dispatch_unknown_tool() {
        let mut wiki = Wiki::new("Test");
        let err = wiki.dispatch(&tool("summon", json!({}))).unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::NotFound(_))));
    }

    #[test]
    fn mutating_missing_entity_is_not_found() {
        let mut wiki = Wiki::new("Test");
        let err = wiki
            .dispatch(&tool(
                "add_to_character_personality",
                json!({"name": "Ghost", "content": "spooky"}),
            ))
            .unwrap_err();
        assert!(matches!(err, Error::Wiki(WikiError::EntityNotFound { .. })));
        assert!(characters(&wiki).is_empty());
    }

    #[test]
    fn alias_and_name_share_entity() {
        let mut wiki = Wiki::new("Test");
        wiki.dispatch(&tool("add_character", json!({"name": "Alice"}))).unwrap();
        wiki.dispatch(&tool(
            "add_to_character_aliases",
            json!({"name": "Alice", "alias": "Redwitch"}),
        ))
        .unwrap();
        wiki.dispatch(&tool(
            "add_to_character_appearance",
            json!({"name": "Redwitch", "content": "Red cloak"}),
        ))
        .unwrap();

        let section = characters(&wiki);
        assert_eq!(section.len(), 1);
        let via_name = section.get("Alice").unwrap();
        assert_eq!(via_name.attribute("appearance").unwrap().buffer(), ["Red cloak"]);
        assert_eq!(section.resolve("Alice"), section.resolve("Redwitch"));
    }

    #[test]
    fn process_response_skips_failed_calls() {
        let mut wiki = Wiki::new("Test");
        let message = tool_response(vec![
            call("add_character", json!({"name": "Alice"})),
            call("add_to_character_trivia", json!({"name": "Bob", "content": "x"})),
            call("not_a_tool", json!({})),
            call("add_to_character_trivia", json!({"name": "Alice", "content": "Likes tea"})),
            call("generate_chunk_summary", json!({"summary": "Alice drinks tea."})),
        ])
        .message;

        let report = wiki.process_response(&message);
        assert_eq!(
            report,
            DispatchReport {
                calls: 5,
                failed: 2,
                summarized: true
            }
        );
        let alice = characters(&wiki).get("Alice").unwrap();
        assert_eq!(alice.attribute("trivia").unwrap().buffer(), ["Likes tea"]);
        assert_eq!(wiki.running_summary().collect::<Vec<_>>(), ["Alice drinks tea."]);
    }

    #[test]
    fn malformed_arguments_are_skipped() {
        let mut wiki = Wiki::new("Test");
        let mut message = Message::assistant("");
        message.tool_calls = vec![lorewiki_core::message::MessageToolCall {
            id: "c1".into(),
            name: "add_character".into(),
            arguments: "{not json".into(),
        }];
        let report = wiki.process_response(&message);
        assert_eq!(report.failed, 1);
        assert!(characters(&wiki).is_empty());
    }

    #[tokio::test]
    async fn process_chunk_dispatches_and_updates() {
        let agent = Arc::new(ScriptedProvider::new(vec![Ok(tool_response(vec![
            call("add_character", json!({"name": "Alice"})),
            call("add_to_character_trivia", json!({"name": "Alice", "content": "a"})),
            call("add_to_character_trivia", json!({"name": "Alice", "content": "b"})),
            call("add_to_character_trivia", json!({"name": "Alice", "content": "c"})),
            call("add_to_character_personality", json!({"name": "Alice", "content": "shy"})),
            call("generate_chunk_summary", json!({"summary": "Alice appears."})),
        ]))]));
        let synth = Arc::new(RecordingSynth::default());
        let mut wiki = Wiki::new("Test")
            .with_agent(agent.clone(), "mock-model")
            .with_synthesizer(synth.clone());

        let report = wiki.process_chunk(&chunk(0, "Alice entered.")).await.unwrap();
        assert_eq!(report.calls, 6);
        assert_eq!(report.failed, 0);

        let alice = characters(&wiki).get("Alice").unwrap();
        let trivia = alice.attribute("trivia").unwrap();
        assert_eq!(trivia.data().as_text(), Some("rewrite 1"));
        assert!(trivia.buffer().is_empty());
        // Below threshold: still buffered
        assert_eq!(alice.attribute("personality").unwrap().buffer(), ["shy"]);
        assert_eq!(synth.prompts().len(), 1);

        let requests = agent.requests();
        assert_eq!(requests[0].model, "mock-model");
        assert_eq!(requests[0].tools.len(), TOOLS.len());
        assert_eq!(requests[0].messages[0].content, prompts::AGENT_SYSTEM_PROMPT);
        assert!(requests[0].messages[1].content.ends_with("Alice entered."));
    }

    #[tokio::test]
    async fn summary_feeds_next_chunk() {
        let agent = Arc::new(ScriptedProvider::new(vec![
            Ok(tool_response(vec![call(
                "generate_chunk_summary",
                json!({"summary": "First part."}),
            )])),
            Ok(text_response("nothing here")),
        ]));
        let mut wiki = Wiki::new("Test").with_agent(agent.clone(), "m");

        let chunks = [chunk(0, "one"), chunk(1, "two")];
        let run = wiki.read_chunks(&chunks).await.unwrap();
        assert_eq!(run.chunks, 2);
        assert_eq!(run.tool_calls, 1);

        let second_prompt = &agent.requests()[1].messages[1].content;
        assert!(second_prompt.contains("```First part.```"));
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let agent = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::Network("reset".into())),
            Err(ProviderError::RateLimited { retry_after_secs: 1 }),
            Ok(tool_response(vec![call("add_setting", json!({"name": "Tingen"}))])),
        ]));
        let mut wiki = Wiki::new("Test")
            .with_agent(agent.clone(), "m")
            .with_max_retries(3);

        wiki.process_chunk(&chunk(0, "text")).await.unwrap();
        assert_eq!(agent.call_count(), 3);
        assert!(wiki.section(EntityKind::Setting).unwrap().get("Tingen").is_some());
    }

    #[tokio::test]
    async fn exhausted_retries_are_fatal() {
        let agent = Arc::new(ScriptedProvider::failing(ProviderError::Timeout(
            "slow".into(),
        )));
        let mut wiki = Wiki::new("Test")
            .with_agent(agent.clone(), "m")
            .with_max_retries(4);

        let chunks = [chunk(0, "a"), chunk(1, "b")];
        let err = wiki.read_chunks(&chunks).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Provider(ProviderError::RetriesExhausted { attempts: 4, .. })
        ));
        assert_eq!(agent.call_count(), 4);
        assert!(characters(&wiki).is_empty());
    }

    struct StalledProvider;

    #[async_trait]
    impl Provider for StalledProvider {
        fn name(&self) -> &str {
            "stalled"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<lorewiki_core::provider::ProviderResponse, ProviderError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_agent_times_out_per_attempt() {
        let mut wiki = Wiki::new("Test")
            .with_agent(Arc::new(StalledProvider), "m")
            .with_max_retries(2)
            .with_request_timeout(Duration::from_secs(30));

        let err = wiki.process_chunk(&chunk(0, "text")).await.unwrap_err();
        match err {
            Error::Provider(ProviderError::RetriesExhausted { attempts, last_error }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last_error, ProviderError::Timeout(_)));
            }
            other => panic!("Expected RetriesExhausted, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn process_chunk_requires_agent() {
        let mut wiki = Wiki::new("Test");
        let err = wiki.process_chunk(&chunk(0, "text")).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn update_pass_order_is_deterministic() {
        let synth = Arc::new(RecordingSynth::default());
        let mut wiki = Wiki::new("Test").with_synthesizer(synth.clone());
        for name in ["Zed", "Alice"] {
            wiki.dispatch(&tool("add_character", json!({"name": name}))).unwrap();
            for attr in ["personality", "appearance"] {
                wiki.dispatch(&tool(
                    &format!("add_to_character_{attr}"),
                    json!({"name": name, "content": "x"}),
                ))
                .unwrap();
            }
        }
        wiki.dispatch(&tool("add_setting", json!({"name": "Tingen"}))).unwrap();
        wiki.dispatch(&tool(
            "add_to_setting_description",
            json!({"name": "Tingen", "content": "foggy"}),
        ))
        .unwrap();

        let report = wiki.update_sections(true).await;
        assert_eq!(report, UpdateReport { updated: 5, failed: 0 });

        let order: Vec<String> = synth
            .prompts()
            .iter()
            .map(|p| {
                let start = p.find("of the ").unwrap() + "of the ".len();
                let end = p[start..].find(" according").unwrap() + start;
                p[start..end].to_string()
            })
            .collect();
        assert_eq!(
            order,
            [
                "characters: Zed's personality",
                "characters: Zed's appearance",
                "characters: Alice's personality",
                "characters: Alice's appearance",
                "settings: Tingen's description",
            ]
        );
    }

    #[tokio::test]
    async fn forced_pass_skips_empty_buffers() {
        let synth = Arc::new(RecordingSynth::default());
        let mut wiki = Wiki::new("Test").with_synthesizer(synth.clone());
        wiki.dispatch(&tool("add_character", json!({"name": "Alice"}))).unwrap();

        let report = wiki.update_sections(true).await;
        assert_eq!(report, UpdateReport::default());
        assert!(synth.prompts().is_empty());
    }

    #[tokio::test]
    async fn characters_involved_are_canonicalized() {
        let mut wiki = Wiki::new("Test");
        wiki.dispatch(&tool("add_character", json!({"name": "Alice"}))).unwrap();
        wiki.dispatch(&tool(
            "add_to_character_aliases",
            json!({"name": "Alice", "alias": "Redwitch"}),
        ))
        .unwrap();
        wiki.dispatch(&tool("add_setting", json!({"name": "Tingen"}))).unwrap();
        for who in ["Redwitch", "Alice", "Bob"] {
            wiki.dispatch(&tool(
                "add_character_to_setting",
                json!({"name": "Tingen", "character": who}),
            ))
            .unwrap();
        }

        wiki.update_sections(false).await;
        let tingen = wiki.section(EntityKind::Setting).unwrap().get("Tingen").unwrap();
        assert_eq!(
            tingen.attribute("characters_involved").unwrap().data().as_list().unwrap(),
            ["Alice", "Bob"]
        );
        let alice = characters(&wiki).get("Alice").unwrap();
        assert_eq!(
            alice.attribute("aliases").unwrap().data().as_list().unwrap(),
            ["Redwitch"]
        );
    }

    #[tokio::test]
    async fn events_are_published() {
        let mut wiki = Wiki::new("Test");
        let mut rx = wiki.events().subscribe();

        wiki.dispatch(&tool("add_character", json!({"name": "Alice"}))).unwrap();
        match rx.recv().await.unwrap().as_ref() {
            WikiEvent::EntityCreated { section, name, .. } => {
                assert_eq!(section, "characters");
                assert_eq!(name, "Alice");
            }
            other => panic!("Expected EntityCreated, got: {other:?}"),
        }

        wiki.dispatch(&tool("add_character", json!({"name": "Alice"}))).unwrap();
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut wiki = Wiki::new("Test").with_synthesizer(Arc::new(RecordingSynth::default()));
        wiki.dispatch(&tool("add_character", json!({"name": "Alice"}))).unwrap();
        wiki.dispatch(&tool(
            "add_to_character_aliases",
            json!({"name": "Alice", "alias": "Redwitch"}),
        ))
        .unwrap();
        wiki.dispatch(&tool(
            "add_to_character_appearance",
            json!({"name": "Alice", "content": "Red cloak"}),
        ))
        .unwrap();
        wiki.update_sections(true).await;

        let files = wiki.save(dir.path()).await.unwrap();
        assert_eq!(files, 4);

        let mut restored = Wiki::new("Test");
        restored.load(dir.path()).await.unwrap();
        let alice = characters(&restored).get("Redwitch").unwrap();
        assert_eq!(alice.name(), "Alice");
        assert_eq!(
            alice.attribute("appearance").unwrap().data().as_text(),
            Some("rewrite 1")
        );
    }
}
