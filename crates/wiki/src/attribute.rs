//! Buffered attributes.
//!
//! An attribute collects raw observations in its buffer. Once the buffer
//! reaches the spec's threshold, `update` folds it into `data`: text
//! attributes are rewritten by the synthesis backend, list attributes merge
//! new unique items. The buffer is cleared on every update, whatever the
//! outcome.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::catalog::{AttributeKind, AttributeSpec};
use crate::prompts;
use crate::synth::Synthesizer;

/// Lookup from any registered name or alias to the canonical entity name.
pub type NameSnapshot = HashMap<String, String>;

/// The current value of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    List(Vec<String>),
}

impl AttributeValue {
    /// The default value for a kind: empty text or an empty list.
    pub fn default_for(kind: AttributeKind) -> Self {
        match kind {
            AttributeKind::Text => Self::Text(String::new()),
            AttributeKind::List | AttributeKind::CharacterList => Self::List(Vec::new()),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            Self::Text(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
        }
    }
}

/// Where an attribute lives, for prompts and logs.
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext<'a> {
    pub section: &'a str,
    pub entity: &'a str,
}

/// What an `update` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The buffer was empty; nothing happened.
    Skipped,
    /// Text was rewritten by the synthesis backend.
    Synthesized,
    /// The backend failed; `data` kept its old value.
    Failed(String),
    /// No backend was supplied; buffered text was dropped.
    Discarded,
    /// List items merged; `added` of them were new.
    Merged { added: usize },
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

#[derive(Debug, Clone)]
pub struct Attribute {
    spec: &'static AttributeSpec,
    data: AttributeValue,
    buffer: Vec<String>,
}

impl Attribute {
    pub fn new(spec: &'static AttributeSpec) -> Self {
        Self {
            spec,
            data: AttributeValue::default_for(spec.kind),
            buffer: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.spec.name
    }

    pub fn spec(&self) -> &'static AttributeSpec {
        self.spec
    }

    pub fn data(&self) -> &AttributeValue {
        &self.data
    }

    pub fn buffer(&self) -> &[String] {
        &self.buffer
    }

    /// Append an observation. No deduplication happens here.
    pub fn add_to_buffer(&mut self, item: impl Into<String>) {
        self.buffer.push(item.into());
    }

    /// Whether the buffer has reached the update threshold.
    pub fn is_due(&self) -> bool {
        self.buffer.len() >= self.spec.threshold
    }

    /// Fold the buffer into `data` and clear it.
    ///
    /// `characters` resolves names for `CharacterList` attributes; names it
    /// does not know are kept verbatim.
    pub async fn update(
        &mut self,
        ctx: UpdateContext<'_>,
        synthesizer: Option<&dyn Synthesizer>,
        characters: &NameSnapshot,
    ) -> UpdateOutcome {
        if self.buffer.is_empty() {
            return UpdateOutcome::Skipped;
        }
        let buffer = std::mem::take(&mut self.buffer);

        match self.spec.kind {
            AttributeKind::Text => self.rewrite(ctx, synthesizer, &buffer).await,
            AttributeKind::List => self.merge(buffer.iter().map(String::as_str)),
            AttributeKind::CharacterList => self.merge(buffer.iter().map(|name| {
                characters.get(name).map(String::as_str).unwrap_or(name)
            })),
        }
    }

    async fn rewrite(
        &mut self,
        ctx: UpdateContext<'_>,
        synthesizer: Option<&dyn Synthesizer>,
        buffer: &[String],
    ) -> UpdateOutcome {
        let Some(synthesizer) = synthesizer else {
            debug!(
                section = ctx.section,
                entity = ctx.entity,
                attribute = self.spec.name,
                dropped = buffer.len(),
                "No synthesis backend, discarding buffer"
            );
            return UpdateOutcome::Discarded;
        };

        let existing = self.data.as_text().unwrap_or_default();
        let prompt = prompts::update_prompt(ctx.section, ctx.entity, self.spec, existing, buffer);

        match synthesizer.synthesize(&prompt).await {
            Ok(text) => {
                self.data = AttributeValue::Text(text);
                UpdateOutcome::Synthesized
            }
            Err(e) => {
                warn!(
                    section = ctx.section,
                    entity = ctx.entity,
                    attribute = self.spec.name,
                    error = %e,
                    "Synthesis failed, keeping previous data"
                );
                UpdateOutcome::Failed(e.to_string())
            }
        }
    }

    fn merge<'b>(&mut self, items: impl Iterator<Item = &'b str>) -> UpdateOutcome {
        if !matches!(self.data, AttributeValue::List(_)) {
            self.data = AttributeValue::default_for(self.spec.kind);
        }
        let AttributeValue::List(list) = &mut self.data else {
            return UpdateOutcome::Merged { added: 0 };
        };

        let mut added = 0;
        for item in items {
            if !list.iter().any(|existing| existing == item) {
                list.push(item.to_string());
                added += 1;
            }
        }
        UpdateOutcome::Merged { added }
    }

    pub fn to_markdown(&self) -> String {
        match &self.data {
            AttributeValue::Text(text) => text.clone(),
            AttributeValue::List(items) => items
                .iter()
                .map(|item| format!("- {item}"))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    /// Replace `data` with the parsed markdown. The buffer is untouched.
    pub fn from_markdown(&mut self, content: &str) {
        self.data = match self.spec.kind {
            AttributeKind::Text => AttributeValue::Text(content.trim().to_string()),
            AttributeKind::List | AttributeKind::CharacterList => AttributeValue::List(
                content
                    .trim()
                    .lines()
                    .filter_map(|line| line.strip_prefix("- "))
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect(),
            ),
        };
    }
}
