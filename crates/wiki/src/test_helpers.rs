//! Scripted provider and response builders shared by the wiki tests.

use lorewiki_core::error::ProviderError;
use lorewiki_core::message::{Message, MessageToolCall};
use lorewiki_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A mock provider that plays back a queue of scripted results.
///
/// Each call to `complete` pops the next entry. Once the queue is empty the
/// `exhausted` error is returned if set; otherwise the call panics.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    exhausted: Option<ProviderError>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            exhausted: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Plays the given plain-text replies in order.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(text_response(t))).collect())
    }

    /// Fails every call with `error`.
    pub fn failing(error: ProviderError) -> Self {
        Self::new(vec![]).or_else_fail(error)
    }

    /// Fail with `error` after the script runs out instead of panicking.
    pub fn or_else_fail(mut self, error: ProviderError) -> Self {
        self.exhausted = Some(error);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        match self.script.lock().unwrap().pop_front() {
            Some(next) => next,
            None => match &self.exhausted {
                Some(error) => Err(error.clone()),
                None => panic!(
                    "ScriptedProvider: no more responses (call #{})",
                    self.call_count()
                ),
            },
        }
    }
}

/// A plain assistant reply.
pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}

/// An assistant reply carrying the given tool calls.
pub fn tool_response(calls: Vec<MessageToolCall>) -> ProviderResponse {
    let mut message = Message::assistant("");
    message.tool_calls = calls;
    ProviderResponse {
        message,
        usage: None,
        model: "mock-model".into(),
    }
}

/// A tool call with JSON-encoded arguments.
pub fn call(name: &str, arguments: serde_json::Value) -> MessageToolCall {
    MessageToolCall {
        id: format!("call_{}", uuid::Uuid::new_v4().simple()),
        name: name.into(),
        arguments: arguments.to_string(),
    }
}
