//! Tool call value types.
//!
//! The model answers a chunk with zero or more function calls. Each one is
//! decoded into a [`ToolCall`] before the wiki resolves it against its tool
//! table, and every dispatch produces a [`ToolResult`].

use serde::{Deserialize, Serialize};
use crate::error::ToolError;
use crate::message::MessageToolCall;

/// A request to execute a tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Decode the raw call from an assistant message.
    ///
    /// Empty argument strings are treated as `{}`; anything else must be a
    /// JSON object.
    pub fn from_message(call: &MessageToolCall) -> Result<Self, ToolError> {
        let raw = call.arguments.trim();
        let arguments = if raw.is_empty() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
                tool_name: call.name.clone(),
                reason: format!("arguments are not valid JSON: {e}"),
            })?
        };

        if !arguments.is_object() {
            return Err(ToolError::InvalidArguments {
                tool_name: call.name.clone(),
                reason: "arguments must be a JSON object".into(),
            });
        }

        Ok(Self {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
        })
    }
}

/// The result of a tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// Whether the tool executed successfully
    pub success: bool,

    /// The output content
    pub output: String,
}

impl ToolResult {
    pub fn ok(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            success: true,
            output: output.into(),
        }
    }
}
