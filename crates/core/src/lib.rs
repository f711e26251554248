//! # LoreWiki Core
//!
//! Domain types, traits, and error definitions shared by every LoreWiki crate.
//! This crate has **zero framework dependencies** — it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The model backend is defined as a trait here. Implementations live in the
//! providers crate. This enables:
//! - Swapping backends via configuration
//! - Easy testing with scripted mock providers
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod event;
pub mod message;
pub mod provider;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, Result, StorageError, ToolError, WikiError};
pub use event::{EventBus, WikiEvent};
pub use message::{Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use tool::{ToolCall, ToolResult};
