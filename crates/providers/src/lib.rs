//! LLM Provider implementations for LoreWiki.
//!
//! All providers implement the `lorewiki_core::Provider` trait.
//! The router selects the correct provider based on configuration; the retry
//! wrapper adds the bounded re-attempt policy used for chunk dispatch.

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use retry::RetryProvider;
pub use router::ProviderRouter;
