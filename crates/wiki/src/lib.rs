//! # LoreWiki Wiki
//!
//! The buffered-attribute model and the chunk loop that feeds it.
//!
//! - [`attribute`] — buffered fact accumulators and their markdown form
//! - [`section`] — entity arena with a name/alias index
//! - [`tools`] — the agent's tool table and typed commands
//! - [`wiki`] — the per-chunk agent loop and update scheduling
//! - [`chunker`] — input documents split into chunks
//! - [`store`] — markdown tree persistence

pub mod attribute;
pub mod catalog;
pub mod chunker;
pub mod entity;
pub mod prompts;
pub mod section;
pub mod store;
pub mod synth;
pub mod tools;
pub mod wiki;

#[cfg(test)]
mod test_helpers;

pub use attribute::{Attribute, AttributeValue, UpdateOutcome};
pub use catalog::{AttributeKind, EntityKind};
pub use chunker::{Chunk, ChunkOptions, DocStore};
pub use entity::{Entity, EntityId};
pub use section::Section;
pub use synth::{ProviderSynthesizer, Synthesizer};
pub use wiki::{DispatchReport, RunReport, UpdateReport, Wiki};
