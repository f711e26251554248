//! Error types for the LoreWiki domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all LoreWiki operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Wiki model errors ---
    #[error("Wiki error: {0}")]
    Wiki(#[from] WikiError),

    // --- Persistence ---
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted {
        attempts: u32,
        last_error: Box<ProviderError>,
    },
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments for {tool_name}: {reason}")]
    InvalidArguments { tool_name: String, reason: String },
}

/// Failures of the section/entity/attribute model itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WikiError {
    #[error("{section}: entity '{name}' does not exist")]
    EntityNotFound { section: String, name: String },

    #[error("{entity} has no attribute '{attribute}'")]
    AttributeNotFound { entity: String, attribute: String },

    #[error("Section not found: {0}")]
    SectionNotFound(String),

    #[error("{section}: alias '{alias}' already belongs to '{existing}', refusing to bind it to '{target}'")]
    AliasConflict {
        section: String,
        alias: String,
        existing: String,
        target: String,
    },
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No wiki data found in {0}")]
    MissingRoot(PathBuf),

    #[error("Input directory not found: {0}")]
    MissingInput(PathBuf),

    #[error("Invalid file name pattern: {0}")]
    Pattern(String),

    #[error("Invalid chunking parameters: {0}")]
    InvalidChunking(String),
}

impl StorageError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
