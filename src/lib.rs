//! Orchestra MCP - AI-powered project management over the Model Context Protocol.
//!
//! This library provides the core functionality for the `orchestra-mcp` server:
//! a project/epic/story/task hierarchy persisted as `.toon` files under a
//! workspace, a gated 13-state workflow, and a JSON-RPC 2.0 dispatcher with
//! stdio and SSE transports.

pub mod bootstrap;
pub mod engine;
pub mod ids;
pub mod mcp;
pub mod models;
pub mod paths;
pub mod store;
pub mod tools;
pub mod toon;
pub mod workflow;

/// Library-level error type for Orchestra MCP operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOON error: {0}")]
    Toon(#[from] serde_yaml::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True if the underlying cause is a missing file.
    ///
    /// Best-effort readers use this to treat an absent file as an empty
    /// zero-value document (first-write semantics).
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::NotFound(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for Orchestra MCP operations.
pub type Result<T> = std::result::Result<T, Error>;
