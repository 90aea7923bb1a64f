//! Memory engine bridge.
//!
//! The memory engine is an optional external service reached over gRPC by
//! the embedding host; this module only carries its outward contract. A
//! [`Bridge`] holds an optional client plus the workspace root; memory
//! tools consult the client first and fall back to the local `.toon`
//! store in `.memory/` on any engine error, logging one line per
//! fallback.

use std::env;
use std::path::{Path, PathBuf};

use serde_json::Value;

/// Name of the engine binary the host resolves and supervises.
pub const BINARY_NAME: &str = "orchestra-engine";

/// Default gRPC port.
pub const DEFAULT_PORT: u16 = 50051;

/// Environment variable overriding the engine port.
pub const PORT_ENV: &str = "ORCHESTRA_ENGINE_PORT";

/// The engine port from the environment, or the default. Values that are
/// not positive integers are ignored.
pub fn port() -> u16 {
    env::var(PORT_ENV)
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .filter(|p| *p > 0)
        .unwrap_or(DEFAULT_PORT)
}

/// Errors surfaced by an engine client. Any of these triggers the local
/// fallback path.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("engine transport error: {0}")]
    Transport(String),

    #[error("engine call timed out")]
    Timeout,

    #[error("engine unavailable")]
    Unavailable,
}

/// The six memory operations delegated to the external engine. Each call
/// carries a 5 s deadline on the client side and returns the engine's
/// JSON payload verbatim.
pub trait MemoryEngine: Send + Sync {
    fn store_chunk(
        &self,
        project: &str,
        source: &str,
        source_id: &str,
        summary: &str,
        content: &str,
        tags: &[String],
    ) -> Result<Value, EngineError>;

    fn search_memory(&self, project: &str, query: &str, limit: usize)
        -> Result<Value, EngineError>;

    fn get_context(&self, project: &str, query: &str, limit: usize) -> Result<Value, EngineError>;

    fn store_session(
        &self,
        project: &str,
        session_id: &str,
        summary: &str,
        events: &Value,
    ) -> Result<Value, EngineError>;

    fn list_sessions(&self, project: &str, limit: usize) -> Result<Value, EngineError>;

    fn get_session(&self, project: &str, session_id: &str) -> Result<Value, EngineError>;
}

/// Memory operations with automatic engine/local fallback.
pub struct Bridge {
    client: Option<Box<dyn MemoryEngine>>,
    workspace: PathBuf,
}

impl Bridge {
    /// A bridge with an engine client; operations still fall back to the
    /// local store on engine errors.
    pub fn new(client: Box<dyn MemoryEngine>, workspace: PathBuf) -> Self {
        Self {
            client: Some(client),
            workspace,
        }
    }

    /// A bridge with no engine; all operations use the local store.
    pub fn local(workspace: PathBuf) -> Self {
        Self {
            client: None,
            workspace,
        }
    }

    /// True if the bridge has an active engine connection.
    pub fn using_engine(&self) -> bool {
        self.client.is_some()
    }

    pub fn client(&self) -> Option<&dyn MemoryEngine> {
        self.client.as_deref()
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }
}
