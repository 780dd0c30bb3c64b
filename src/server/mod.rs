//! Protocol server.
//!
//! The server answers client requests against the cache manager. It holds no
//! administrative rights of its own: every read of a cache's configuration,
//! component registry or distribution manager goes through the crate's
//! privilege gate, while data operations and listener management run with the
//! caller's subject against an anonymized handle. Callers see resolved
//! [`PolicyFacts`](crate::policy::PolicyFacts), never the handles behind them.
//!
//! - [`handler`] - Request handling and per-cache memoization

pub mod handler;

pub use handler::ProtocolServer;

/// Server lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// Server is answering requests.
    Running,
    /// Server has stopped; requests are rejected.
    Stopped,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Server health snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHealth {
    /// Current state.
    pub state: ServerState,

    /// Caches whose info is currently memoized.
    pub known_caches: usize,

    /// Total requests processed.
    pub total_requests: u64,

    /// Failed requests.
    pub failed_requests: u64,
}
