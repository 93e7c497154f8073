//! Error types for the ledger node.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid peer address: {0}")]
    InvalidPeer(String),

    #[error("Missing block file for position {0}")]
    MissingBlock(usize),

    #[error("Corrupt persisted data in {path}: {reason}")]
    CorruptStore { path: String, reason: String },

    #[error("Restored chain failed validation")]
    InvalidChain,

    #[error("Peer {peer} unavailable: {reason}")]
    PeerUnavailable { peer: String, reason: String },

    #[error("Mining interrupted by shutdown")]
    MiningCancelled,
}

impl NodeError {
    /// Errors caused by the caller's input rather than by the node.
    pub fn is_client_error(&self) -> bool {
        matches!(self, NodeError::InvalidPeer(_))
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, NodeError>;
