use crate::address_space::{NodeId, StatusCode};
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum BridgeError {
    #[error("Failed to create node {node}: {status}")]
    NodeCreationFailed { node: String, status: StatusCode },

    #[error("Failed to add reference {source_node} -> {target_node}: {status}")]
    ReferenceFailed {
        source_node: NodeId,
        target_node: NodeId,
        status: StatusCode,
    },

    #[error("Failed to write attribute of {node}: {status}")]
    AttributeWriteFailed { node: NodeId, status: StatusCode },

    #[error("Failed to register job {name}: {status}")]
    JobRegistrationFailed { name: String, status: StatusCode },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
