//! Two-phase publication of variable values.
//!
//! A value is published by first marking the node not connected and then
//! writing the new value with Good status. An observer sampling between the
//! two writes sees either the previous good value or the explicit
//! disconnected marker, never a pair that did not exist.

use crate::address_space::{AddressSpace, DataValue, NodeId, StatusCode, Variant};
use std::fmt;
use thiserror::Error;

/// The write of a publication that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishPhase {
    Invalidate,
    Set,
}

impl fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishPhase::Invalidate => write!(f, "invalidate"),
            PublishPhase::Set => write!(f, "set"),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("publishing {node_id} failed in {phase} phase: {status}")]
pub struct PublishError {
    pub node_id: NodeId,
    pub phase: PublishPhase,
    pub status: StatusCode,
}

/// Writes values into variables with the invalidate-then-set protocol.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariablePublisher;

impl VariablePublisher {
    /// Publish `value` into `node_id`.
    ///
    /// No retries. If the set phase fails the node stays not connected.
    pub fn publish(
        &self,
        space: &mut dyn AddressSpace,
        node_id: &NodeId,
        value: impl Into<Variant>,
    ) -> Result<(), PublishError> {
        self.invalidate(space, node_id)?;
        space
            .write_value(node_id, DataValue::from_value(value.into()))
            .map_err(|status| PublishError {
                node_id: node_id.clone(),
                phase: PublishPhase::Set,
                status,
            })
    }

    /// Mark `node_id` not connected, dropping its value.
    pub fn invalidate(
        &self,
        space: &mut dyn AddressSpace,
        node_id: &NodeId,
    ) -> Result<(), PublishError> {
        space
            .write_value(node_id, DataValue::from_status(StatusCode::BAD_NOT_CONNECTED))
            .map_err(|status| PublishError {
                node_id: node_id.clone(),
                phase: PublishPhase::Invalidate,
                status,
            })
    }
}
