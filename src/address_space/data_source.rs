//! Callback-backed variable values.
//!
//! A data-source variable has no stored value: every read is answered by the
//! source at the moment the read is served.

use super::types::{DataValue, NodeId, NumericRange, StatusCode};

/// Read (and optionally write) side of a data-source variable.
///
/// Called synchronously on the server's run loop, so implementations must
/// return promptly.
pub trait DataSource: Send + Sync {
    /// Produce the value for a read of `node_id`.
    ///
    /// `source_timestamp` asks for the source timestamp to be filled in.
    /// `range` is the requested index range, if any.
    fn read(
        &self,
        node_id: &NodeId,
        source_timestamp: bool,
        range: Option<&NumericRange>,
    ) -> Result<DataValue, StatusCode>;

    /// Accept a write. Sources without a write side reject it.
    fn write(&self, _node_id: &NodeId, _value: &DataValue) -> Result<(), StatusCode> {
        Err(StatusCode::BAD_NOT_WRITABLE)
    }
}
