//! Address space seam.
//!
//! Everything the bridge does to the information model goes through the
//! [`AddressSpace`] trait: node creation, reference edges, value writes and
//! reads. [`MemoryAddressSpace`] is the in-process store the server runs on.

pub mod data_source;
pub mod memory;
pub mod types;
pub mod variant;

pub use data_source::DataSource;
pub use memory::MemoryAddressSpace;
pub use types::{
    DataValue, ExpandedNodeId, Identifier, LocalizedText, NodeId, NumericRange, QualifiedName,
    StatusCode,
};
pub use variant::{BuiltinType, Variant};

use bitflags::bitflags;
use std::sync::Arc;

bitflags! {
    /// Which parts of the value attribute a client may access.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessLevel: u8 {
        const CURRENT_READ = 0x01;
        const CURRENT_WRITE = 0x02;
        const HISTORY_READ = 0x04;
        const HISTORY_WRITE = 0x08;
    }
}

bitflags! {
    /// Which non-value attributes a client may write.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WriteMask: u32 {
        const ACCESS_LEVEL = 0x0000_0001;
        const BROWSE_NAME = 0x0000_0004;
        const DATA_TYPE = 0x0000_0010;
        const DESCRIPTION = 0x0000_0020;
        const DISPLAY_NAME = 0x0000_0040;
        const VALUE_RANK = 0x0008_0000;
    }
}

/// Value rank of a scalar variable.
pub const VALUE_RANK_SCALAR: i32 = -1;
/// Value rank accepting scalars and arrays of any dimension.
pub const VALUE_RANK_ANY: i32 = -2;

/// Where a new node goes: its id, its parent and the edge from the parent.
#[derive(Debug, Clone, PartialEq)]
pub struct NodePlacement {
    /// Requested id. A null id lets the store assign one.
    pub requested_id: NodeId,
    pub parent: NodeId,
    pub reference_type: NodeId,
    pub browse_name: QualifiedName,
}

impl NodePlacement {
    /// Place a node under `parent` with an `Organizes` edge.
    pub fn organized_by(requested_id: NodeId, parent: NodeId, browse_name: QualifiedName) -> Self {
        Self {
            requested_id,
            parent,
            reference_type: NodeId::organizes(),
            browse_name,
        }
    }
}

/// Attributes of a variable node.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAttributes {
    pub display_name: LocalizedText,
    pub description: LocalizedText,
    pub data_type: NodeId,
    pub value_rank: i32,
    pub access_level: AccessLevel,
    pub write_mask: WriteMask,
    /// Initial value. `None` leaves the variable without a value.
    pub value: Option<Variant>,
}

impl VariableAttributes {
    /// Scalar variable whose display name and description are both `label`.
    pub fn labelled(label: &str, data_type: BuiltinType) -> Self {
        Self {
            display_name: LocalizedText::en_us(label),
            description: LocalizedText::en_us(label),
            data_type: data_type.data_type_id(),
            value_rank: VALUE_RANK_SCALAR,
            access_level: AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE,
            write_mask: WriteMask::empty(),
            value: None,
        }
    }

    pub fn with_value(mut self, value: Variant) -> Self {
        self.value = Some(value);
        self
    }
}

/// Attributes of an object node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectAttributes {
    pub display_name: LocalizedText,
    pub description: LocalizedText,
}

impl ObjectAttributes {
    pub fn labelled(label: &str) -> Self {
        Self {
            display_name: LocalizedText::en_us(label),
            description: LocalizedText::en_us(label),
        }
    }
}

/// A directed edge between two nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Reference {
    pub source: NodeId,
    pub reference_type: NodeId,
    pub target: NodeId,
}

/// Direction of a browse relative to the browsed node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseDirection {
    Forward,
    Inverse,
}

/// Node primitives offered by the address-space server.
///
/// All writes here are server-internal and are not subject to the access
/// level a client would see.
pub trait AddressSpace {
    /// Add a variable with a stored value. Returns the id of the new node.
    fn add_variable_node(
        &mut self,
        placement: NodePlacement,
        attributes: VariableAttributes,
    ) -> Result<NodeId, StatusCode>;

    /// Add a variable whose value is produced by `source` on every read.
    fn add_data_source_variable_node(
        &mut self,
        placement: NodePlacement,
        attributes: VariableAttributes,
        source: Arc<dyn DataSource>,
    ) -> Result<NodeId, StatusCode>;

    /// Add an object (e.g. a folder) of the given type definition.
    fn add_object_node(
        &mut self,
        placement: NodePlacement,
        type_definition: NodeId,
        attributes: ObjectAttributes,
    ) -> Result<NodeId, StatusCode>;

    /// Add an edge between `source` and `target`. With `is_forward == false`
    /// the edge points from `target` to `source`.
    fn add_reference(
        &mut self,
        source: &NodeId,
        reference_type: &NodeId,
        target: &ExpandedNodeId,
        is_forward: bool,
    ) -> Result<(), StatusCode>;

    /// Replace the value attribute of a variable.
    fn write_value(&mut self, node_id: &NodeId, value: DataValue) -> Result<(), StatusCode>;

    fn write_display_name(
        &mut self,
        node_id: &NodeId,
        display_name: LocalizedText,
    ) -> Result<(), StatusCode>;

    /// Read the value attribute of a variable.
    ///
    /// Errors are reserved for the request itself (unknown node, not a
    /// variable); a value-level failure comes back as a DataValue status.
    fn read_value(
        &self,
        node_id: &NodeId,
        source_timestamp: bool,
        range: Option<&NumericRange>,
    ) -> Result<DataValue, StatusCode>;

    fn read_display_name(&self, node_id: &NodeId) -> Result<LocalizedText, StatusCode>;

    /// References of `node_id` in the given direction.
    fn browse(
        &self,
        node_id: &NodeId,
        direction: BrowseDirection,
    ) -> Result<Vec<Reference>, StatusCode>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_mask_bits_match_attribute_positions() {
        assert_eq!(WriteMask::ACCESS_LEVEL.bits(), 1 << 0);
        assert_eq!(WriteMask::BROWSE_NAME.bits(), 1 << 2);
        assert_eq!(WriteMask::DATA_TYPE.bits(), 1 << 4);
        assert_eq!(WriteMask::DESCRIPTION.bits(), 1 << 5);
        assert_eq!(WriteMask::DISPLAY_NAME.bits(), 1 << 6);
        assert_eq!(WriteMask::VALUE_RANK.bits(), 1 << 19);
    }

    #[test]
    fn test_access_level_bits() {
        let level = AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE;
        assert_eq!(level.bits(), 0x03);
        assert!(!level.contains(AccessLevel::HISTORY_READ));
    }
}
