//! In-process node store.
//!
//! Nodes live in a map keyed by id; references are kept as a flat list of
//! forward edges and inverse browses filter on the target side.

use super::types::ns0;
use super::{
    AccessLevel, AddressSpace, BrowseDirection, DataSource, DataValue, ExpandedNodeId,
    LocalizedText, NodeId, NodePlacement, NumericRange, ObjectAttributes, QualifiedName,
    Reference, StatusCode, VariableAttributes, WriteMask,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Namespace used for ids the store assigns itself.
const ASSIGNED_NAMESPACE: u16 = 1;

/// Node class as seen by a browsing client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Object,
    Variable,
}

/// Metadata of a variable node.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub data_type: NodeId,
    pub value_rank: i32,
    pub access_level: AccessLevel,
    pub write_mask: WriteMask,
    pub has_data_source: bool,
}

enum ValueSource {
    Stored(DataValue),
    Callback(Arc<dyn DataSource>),
}

struct VariableNode {
    data_type: NodeId,
    value_rank: i32,
    access_level: AccessLevel,
    write_mask: WriteMask,
    value: ValueSource,
}

enum NodeBody {
    Object { type_definition: NodeId },
    Variable(VariableNode),
}

struct Node {
    browse_name: QualifiedName,
    display_name: LocalizedText,
    description: LocalizedText,
    body: NodeBody,
}

/// Address space held entirely in memory.
pub struct MemoryAddressSpace {
    nodes: HashMap<NodeId, Node>,
    references: Vec<Reference>,
    next_assigned_id: u32,
}

impl MemoryAddressSpace {
    /// Create a store containing only the Objects folder.
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(
            NodeId::objects_folder(),
            Node {
                browse_name: QualifiedName::new(0, "Objects"),
                display_name: LocalizedText::en_us("Objects"),
                description: LocalizedText::default(),
                body: NodeBody::Object {
                    type_definition: NodeId::folder_type(),
                },
            },
        );
        Self {
            nodes,
            references: Vec::new(),
            next_assigned_id: 1,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_class(&self, node_id: &NodeId) -> Option<NodeClass> {
        self.nodes.get(node_id).map(|node| match node.body {
            NodeBody::Object { .. } => NodeClass::Object,
            NodeBody::Variable(_) => NodeClass::Variable,
        })
    }

    pub fn browse_name(&self, node_id: &NodeId) -> Option<&QualifiedName> {
        self.nodes.get(node_id).map(|node| &node.browse_name)
    }

    pub fn description(&self, node_id: &NodeId) -> Option<&LocalizedText> {
        self.nodes.get(node_id).map(|node| &node.description)
    }

    pub fn type_definition(&self, node_id: &NodeId) -> Option<&NodeId> {
        match &self.nodes.get(node_id)?.body {
            NodeBody::Object { type_definition } => Some(type_definition),
            NodeBody::Variable(_) => None,
        }
    }

    pub fn variable_info(&self, node_id: &NodeId) -> Option<VariableInfo> {
        match &self.nodes.get(node_id)?.body {
            NodeBody::Variable(variable) => Some(VariableInfo {
                data_type: variable.data_type.clone(),
                value_rank: variable.value_rank,
                access_level: variable.access_level,
                write_mask: variable.write_mask,
                has_data_source: matches!(variable.value, ValueSource::Callback(_)),
            }),
            NodeBody::Object { .. } => None,
        }
    }

    /// Ids of the nodes `node_id` organizes, in insertion order.
    pub fn organized_children(&self, node_id: &NodeId) -> Vec<NodeId> {
        let organizes = NodeId::organizes();
        self.references
            .iter()
            .filter(|r| &r.source == node_id && r.reference_type == organizes)
            .map(|r| r.target.clone())
            .collect()
    }

    fn assign_id(&mut self) -> NodeId {
        loop {
            let candidate = NodeId::numeric(ASSIGNED_NAMESPACE, self.next_assigned_id);
            self.next_assigned_id += 1;
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn insert_node(
        &mut self,
        placement: NodePlacement,
        body: NodeBody,
        display_name: LocalizedText,
        description: LocalizedText,
    ) -> Result<NodeId, StatusCode> {
        if !self.nodes.contains_key(&placement.parent) {
            return Err(StatusCode::BAD_PARENT_NODE_ID_INVALID);
        }
        let node_id = if placement.requested_id.is_null() {
            self.assign_id()
        } else if self.nodes.contains_key(&placement.requested_id) {
            return Err(StatusCode::BAD_NODE_ID_EXISTS);
        } else {
            placement.requested_id
        };

        self.nodes.insert(
            node_id.clone(),
            Node {
                browse_name: placement.browse_name,
                display_name,
                description,
                body,
            },
        );
        self.references.push(Reference {
            source: placement.parent,
            reference_type: placement.reference_type,
            target: node_id.clone(),
        });
        Ok(node_id)
    }

    fn add_variable(
        &mut self,
        placement: NodePlacement,
        attributes: VariableAttributes,
        value: ValueSource,
    ) -> Result<NodeId, StatusCode> {
        if let ValueSource::Stored(stored) = &value {
            check_type(&attributes.data_type, stored)?;
        }
        let body = NodeBody::Variable(VariableNode {
            data_type: attributes.data_type,
            value_rank: attributes.value_rank,
            access_level: attributes.access_level,
            write_mask: attributes.write_mask,
            value,
        });
        self.insert_node(placement, body, attributes.display_name, attributes.description)
    }
}

impl Default for MemoryAddressSpace {
    fn default() -> Self {
        Self::new()
    }
}

fn check_type(data_type: &NodeId, value: &DataValue) -> Result<(), StatusCode> {
    match &value.value {
        Some(variant)
            if *data_type != NodeId::numeric(0, ns0::BASE_DATA_TYPE)
                && variant.builtin_type().data_type_id() != *data_type =>
        {
            Err(StatusCode::BAD_TYPE_MISMATCH)
        }
        _ => Ok(()),
    }
}

impl AddressSpace for MemoryAddressSpace {
    fn add_variable_node(
        &mut self,
        placement: NodePlacement,
        mut attributes: VariableAttributes,
    ) -> Result<NodeId, StatusCode> {
        let stored = match attributes.value.take() {
            Some(value) => DataValue::from_value(value),
            None => DataValue::default(),
        };
        self.add_variable(placement, attributes, ValueSource::Stored(stored))
    }

    fn add_data_source_variable_node(
        &mut self,
        placement: NodePlacement,
        attributes: VariableAttributes,
        source: Arc<dyn DataSource>,
    ) -> Result<NodeId, StatusCode> {
        self.add_variable(placement, attributes, ValueSource::Callback(source))
    }

    fn add_object_node(
        &mut self,
        placement: NodePlacement,
        type_definition: NodeId,
        attributes: ObjectAttributes,
    ) -> Result<NodeId, StatusCode> {
        self.insert_node(
            placement,
            NodeBody::Object { type_definition },
            attributes.display_name,
            attributes.description,
        )
    }

    fn add_reference(
        &mut self,
        source: &NodeId,
        reference_type: &NodeId,
        target: &ExpandedNodeId,
        is_forward: bool,
    ) -> Result<(), StatusCode> {
        if !self.nodes.contains_key(source) {
            return Err(StatusCode::BAD_SOURCE_NODE_ID_INVALID);
        }
        let target = target
            .local()
            .filter(|target| self.nodes.contains_key(*target))
            .ok_or(StatusCode::BAD_TARGET_NODE_ID_INVALID)?;

        let (from, to) = if is_forward {
            (source, target)
        } else {
            (target, source)
        };
        let reference = Reference {
            source: from.clone(),
            reference_type: reference_type.clone(),
            target: to.clone(),
        };
        if self.references.contains(&reference) {
            return Err(StatusCode::BAD_DUPLICATE_REFERENCE_NOT_ALLOWED);
        }
        self.references.push(reference);
        Ok(())
    }

    fn write_value(&mut self, node_id: &NodeId, value: DataValue) -> Result<(), StatusCode> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        let NodeBody::Variable(variable) = &mut node.body else {
            return Err(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
        };
        check_type(&variable.data_type, &value)?;
        match &mut variable.value {
            ValueSource::Stored(stored) => {
                *stored = value;
                Ok(())
            }
            ValueSource::Callback(source) => source.write(node_id, &value),
        }
    }

    fn write_display_name(
        &mut self,
        node_id: &NodeId,
        display_name: LocalizedText,
    ) -> Result<(), StatusCode> {
        let node = self
            .nodes
            .get_mut(node_id)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        node.display_name = display_name;
        Ok(())
    }

    fn read_value(
        &self,
        node_id: &NodeId,
        source_timestamp: bool,
        range: Option<&NumericRange>,
    ) -> Result<DataValue, StatusCode> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)?;
        let NodeBody::Variable(variable) = &node.body else {
            return Err(StatusCode::BAD_ATTRIBUTE_ID_INVALID);
        };
        match &variable.value {
            // Stored values are scalars; no index range applies.
            ValueSource::Stored(_) if range.is_some() => {
                Ok(DataValue::from_status(StatusCode::BAD_INDEX_RANGE_INVALID))
            }
            ValueSource::Stored(stored) => {
                let mut value = stored.clone();
                if !source_timestamp {
                    value.source_timestamp = None;
                }
                Ok(value)
            }
            ValueSource::Callback(source) => source.read(node_id, source_timestamp, range),
        }
    }

    fn read_display_name(&self, node_id: &NodeId) -> Result<LocalizedText, StatusCode> {
        self.nodes
            .get(node_id)
            .map(|node| node.display_name.clone())
            .ok_or(StatusCode::BAD_NODE_ID_UNKNOWN)
    }

    fn browse(
        &self,
        node_id: &NodeId,
        direction: BrowseDirection,
    ) -> Result<Vec<Reference>, StatusCode> {
        if !self.nodes.contains_key(node_id) {
            return Err(StatusCode::BAD_NODE_ID_UNKNOWN);
        }
        Ok(self
            .references
            .iter()
            .filter(|r| match direction {
                BrowseDirection::Forward => &r.source == node_id,
                BrowseDirection::Inverse => &r.target == node_id,
            })
            .cloned()
            .collect())
    }
}
