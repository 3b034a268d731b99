//! Initial population of the address space.
//!
//! Builds, in one pass before any client traffic:
//! - one Int32 variable per sensor channel under Objects
//! - the computed "current time" variable
//! - the Demo/Scalar folders with one variable per catalog type
//! - extra Organizes edges from Demo and Scalar to every channel variable
//!
//! Any failure aborts the build; a partially built address space is never
//! served.

use crate::address_space::{
    AccessLevel, AddressSpace, BuiltinType, LocalizedText, NodeId, NodePlacement,
    ObjectAttributes, QualifiedName, StatusCode, VALUE_RANK_ANY, VariableAttributes, Variant,
    WriteMask,
};
use crate::config::{CatalogNaming, ServerConfig};
use crate::error::{BridgeError, Result};
use crate::sensors::Channel;
use crate::time_source::ComputedTimeSource;
use log::{debug, info};
use std::sync::Arc;

/// Numeric id of the Demo folder.
pub const DEMO_FOLDER_ID: u32 = 50000;
/// Numeric id of the Scalar folder below Demo.
pub const SCALAR_FOLDER_ID: u32 = 50001;
/// Catalog variables are numbered upwards from here.
pub const CATALOG_FIRST_ID: u32 = 51001;

pub const TIME_NODE_NAME: &str = "current time";

/// Ids of everything the bootstrapper created.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressSpaceLayout {
    pub channels: Vec<(Channel, NodeId)>,
    pub time_node: NodeId,
    pub demo_folder: NodeId,
    pub scalar_folder: NodeId,
    pub catalog: Vec<(BuiltinType, NodeId)>,
}

impl AddressSpaceLayout {
    pub fn channel_node(&self, channel: Channel) -> Option<&NodeId> {
        self.channels
            .iter()
            .find(|(c, _)| *c == channel)
            .map(|(_, id)| id)
    }
}

pub struct AddressSpaceBootstrapper {
    namespace: u16,
    naming: CatalogNaming,
}

impl AddressSpaceBootstrapper {
    pub fn new(namespace: u16, naming: CatalogNaming) -> Self {
        Self { namespace, naming }
    }

    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.namespace, config.catalog_naming)
    }

    /// Populate `space`. Call once, before the server starts serving.
    pub fn build(&self, space: &mut dyn AddressSpace) -> Result<AddressSpaceLayout> {
        let channels = self.add_channel_variables(space)?;
        let time_node = self.add_time_variable(space)?;
        let (demo_folder, scalar_folder) = self.add_demo_folders(space)?;
        let catalog = self.add_scalar_catalog(space, &scalar_folder)?;

        // Channel variables also hang below Demo and Scalar, giving them
        // three inbound Organizes references.
        for (_, node_id) in &channels {
            for folder in [&demo_folder, &scalar_folder] {
                space
                    .add_reference(folder, &NodeId::organizes(), &node_id.clone().into(), true)
                    .map_err(|status| BridgeError::ReferenceFailed {
                        source_node: folder.clone(),
                        target_node: node_id.clone(),
                        status,
                    })?;
            }
        }

        let objects = NodeId::objects_folder();
        space
            .write_display_name(&objects, LocalizedText::en_us("Objects"))
            .map_err(|status| BridgeError::AttributeWriteFailed {
                node: objects,
                status,
            })?;

        info!(
            "[Bootstrap] Address space ready: {} channel variables, {} catalog variables",
            channels.len(),
            catalog.len()
        );

        Ok(AddressSpaceLayout {
            channels,
            time_node,
            demo_folder,
            scalar_folder,
            catalog,
        })
    }

    fn add_channel_variables(
        &self,
        space: &mut dyn AddressSpace,
    ) -> Result<Vec<(Channel, NodeId)>> {
        Channel::ALL
            .iter()
            .map(|&channel| {
                let label = channel.label();
                let placement = NodePlacement::organized_by(
                    channel.node_id(self.namespace),
                    NodeId::objects_folder(),
                    QualifiedName::new(self.namespace, label.as_str()),
                );
                let attributes = VariableAttributes::labelled(&label, BuiltinType::Int32)
                    .with_value(Variant::Int32(0));
                let node_id = space
                    .add_variable_node(placement, attributes)
                    .map_err(|status| creation_failed(&label, status))?;
                debug!("[Bootstrap] Added channel variable {}", node_id);
                Ok((channel, node_id))
            })
            .collect()
    }

    fn add_time_variable(&self, space: &mut dyn AddressSpace) -> Result<NodeId> {
        let placement = NodePlacement::organized_by(
            NodeId::null(),
            NodeId::objects_folder(),
            QualifiedName::new(self.namespace, TIME_NODE_NAME),
        );
        let mut attributes = VariableAttributes::labelled(TIME_NODE_NAME, BuiltinType::DateTime);
        attributes.access_level = AccessLevel::CURRENT_READ;

        space
            .add_data_source_variable_node(placement, attributes, Arc::new(ComputedTimeSource))
            .map_err(|status| creation_failed(TIME_NODE_NAME, status))
    }

    fn add_demo_folders(&self, space: &mut dyn AddressSpace) -> Result<(NodeId, NodeId)> {
        let demo = self.add_folder(
            space,
            NodeId::numeric(self.namespace, DEMO_FOLDER_ID),
            NodeId::objects_folder(),
            "Demo",
        )?;
        let scalar = self.add_folder(
            space,
            NodeId::numeric(self.namespace, SCALAR_FOLDER_ID),
            demo.clone(),
            "Scalar",
        )?;
        Ok((demo, scalar))
    }

    fn add_folder(
        &self,
        space: &mut dyn AddressSpace,
        node_id: NodeId,
        parent: NodeId,
        name: &str,
    ) -> Result<NodeId> {
        space
            .add_object_node(
                NodePlacement::organized_by(
                    node_id,
                    parent,
                    QualifiedName::new(self.namespace, name),
                ),
                NodeId::folder_type(),
                ObjectAttributes::labelled(name),
            )
            .map_err(|status| creation_failed(name, status))
    }

    fn add_scalar_catalog(
        &self,
        space: &mut dyn AddressSpace,
        scalar_folder: &NodeId,
    ) -> Result<Vec<(BuiltinType, NodeId)>> {
        let mut catalog = Vec::new();
        for (ty, numeric_id) in BuiltinType::catalog().zip(CATALOG_FIRST_ID..) {
            let name = self.catalog_name(ty);
            let Some(value) = ty.default_value() else {
                continue;
            };
            let attributes = VariableAttributes {
                display_name: LocalizedText::en_us(name.as_str()),
                description: LocalizedText::default(),
                data_type: ty.data_type_id(),
                value_rank: VALUE_RANK_ANY,
                access_level: AccessLevel::CURRENT_READ | AccessLevel::CURRENT_WRITE,
                write_mask: WriteMask::DISPLAY_NAME | WriteMask::DESCRIPTION,
                value: Some(value),
            };
            let node_id = space
                .add_variable_node(
                    NodePlacement::organized_by(
                        NodeId::numeric(self.namespace, numeric_id),
                        scalar_folder.clone(),
                        QualifiedName::new(self.namespace, name.as_str()),
                    ),
                    attributes,
                )
                .map_err(|status| creation_failed(&name, status))?;
            catalog.push((ty, node_id));
        }
        Ok(catalog)
    }

    pub fn catalog_name(&self, ty: BuiltinType) -> String {
        match self.naming {
            CatalogNaming::Ordinal => format!("{:02}", ty.ordinal()),
            CatalogNaming::TypeName => ty.type_name().to_string(),
        }
    }
}

fn creation_failed(node: &str, status: StatusCode) -> BridgeError {
    BridgeError::NodeCreationFailed {
        node: node.to_string(),
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address_space::{BrowseDirection, MemoryAddressSpace, NumericRange};
    use crate::address_space::memory::NodeClass;

    fn build(naming: CatalogNaming) -> (MemoryAddressSpace, AddressSpaceLayout) {
        let mut space = MemoryAddressSpace::new();
        let layout = AddressSpaceBootstrapper::new(1, naming)
            .build(&mut space)
            .unwrap();
        (space, layout)
    }

    #[test]
    fn test_channel_variables_start_good_at_zero() {
        let (space, layout) = build(CatalogNaming::Ordinal);
        assert_eq!(layout.channels.len(), 4);
        for channel in Channel::ALL {
            let id = layout.channel_node(channel).unwrap();
            assert_eq!(id, &channel.node_id(1));
            let value = space.read_value(id, false, None).unwrap();
            assert_eq!(value.status(), StatusCode::GOOD);
            assert_eq!(value.value, Some(Variant::Int32(0)));
            assert_eq!(space.read_display_name(id).unwrap().text, channel.label());
            assert_eq!(space.description(id).unwrap().text, channel.label());
        }
    }

    #[test]
    fn test_channel_variables_have_three_parents() {
        let (space, layout) = build(CatalogNaming::Ordinal);
        for (_, id) in &layout.channels {
            let parents: Vec<_> = space
                .browse(id, BrowseDirection::Inverse)
                .unwrap()
                .into_iter()
                .map(|r| r.source)
                .collect();
            assert_eq!(
                parents,
                vec![
                    NodeId::objects_folder(),
                    layout.demo_folder.clone(),
                    layout.scalar_folder.clone()
                ]
            );
        }
    }

    #[test]
    fn test_folders() {
        let (space, layout) = build(CatalogNaming::Ordinal);
        assert_eq!(layout.demo_folder, NodeId::numeric(1, DEMO_FOLDER_ID));
        assert_eq!(layout.scalar_folder, NodeId::numeric(1, SCALAR_FOLDER_ID));
        assert_eq!(space.node_class(&layout.demo_folder), Some(NodeClass::Object));
        assert_eq!(
            space.type_definition(&layout.scalar_folder),
            Some(&NodeId::folder_type())
        );
        assert!(
            space
                .organized_children(&layout.demo_folder)
                .contains(&layout.scalar_folder)
        );
    }

    #[test]
    fn test_scalar_catalog_one_variable_per_type() {
        let (space, layout) = build(CatalogNaming::Ordinal);
        assert_eq!(layout.catalog.len(), BuiltinType::catalog().count());
        assert!(
            layout
                .catalog
                .iter()
                .all(|(ty, _)| *ty != BuiltinType::Variant && *ty != BuiltinType::DiagnosticInfo)
        );

        let under_scalar = space.organized_children(&layout.scalar_folder);
        for (index, (ty, id)) in layout.catalog.iter().enumerate() {
            assert_eq!(id, &NodeId::numeric(1, CATALOG_FIRST_ID + index as u32));
            assert!(under_scalar.contains(id));

            let info = space.variable_info(id).unwrap();
            assert_eq!(info.data_type, ty.data_type_id());
            assert_eq!(info.value_rank, VALUE_RANK_ANY);
            assert_eq!(info.write_mask, WriteMask::DISPLAY_NAME | WriteMask::DESCRIPTION);

            let value = space.read_value(id, false, None).unwrap();
            assert_eq!(value.value, ty.default_value());
        }

        // Catalog variables plus the four channel variables.
        assert_eq!(under_scalar.len(), layout.catalog.len() + 4);
    }

    #[test]
    fn test_catalog_naming() {
        let (space, layout) = build(CatalogNaming::Ordinal);
        let (_, first) = &layout.catalog[0];
        assert_eq!(space.browse_name(first).unwrap().name, "00");
        assert_eq!(space.read_display_name(first).unwrap().text, "00");

        let (space, layout) = build(CatalogNaming::TypeName);
        let (ty, id) = &layout.catalog[12];
        assert_eq!(*ty, BuiltinType::DateTime);
        assert_eq!(space.browse_name(id).unwrap().name, "DateTime");
    }

    #[test]
    fn test_time_variable_is_data_source() {
        let (space, layout) = build(CatalogNaming::Ordinal);
        let info = space.variable_info(&layout.time_node).unwrap();
        assert!(info.has_data_source);
        assert_eq!(info.access_level, AccessLevel::CURRENT_READ);
        assert_eq!(space.browse_name(&layout.time_node).unwrap().name, TIME_NODE_NAME);

        let value = space.read_value(&layout.time_node, true, None).unwrap();
        assert!(matches!(value.value, Some(Variant::DateTime(_))));
        assert!(value.source_timestamp.is_some());

        let range: NumericRange = "1".parse().unwrap();
        let value = space
            .read_value(&layout.time_node, true, Some(&range))
            .unwrap();
        assert_eq!(value.status(), StatusCode::BAD_INDEX_RANGE_INVALID);
        assert!(value.value.is_none());
    }

    #[test]
    fn test_objects_display_name() {
        let (space, _) = build(CatalogNaming::Ordinal);
        assert_eq!(
            space.read_display_name(&NodeId::objects_folder()).unwrap(),
            LocalizedText::en_us("Objects")
        );
    }

    #[test]
    fn test_second_build_fails() {
        let mut space = MemoryAddressSpace::new();
        let bootstrapper = AddressSpaceBootstrapper::new(1, CatalogNaming::Ordinal);
        bootstrapper.build(&mut space).unwrap();
        let err = bootstrapper.build(&mut space).unwrap_err();
        assert!(matches!(
            err,
            BridgeError::NodeCreationFailed {
                status: StatusCode::BAD_NODE_ID_EXISTS,
                ..
            }
        ));
    }
}
