//! Core value types of the information model.
//!
//! These mirror the OPC UA built-in structures closely enough for the node
//! store and the publishing pipeline, without any wire encoding.

use super::variant::Variant;
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Well-known node ids in namespace 0.
pub mod ns0 {
    pub const BASE_DATA_TYPE: u32 = 24;
    pub const ORGANIZES: u32 = 35;
    pub const FOLDER_TYPE: u32 = 61;
    pub const OBJECTS_FOLDER: u32 = 85;
}

/// Identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Identifier {
    Numeric(u32),
    String(String),
}

/// Address of a node: namespace index plus identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub namespace: u16,
    pub identifier: Identifier,
}

impl NodeId {
    pub fn numeric(namespace: u16, id: u32) -> Self {
        Self {
            namespace,
            identifier: Identifier::Numeric(id),
        }
    }

    pub fn string(namespace: u16, id: impl Into<String>) -> Self {
        Self {
            namespace,
            identifier: Identifier::String(id.into()),
        }
    }

    /// The null node id (`ns=0;i=0`). Passed as a requested id it means
    /// "let the store assign one".
    pub fn null() -> Self {
        Self::numeric(0, 0)
    }

    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    pub fn objects_folder() -> Self {
        Self::numeric(0, ns0::OBJECTS_FOLDER)
    }

    pub fn organizes() -> Self {
        Self::numeric(0, ns0::ORGANIZES)
    }

    pub fn folder_type() -> Self {
        Self::numeric(0, ns0::FOLDER_TYPE)
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace != 0 {
            write!(f, "ns={};", self.namespace)?;
        }
        match &self.identifier {
            Identifier::Numeric(id) => write!(f, "i={}", id),
            Identifier::String(id) => write!(f, "s={}", id),
        }
    }
}

/// A node id that may point into another server or namespace URI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ExpandedNodeId {
    pub node_id: NodeId,
    pub namespace_uri: Option<String>,
    pub server_index: u32,
}

impl ExpandedNodeId {
    /// Returns the plain node id when this refers to the local server.
    pub fn local(&self) -> Option<&NodeId> {
        (self.server_index == 0 && self.namespace_uri.is_none()).then_some(&self.node_id)
    }
}

impl From<NodeId> for ExpandedNodeId {
    fn from(node_id: NodeId) -> Self {
        Self {
            node_id,
            namespace_uri: None,
            server_index: 0,
        }
    }
}

/// Browse name of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct QualifiedName {
    pub namespace_index: u16,
    pub name: String,
}

impl QualifiedName {
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

/// Human readable text with a locale tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct LocalizedText {
    pub locale: String,
    pub text: String,
}

impl LocalizedText {
    pub fn new(locale: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            locale: locale.into(),
            text: text.into(),
        }
    }

    pub fn en_us(text: impl Into<String>) -> Self {
        Self::new("en_US", text)
    }
}

/// Opaque structure value. Only carried around, never decoded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtensionObject {
    pub type_id: NodeId,
    pub body: Vec<u8>,
}

/// OPC UA status code. The top two bits carry the severity.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct StatusCode(u32);

impl StatusCode {
    pub const GOOD: Self = Self(0x0000_0000);
    pub const BAD_INTERNAL_ERROR: Self = Self(0x8002_0000);
    pub const BAD_NODE_ID_UNKNOWN: Self = Self(0x8034_0000);
    pub const BAD_ATTRIBUTE_ID_INVALID: Self = Self(0x8035_0000);
    pub const BAD_INDEX_RANGE_INVALID: Self = Self(0x8036_0000);
    pub const BAD_NOT_WRITABLE: Self = Self(0x803B_0000);
    pub const BAD_INVALID_ARGUMENT: Self = Self(0x80AB_0000);
    pub const BAD_PARENT_NODE_ID_INVALID: Self = Self(0x805B_0000);
    pub const BAD_NODE_ID_EXISTS: Self = Self(0x805E_0000);
    pub const BAD_SOURCE_NODE_ID_INVALID: Self = Self(0x8064_0000);
    pub const BAD_TARGET_NODE_ID_INVALID: Self = Self(0x8065_0000);
    pub const BAD_DUPLICATE_REFERENCE_NOT_ALLOWED: Self = Self(0x8066_0000);
    pub const BAD_TYPE_MISMATCH: Self = Self(0x8074_0000);
    pub const BAD_NOT_CONNECTED: Self = Self(0x808A_0000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn is_good(self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    pub fn is_bad(self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// Process exit code for a final status: 0 for Good, otherwise the
    /// code's sub-code byte, never 0.
    pub fn exit_code(self) -> i32 {
        if self.is_good() {
            return 0;
        }
        match (self.0 >> 16) & 0xFF {
            0 => 1,
            code => code as i32,
        }
    }

    /// Symbolic name for the codes this crate produces.
    pub fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::GOOD => "Good",
            Self::BAD_INTERNAL_ERROR => "BadInternalError",
            Self::BAD_NODE_ID_UNKNOWN => "BadNodeIdUnknown",
            Self::BAD_ATTRIBUTE_ID_INVALID => "BadAttributeIdInvalid",
            Self::BAD_INDEX_RANGE_INVALID => "BadIndexRangeInvalid",
            Self::BAD_NOT_WRITABLE => "BadNotWritable",
            Self::BAD_INVALID_ARGUMENT => "BadInvalidArgument",
            Self::BAD_PARENT_NODE_ID_INVALID => "BadParentNodeIdInvalid",
            Self::BAD_NODE_ID_EXISTS => "BadNodeIdExists",
            Self::BAD_SOURCE_NODE_ID_INVALID => "BadSourceNodeIdInvalid",
            Self::BAD_TARGET_NODE_ID_INVALID => "BadTargetNodeIdInvalid",
            Self::BAD_DUPLICATE_REFERENCE_NOT_ALLOWED => "BadDuplicateReferenceNotAllowed",
            Self::BAD_TYPE_MISMATCH => "BadTypeMismatch",
            Self::BAD_NOT_CONNECTED => "BadNotConnected",
            _ => return None,
        })
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} (0x{:08X})", name, self.0),
            None => write!(f, "0x{:08X}", self.0),
        }
    }
}

impl fmt::Debug for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl std::error::Error for StatusCode {}

/// Value attribute of a variable: optional value, status and source timestamp.
///
/// A missing status means Good.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataValue {
    pub value: Option<Variant>,
    pub status: Option<StatusCode>,
    pub source_timestamp: Option<DateTime<Utc>>,
}

impl DataValue {
    pub fn from_value(value: Variant) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn from_status(status: StatusCode) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::GOOD)
    }
}

/// One dimension of a [`NumericRange`], bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeDimension {
    pub min: u32,
    pub max: u32,
}

/// Index range of a read request, e.g. `"2"`, `"1:3"` or `"0:1,4:5"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericRange {
    pub dimensions: Vec<RangeDimension>,
}

impl FromStr for NumericRange {
    type Err = StatusCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let dimensions = s
            .split(',')
            .map(|part| {
                let (min, max) = match part.split_once(':') {
                    Some((min, max)) => (min, max),
                    None => (part, part),
                };
                let min: u32 = min
                    .parse()
                    .map_err(|_| StatusCode::BAD_INDEX_RANGE_INVALID)?;
                let max: u32 = max
                    .parse()
                    .map_err(|_| StatusCode::BAD_INDEX_RANGE_INVALID)?;
                if min > max {
                    return Err(StatusCode::BAD_INDEX_RANGE_INVALID);
                }
                Ok(RangeDimension { min, max })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { dimensions })
    }
}
