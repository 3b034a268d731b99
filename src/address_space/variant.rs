//! Built-in scalar types and the tagged value that carries them.

use super::types::{
    DataValue, ExpandedNodeId, ExtensionObject, LocalizedText, NodeId, QualifiedName, StatusCode,
};
use chrono::{DateTime, Utc};
use strum::{EnumIter, FromRepr, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

/// Seconds between 1601-01-01 (the DateTime epoch) and the Unix epoch.
const DATETIME_EPOCH_OFFSET_SECS: i64 = 11_644_473_600;

/// Built-in types, ordered like the standard type table.
///
/// The discriminant is the table ordinal; the data type node id in
/// namespace 0 is `ordinal + 1`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, FromRepr, EnumIter, IntoStaticStr)]
#[repr(u32)]
pub enum BuiltinType {
    Boolean = 0,
    SByte = 1,
    Byte = 2,
    Int16 = 3,
    UInt16 = 4,
    Int32 = 5,
    UInt32 = 6,
    Int64 = 7,
    UInt64 = 8,
    Float = 9,
    Double = 10,
    String = 11,
    DateTime = 12,
    Guid = 13,
    ByteString = 14,
    XmlElement = 15,
    NodeId = 16,
    ExpandedNodeId = 17,
    StatusCode = 18,
    QualifiedName = 19,
    LocalizedText = 20,
    ExtensionObject = 21,
    DataValue = 22,
    Variant = 23,
    DiagnosticInfo = 24,
}

impl BuiltinType {
    pub fn ordinal(self) -> u32 {
        self as u32
    }

    pub fn type_name(self) -> &'static str {
        self.into()
    }

    pub fn data_type_id(self) -> NodeId {
        NodeId::numeric(0, self.ordinal() + 1)
    }

    /// Types that get a variable in the demo scalar catalog.
    ///
    /// Variant and DiagnosticInfo have no standalone scalar representation.
    pub fn is_catalog_type(self) -> bool {
        !matches!(self, Self::Variant | Self::DiagnosticInfo)
    }

    /// All catalog types in ordinal order.
    pub fn catalog() -> impl Iterator<Item = BuiltinType> {
        Self::iter().filter(|ty| ty.is_catalog_type())
    }

    /// Default-constructed value, or `None` for types without a scalar form.
    pub fn default_value(self) -> Option<Variant> {
        Some(match self {
            Self::Boolean => Variant::Boolean(false),
            Self::SByte => Variant::SByte(0),
            Self::Byte => Variant::Byte(0),
            Self::Int16 => Variant::Int16(0),
            Self::UInt16 => Variant::UInt16(0),
            Self::Int32 => Variant::Int32(0),
            Self::UInt32 => Variant::UInt32(0),
            Self::Int64 => Variant::Int64(0),
            Self::UInt64 => Variant::UInt64(0),
            Self::Float => Variant::Float(0.0),
            Self::Double => Variant::Double(0.0),
            Self::String => Variant::String(String::new()),
            Self::DateTime => Variant::DateTime(datetime_epoch()),
            Self::Guid => Variant::Guid(Uuid::nil()),
            Self::ByteString => Variant::ByteString(Vec::new()),
            Self::XmlElement => Variant::XmlElement(String::new()),
            Self::NodeId => Variant::NodeId(NodeId::null()),
            Self::ExpandedNodeId => Variant::ExpandedNodeId(ExpandedNodeId::default()),
            Self::StatusCode => Variant::StatusCode(StatusCode::GOOD),
            Self::QualifiedName => Variant::QualifiedName(QualifiedName::default()),
            Self::LocalizedText => Variant::LocalizedText(LocalizedText::default()),
            Self::ExtensionObject => Variant::ExtensionObject(ExtensionObject::default()),
            Self::DataValue => Variant::DataValue(Box::default()),
            Self::Variant | Self::DiagnosticInfo => return None,
        })
    }
}

/// The zero DateTime: 1601-01-01T00:00:00Z.
pub fn datetime_epoch() -> DateTime<Utc> {
    DateTime::from_timestamp(-DATETIME_EPOCH_OFFSET_SECS, 0).unwrap_or_default()
}

/// A scalar value of one of the built-in types.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Boolean(bool),
    SByte(i8),
    Byte(u8),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    ByteString(Vec<u8>),
    XmlElement(String),
    NodeId(NodeId),
    ExpandedNodeId(ExpandedNodeId),
    StatusCode(StatusCode),
    QualifiedName(QualifiedName),
    LocalizedText(LocalizedText),
    ExtensionObject(ExtensionObject),
    DataValue(Box<DataValue>),
}

impl Variant {
    pub fn builtin_type(&self) -> BuiltinType {
        match self {
            Self::Boolean(_) => BuiltinType::Boolean,
            Self::SByte(_) => BuiltinType::SByte,
            Self::Byte(_) => BuiltinType::Byte,
            Self::Int16(_) => BuiltinType::Int16,
            Self::UInt16(_) => BuiltinType::UInt16,
            Self::Int32(_) => BuiltinType::Int32,
            Self::UInt32(_) => BuiltinType::UInt32,
            Self::Int64(_) => BuiltinType::Int64,
            Self::UInt64(_) => BuiltinType::UInt64,
            Self::Float(_) => BuiltinType::Float,
            Self::Double(_) => BuiltinType::Double,
            Self::String(_) => BuiltinType::String,
            Self::DateTime(_) => BuiltinType::DateTime,
            Self::Guid(_) => BuiltinType::Guid,
            Self::ByteString(_) => BuiltinType::ByteString,
            Self::XmlElement(_) => BuiltinType::XmlElement,
            Self::NodeId(_) => BuiltinType::NodeId,
            Self::ExpandedNodeId(_) => BuiltinType::ExpandedNodeId,
            Self::StatusCode(_) => BuiltinType::StatusCode,
            Self::QualifiedName(_) => BuiltinType::QualifiedName,
            Self::LocalizedText(_) => BuiltinType::LocalizedText,
            Self::ExtensionObject(_) => BuiltinType::ExtensionObject,
            Self::DataValue(_) => BuiltinType::DataValue,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int32(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<i32> for Variant {
    fn from(value: i32) -> Self {
        Self::Int32(value)
    }
}

impl From<DateTime<Utc>> for Variant {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_excludes_variant_and_diagnostic_info() {
        let catalog: Vec<_> = BuiltinType::catalog().collect();
        assert_eq!(catalog.len(), 23);
        assert!(!catalog.contains(&BuiltinType::Variant));
        assert!(!catalog.contains(&BuiltinType::DiagnosticInfo));
        assert_eq!(catalog.first(), Some(&BuiltinType::Boolean));
        assert_eq!(catalog.last(), Some(&BuiltinType::DataValue));
    }

    #[test]
    fn test_default_value_matches_type() {
        for ty in BuiltinType::catalog() {
            let value = ty.default_value().expect("catalog type has a default");
            assert_eq!(value.builtin_type(), ty);
        }
        assert!(BuiltinType::Variant.default_value().is_none());
        assert!(BuiltinType::DiagnosticInfo.default_value().is_none());
    }

    #[test]
    fn test_type_ids_and_names() {
        assert_eq!(BuiltinType::Boolean.data_type_id(), NodeId::numeric(0, 1));
        assert_eq!(BuiltinType::Int32.data_type_id(), NodeId::numeric(0, 6));
        assert_eq!(BuiltinType::DateTime.type_name(), "DateTime");
        assert_eq!(BuiltinType::from_repr(11), Some(BuiltinType::String));
    }

    #[test]
    fn test_datetime_epoch() {
        assert_eq!(datetime_epoch().to_rfc3339(), "1601-01-01T00:00:00+00:00");
    }
}
