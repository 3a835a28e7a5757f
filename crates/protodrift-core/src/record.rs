//! Normalized, language-agnostic records produced by classification.
//!
//! Records are immutable snapshots of schema metadata. They carry resolved
//! type names rather than raw descriptor codes, so rendering never needs to
//! look back at the registry.

use std::collections::BTreeMap;
use std::fmt;

/// Resolved type of a message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    /// A scalar type such as `int64` or `string`
    Scalar(&'static str),
    /// A message or enum, by bare declared name
    Named(String),
    /// A type code outside the known set; renders as `type<N>`
    Unknown(i32),
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Scalar(name) => f.write_str(name),
            FieldType::Named(name) => f.write_str(name),
            FieldType::Unknown(code) => write!(f, "type{}", code),
        }
    }
}

/// One message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    /// Field number, unique within the message
    pub number: u32,
    /// Declared field name
    pub name: String,
    /// Resolved field type
    pub field_type: FieldType,
    /// Field carries the `repeated` label
    pub repeated: bool,
}

impl FieldRecord {
    /// Type name as it appears in schema text
    pub fn type_name(&self) -> String {
        self.field_type.to_string()
    }
}

/// A message with its fields in ascending number order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageRecord {
    /// Declared message name
    pub name: String,
    /// Fields sorted by number
    pub fields: Vec<FieldRecord>,
    /// Enums declared inside the message
    pub nested_enums: Vec<EnumRecord>,
    /// Messages declared inside the message, map entries excluded
    pub nested_messages: Vec<MessageRecord>,
}

/// One enum value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueRecord {
    /// Declared value name
    pub name: String,
    /// Value number; any int32
    pub number: i32,
}

/// An enum with values in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumRecord {
    /// Declared enum name
    pub name: String,
    /// Values in declaration order
    pub values: Vec<EnumValueRecord>,
}

/// One rpc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    /// Declared method name
    pub name: String,
    /// Bare name of the request message
    pub input_type_name: String,
    /// Bare name of the response message
    pub output_type_name: String,
    /// Request is a stream
    pub client_streaming: bool,
    /// Response is a stream
    pub server_streaming: bool,
}

/// A service with methods in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceRecord {
    /// Declared service name
    pub name: String,
    /// Methods in declaration order
    pub methods: Vec<MethodRecord>,
}

/// Everything extracted from one schema module, keyed by declared name.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ModuleExtraction {
    /// Messages by name
    pub messages: BTreeMap<String, MessageRecord>,
    /// Enums by name, nested enums included
    pub enums: BTreeMap<String, EnumRecord>,
    /// Services by name
    pub services: BTreeMap<String, ServiceRecord>,
}

impl ModuleExtraction {
    /// Returns true if nothing was extracted
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty() && self.enums.is_empty() && self.services.is_empty()
    }

    /// Counts for progress reporting
    pub fn stats(&self) -> ExtractionStats {
        let fields = self.messages.values().flat_map(|m| &m.fields);
        ExtractionStats {
            message_count: self.messages.len(),
            enum_count: self.enums.len(),
            service_count: self.services.len(),
            field_count: fields.clone().count(),
            method_count: self.services.values().map(|s| s.methods.len()).sum(),
            unknown_type_count: fields
                .filter(|f| matches!(f.field_type, FieldType::Unknown(_)))
                .count(),
        }
    }
}

/// Counts describing one extraction
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionStats {
    /// Number of messages
    pub message_count: usize,
    /// Number of enums
    pub enum_count: usize,
    /// Number of services
    pub service_count: usize,
    /// Number of fields across all messages
    pub field_count: usize,
    /// Number of methods across all services
    pub method_count: usize,
    /// Number of fields whose type code was not recognised
    pub unknown_type_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(number: u32, field_type: FieldType) -> FieldRecord {
        FieldRecord {
            number,
            name: format!("f{}", number),
            field_type,
            repeated: false,
        }
    }

    #[test]
    fn test_field_type_display() {
        assert_eq!(FieldType::Scalar("string").to_string(), "string");
        assert_eq!(FieldType::Named("Usage".into()).to_string(), "Usage");
        assert_eq!(FieldType::Unknown(99).to_string(), "type99");
    }

    #[test]
    fn test_stats() {
        let mut extraction = ModuleExtraction::default();
        assert!(extraction.is_empty());

        extraction.messages.insert(
            "Ping".into(),
            MessageRecord {
                name: "Ping".into(),
                fields: vec![
                    field(1, FieldType::Scalar("int64")),
                    field(2, FieldType::Unknown(42)),
                ],
                ..Default::default()
            },
        );
        extraction.services.insert(
            "Pinger".into(),
            ServiceRecord {
                name: "Pinger".into(),
                methods: vec![MethodRecord {
                    name: "Send".into(),
                    input_type_name: "Ping".into(),
                    output_type_name: "Ping".into(),
                    client_streaming: false,
                    server_streaming: false,
                }],
            },
        );

        let stats = extraction.stats();
        assert_eq!(stats.message_count, 1);
        assert_eq!(stats.enum_count, 0);
        assert_eq!(stats.service_count, 1);
        assert_eq!(stats.field_count, 2);
        assert_eq!(stats.method_count, 1);
        assert_eq!(stats.unknown_type_count, 1);
    }
}
