//! Descriptor classification.
//!
//! Turns one [`SchemaObject`] into a normalized record. Classification is a
//! best-effort reflection pass: objects that are not schema types, or whose
//! descriptor is missing its name, yield `None` instead of an error.

use crate::record::{
    EnumRecord, EnumValueRecord, FieldRecord, FieldType, MessageRecord, MethodRecord, ServiceRecord,
};
use crate::schema::{EnumShape, FieldShape, MessageShape, SchemaObject, ServiceShape};
use prost_types::field_descriptor_proto::{Label, Type};
use tracing::{trace, warn};

/// Which type codes resolve to scalar names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypeTable {
    /// The reference table: `fixed32`, `fixed64` and `group` are absent and
    /// render as `type<N>`, keeping output byte-compatible with existing
    /// `.proto.extracted` documents
    #[default]
    Reference,
    /// Every protobuf type code, including `fixed32`, `fixed64` and `group`
    Complete,
}

/// Result of classifying one schema object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classified {
    /// A message, with its nested definitions attached
    Message(MessageRecord),
    /// An enum
    Enum(EnumRecord),
    /// A service
    Service(ServiceRecord),
}

/// Classifies one top-level module attribute
pub fn classify(attr: &str, object: &SchemaObject, table: TypeTable) -> Option<Classified> {
    let classified = match object {
        SchemaObject::Message(message) => {
            classify_message(message, table).map(Classified::Message)
        }
        SchemaObject::Enum(enum_type) => classify_enum(enum_type).map(Classified::Enum),
        SchemaObject::Service(service) => classify_service(service).map(Classified::Service),
        SchemaObject::Other(what) => {
            trace!("Skipping attribute {} ({})", attr, what);
            return None;
        }
    };

    if classified.is_none() {
        trace!("Skipping attribute {}: descriptor has no name", attr);
    }
    classified
}

/// Classifies a message and everything nested in it
pub fn classify_message(message: &MessageShape, table: TypeTable) -> Option<MessageRecord> {
    if message.name.is_empty() {
        return None;
    }

    let mut fields: Vec<_> = message
        .fields
        .iter()
        .map(|f| classify_field(&message.name, f, table))
        .collect();
    fields.sort_by_key(|f| f.number);

    Some(MessageRecord {
        name: message.name.clone(),
        fields,
        nested_enums: message.nested_enums.iter().filter_map(classify_enum).collect(),
        nested_messages: message
            .nested_messages
            .iter()
            .filter(|m| !m.map_entry)
            .filter_map(|m| classify_message(m, table))
            .collect(),
    })
}

fn classify_field(message: &str, field: &FieldShape, table: TypeTable) -> FieldRecord {
    let field_type = resolve_field_type(field.type_code, field.type_ref.as_deref(), table);
    if let FieldType::Unknown(code) = field_type {
        warn!(
            "Unrecognized type code {} on field {}.{}",
            code, message, field.name
        );
    }

    FieldRecord {
        number: field.number,
        name: field.name.clone(),
        field_type,
        repeated: field.label_code == Label::Repeated as i32,
    }
}

/// Resolves a descriptor type code to a field type.
///
/// Message and enum codes resolve to the referenced declared name; when the
/// reference is missing they fall back to the bare kind name. Codes the
/// table does not cover become [`FieldType::Unknown`].
pub fn resolve_field_type(type_code: i32, type_ref: Option<&str>, table: TypeTable) -> FieldType {
    let Ok(ty) = Type::try_from(type_code) else {
        return FieldType::Unknown(type_code);
    };

    match (ty, type_ref, table) {
        (Type::Message | Type::Enum, Some(name), _) if !name.is_empty() => {
            FieldType::Named(name.to_string())
        }
        (Type::Group, Some(name), TypeTable::Complete) if !name.is_empty() => {
            FieldType::Named(name.to_string())
        }
        (Type::Fixed32 | Type::Fixed64 | Type::Group, _, TypeTable::Reference) => {
            FieldType::Unknown(type_code)
        }
        _ => FieldType::Scalar(scalar_type_name(ty)),
    }
}

fn scalar_type_name(ty: Type) -> &'static str {
    match ty {
        Type::Double => "double",
        Type::Float => "float",
        Type::Int64 => "int64",
        Type::Uint64 => "uint64",
        Type::Int32 => "int32",
        Type::Fixed64 => "fixed64",
        Type::Fixed32 => "fixed32",
        Type::Bool => "bool",
        Type::String => "string",
        Type::Group => "group",
        Type::Message => "message",
        Type::Bytes => "bytes",
        Type::Uint32 => "uint32",
        Type::Enum => "enum",
        Type::Sfixed32 => "sfixed32",
        Type::Sfixed64 => "sfixed64",
        Type::Sint32 => "sint32",
        Type::Sint64 => "sint64",
    }
}

/// Classifies an enum, keeping declaration order
pub fn classify_enum(enum_type: &EnumShape) -> Option<EnumRecord> {
    if enum_type.name.is_empty() {
        return None;
    }

    Some(EnumRecord {
        name: enum_type.name.clone(),
        values: enum_type
            .values
            .iter()
            .map(|v| EnumValueRecord {
                name: v.name.clone(),
                number: v.number,
            })
            .collect(),
    })
}

/// Classifies a service, keeping declaration order
pub fn classify_service(service: &ServiceShape) -> Option<ServiceRecord> {
    if service.name.is_empty() {
        return None;
    }

    Some(ServiceRecord {
        name: service.name.clone(),
        methods: service
            .methods
            .iter()
            .map(|m| MethodRecord {
                name: m.name.clone(),
                input_type_name: m.input_type.clone(),
                output_type_name: m.output_type.clone(),
                client_streaming: m.client_streaming,
                server_streaming: m.server_streaming,
            })
            .collect(),
    })
}
