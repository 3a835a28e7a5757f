//! Descriptor-set loader.
//!
//! Populates a [`SchemaRegistry`] from a compiled `FileDescriptorSet`, as
//! produced by `protoc --include_imports --descriptor_set_out=...` or
//! `buf build -o ...`. Every `.proto` file in the set becomes a module named
//! after its file stem.

use super::{
    EnumShape, EnumValueShape, FieldShape, MessageShape, MethodShape, SchemaModule, SchemaObject,
    SchemaRegistry, ServiceShape,
};
use crate::error::{Error, Result};
use prost::Message;
use prost_reflect::{
    DescriptorPool, EnumDescriptor, FieldDescriptor, FileDescriptor, Kind, MessageDescriptor,
    ServiceDescriptor,
};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::FileDescriptorSet;
use std::path::Path;
use tracing::{debug, trace};
use walkdir::WalkDir;

/// File extensions recognised as descriptor sets when loading a directory
pub const DESCRIPTOR_EXTENSIONS: &[&str] = &["pb", "binpb", "desc", "protoset"];

impl SchemaRegistry {
    /// Builds a registry from an encoded `FileDescriptorSet`
    pub fn from_descriptor_set(data: &[u8]) -> Result<Self> {
        let set = FileDescriptorSet::decode(data)?;
        let pool = DescriptorPool::from_file_descriptor_set(set)
            .map_err(|e| Error::descriptor_build(e.to_string()))?;
        Ok(Self::from_pool(&pool))
    }

    /// Builds a registry from every file in a descriptor pool
    pub fn from_pool(pool: &DescriptorPool) -> Self {
        let mut registry = Self::new();
        for file in pool.files() {
            registry.insert(module_from_file(&file));
        }
        debug!(
            "Loaded {} module(s) from {} file descriptor(s)",
            registry.len(),
            pool.files().len()
        );
        registry
    }

    /// Loads a descriptor set file, or every descriptor set under a directory
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_dir() {
            let data = std::fs::read(path).map_err(|e| Error::file_read(path, e))?;
            return Self::from_descriptor_set(&data);
        }

        let mut pool = DescriptorPool::new();
        let mut sets_loaded = 0;

        for entry in WalkDir::new(path)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let file = entry.path();
            if !file.is_file() || !is_descriptor_set(file) {
                trace!("Skipping {}", file.display());
                continue;
            }

            debug!("Loading descriptor set {}", file.display());
            let data = std::fs::read(file).map_err(|e| Error::file_read(file, e))?;
            let set = FileDescriptorSet::decode(data.as_slice())?;
            pool.add_file_descriptor_set(set)
                .map_err(|e| Error::descriptor_build(format!("{}: {}", file.display(), e)))?;
            sets_loaded += 1;
        }

        if sets_loaded == 0 {
            return Err(Error::NoDescriptorsFound {
                path: path.to_path_buf(),
            });
        }

        Ok(Self::from_pool(&pool))
    }
}

fn is_descriptor_set(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| DESCRIPTOR_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Module name for a file: `xai/api/v1/chat.proto` -> `chat`
fn module_name(file: &FileDescriptor) -> String {
    Path::new(file.name())
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file.name())
        .to_string()
}

fn module_from_file(file: &FileDescriptor) -> SchemaModule {
    let mut module = SchemaModule::new(module_name(file));

    for message in file.messages() {
        module.push_attribute(message.name(), SchemaObject::Message(message_shape(&message)));
    }
    for enum_type in file.enums() {
        let shape = enum_shape(&enum_type);
        module.push_attribute(enum_type.name(), SchemaObject::Enum(shape.clone()));
        module.push_enum(shape);
    }
    for service in file.services() {
        module.push_attribute(service.name(), SchemaObject::Service(service_shape(&service)));
    }

    trace!(
        "File {} -> module {} ({} attributes)",
        file.name(),
        module.name(),
        module.attributes().len()
    );
    module
}

fn message_shape(message: &MessageDescriptor) -> MessageShape {
    MessageShape {
        name: message.name().to_string(),
        // `fields()` yields number order; the raw proto keeps declaration order
        fields: message
            .descriptor_proto()
            .field
            .iter()
            .filter_map(|proto| message.get_field(proto.number() as u32))
            .map(|f| field_shape(&f))
            .collect(),
        nested_enums: message.child_enums().map(|e| enum_shape(&e)).collect(),
        nested_messages: message.child_messages().map(|m| message_shape(&m)).collect(),
        map_entry: message.is_map_entry(),
    }
}

fn field_shape(field: &FieldDescriptor) -> FieldShape {
    let proto = field.field_descriptor_proto();
    let kind = field.kind();

    FieldShape {
        name: field.name().to_string(),
        number: field.number(),
        type_code: proto.r#type.unwrap_or_else(|| kind_code(&kind) as i32),
        label_code: proto.label.unwrap_or(Label::Optional as i32),
        type_ref: match kind {
            Kind::Message(m) => Some(m.name().to_string()),
            Kind::Enum(e) => Some(e.name().to_string()),
            _ => None,
        },
    }
}

/// Type code for a resolved kind, used when the raw proto leaves `type` unset
fn kind_code(kind: &Kind) -> Type {
    match kind {
        Kind::Double => Type::Double,
        Kind::Float => Type::Float,
        Kind::Int32 => Type::Int32,
        Kind::Int64 => Type::Int64,
        Kind::Uint32 => Type::Uint32,
        Kind::Uint64 => Type::Uint64,
        Kind::Sint32 => Type::Sint32,
        Kind::Sint64 => Type::Sint64,
        Kind::Fixed32 => Type::Fixed32,
        Kind::Fixed64 => Type::Fixed64,
        Kind::Sfixed32 => Type::Sfixed32,
        Kind::Sfixed64 => Type::Sfixed64,
        Kind::Bool => Type::Bool,
        Kind::String => Type::String,
        Kind::Bytes => Type::Bytes,
        Kind::Message(_) => Type::Message,
        Kind::Enum(_) => Type::Enum,
    }
}

fn enum_shape(enum_type: &EnumDescriptor) -> EnumShape {
    EnumShape {
        name: enum_type.name().to_string(),
        values: enum_type
            .enum_descriptor_proto()
            .value
            .iter()
            .map(|v| EnumValueShape {
                name: v.name().to_string(),
                number: v.number(),
            })
            .collect(),
    }
}

fn service_shape(service: &ServiceDescriptor) -> ServiceShape {
    ServiceShape {
        name: service.name().to_string(),
        methods: service
            .methods()
            .map(|m| MethodShape {
                name: m.name().to_string(),
                input_type: m.input().name().to_string(),
                output_type: m.output().name().to_string(),
                client_streaming: m.is_client_streaming(),
                server_streaming: m.is_server_streaming(),
            })
            .collect(),
    }
}
