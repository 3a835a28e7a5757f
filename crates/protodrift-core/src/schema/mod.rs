//! Schema registry: the input boundary of the extraction pipeline.
//!
//! A [`SchemaRegistry`] maps module names to [`SchemaModule`]s. Each module is
//! a named bundle of top-level attributes, every one of which is a
//! [`SchemaObject`]. The objects carry raw descriptor metadata (type codes,
//! label codes, bare referenced names) and know nothing about text output.
//!
//! Registries are normally populated by the descriptor-set loader in
//! [`loader`], but can also be assembled by hand with [`SchemaRegistry::insert`].

mod loader;

use crate::error::{Error, Result};
use std::collections::BTreeMap;

pub use loader::DESCRIPTOR_EXTENSIONS;

/// One field of a message as it appears in the descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldShape {
    /// Declared field name
    pub name: String,
    /// Field number
    pub number: u32,
    /// Descriptor type code (`FieldDescriptorProto.type`)
    pub type_code: i32,
    /// Descriptor label code (`FieldDescriptorProto.label`)
    pub label_code: i32,
    /// Bare declared name of the referenced message or enum, if any
    pub type_ref: Option<String>,
}

/// One value of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueShape {
    /// Declared value name
    pub name: String,
    /// Value number
    pub number: i32,
}

/// An enum descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnumShape {
    /// Declared enum name
    pub name: String,
    /// Values in declaration order
    pub values: Vec<EnumValueShape>,
}

/// A message descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MessageShape {
    /// Declared message name
    pub name: String,
    /// Fields in declaration order
    pub fields: Vec<FieldShape>,
    /// Enums declared inside this message
    pub nested_enums: Vec<EnumShape>,
    /// Messages declared inside this message
    pub nested_messages: Vec<MessageShape>,
    /// Synthetic `map<K, V>` entry type
    pub map_entry: bool,
}

/// One rpc of a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodShape {
    /// Declared method name
    pub name: String,
    /// Bare name of the request message
    pub input_type: String,
    /// Bare name of the response message
    pub output_type: String,
    /// Request is a stream
    pub client_streaming: bool,
    /// Response is a stream
    pub server_streaming: bool,
}

/// A service descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServiceShape {
    /// Declared service name
    pub name: String,
    /// Methods in declaration order
    pub methods: Vec<MethodShape>,
}

/// A top-level attribute of a schema module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaObject {
    /// A message type
    Message(MessageShape),
    /// An enum type
    Enum(EnumShape),
    /// A service
    Service(ServiceShape),
    /// Anything else a module exposes; carries a short description
    Other(String),
}

/// A named bundle of top-level schema objects, roughly one `.proto` file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaModule {
    name: String,
    attributes: Vec<(String, SchemaObject)>,
    enums: Option<Vec<EnumShape>>,
}

impl SchemaModule {
    /// Creates an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            enums: None,
        }
    }

    /// Appends an attribute and returns the module
    pub fn with_attribute(mut self, attr: impl Into<String>, object: SchemaObject) -> Self {
        self.push_attribute(attr, object);
        self
    }

    /// Appends a module-level enum declaration and returns the module
    pub fn with_enum(mut self, enum_type: EnumShape) -> Self {
        self.push_enum(enum_type);
        self
    }

    /// Appends an attribute
    pub fn push_attribute(&mut self, attr: impl Into<String>, object: SchemaObject) {
        self.attributes.push((attr.into(), object));
    }

    /// Appends a module-level enum declaration
    pub fn push_enum(&mut self, enum_type: EnumShape) {
        self.enums.get_or_insert_with(Vec::new).push(enum_type);
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Top-level attributes in enumeration order
    pub fn attributes(&self) -> impl ExactSizeIterator<Item = (&str, &SchemaObject)> + '_ {
        self.attributes.iter().map(|(name, obj)| (name.as_str(), obj))
    }

    /// Module-level enum declarations, if the module exposes them
    pub fn enums(&self) -> Option<&[EnumShape]> {
        self.enums.as_deref()
    }

    fn merge(&mut self, other: SchemaModule) {
        self.attributes.extend(other.attributes);
        if let Some(enums) = other.enums {
            self.enums.get_or_insert_with(Vec::new).extend(enums);
        }
    }
}

/// Registry of schema modules keyed by module name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    modules: BTreeMap<String, SchemaModule>,
}

impl SchemaRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module. A module with the same name is extended, not replaced.
    pub fn insert(&mut self, module: SchemaModule) {
        match self.modules.get_mut(module.name()) {
            Some(existing) => {
                tracing::debug!("Merging additional definitions into module {}", module.name());
                existing.merge(module);
            }
            None => {
                self.modules.insert(module.name().to_string(), module);
            }
        }
    }

    /// Looks up one module
    pub fn get(&self, name: &str) -> Result<&SchemaModule> {
        self.modules
            .get(name)
            .ok_or_else(|| Error::missing_module(name))
    }

    /// Looks up every module of a fixed list, failing on the first absent one
    pub fn resolve<'a, I, S>(&'a self, names: I) -> Result<Vec<&'a SchemaModule>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .map(|name| self.get(name.as_ref()))
            .collect()
    }

    /// Names of all modules, sorted
    pub fn module_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.modules.keys().map(String::as_str)
    }

    /// Number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the registry holds no modules
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
