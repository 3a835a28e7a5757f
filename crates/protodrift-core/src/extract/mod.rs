//! Definition extraction.
//!
//! The [`Extractor`] walks every attribute of a [`SchemaModule`], classifies
//! it, and accumulates the results into a [`ModuleExtraction`].
//!
//! ## Enumeration order
//!
//! Definitions are inserted in a fixed order, which decides collisions under
//! [`CollisionPolicy::LastWins`]:
//!
//! 1. Module attributes in registry order. A message is followed directly by
//!    its nested enums (and, with nested messages enabled, by its nested
//!    messages depth-first).
//! 2. The module-level enum list, if the module exposes one.
//!
//! A module-level enum therefore replaces any nested enum of the same name.
//! Nested scopes are flattened: all enums share one namespace per module.

pub mod classify;

use crate::error::{Error, Result};
use crate::record::{EnumRecord, MessageRecord, ModuleExtraction, ServiceRecord};
use crate::schema::SchemaModule;
use self::classify::{classify, classify_enum, Classified};

pub use self::classify::TypeTable;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// What to do when two different definitions share a declared name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// The later definition in enumeration order replaces the earlier one
    #[default]
    LastWins,
    /// Fail the module with [`Error::NameCollision`]
    Reject,
}

/// Configuration for extraction
#[derive(Debug, Clone, Default)]
pub struct ExtractorConfig {
    /// Name collision handling
    pub collision_policy: CollisionPolicy,
    /// Lift nested message types to module scope
    pub include_nested_messages: bool,
    /// Scalar type names used for field type codes
    pub type_table: TypeTable,
}

impl ExtractorConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the collision policy
    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    /// Sets whether nested messages are lifted to module scope
    pub fn include_nested_messages(mut self, include: bool) -> Self {
        self.include_nested_messages = include;
        self
    }

    /// Sets the scalar type table
    pub fn type_table(mut self, table: TypeTable) -> Self {
        self.type_table = table;
        self
    }
}

/// Extracts message, enum and service records from schema modules
#[derive(Debug, Clone, Default)]
pub struct Extractor {
    config: ExtractorConfig,
}

impl Extractor {
    /// Creates an extractor with default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an extractor with custom configuration
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self { config }
    }

    /// Extracts one module
    pub fn extract(&self, module: &SchemaModule) -> Result<ModuleExtraction> {
        let mut pass = Pass {
            module: module.name(),
            policy: self.config.collision_policy,
            nested_messages: self.config.include_nested_messages,
            extraction: ModuleExtraction::default(),
        };

        for (attr, object) in module.attributes() {
            match classify(attr, object, self.config.type_table) {
                Some(Classified::Message(message)) => pass.add_message(message)?,
                Some(Classified::Enum(enum_type)) => pass.insert(enum_type)?,
                Some(Classified::Service(service)) => pass.insert(service)?,
                None => {}
            }
        }

        for enum_type in module.enums().unwrap_or_default() {
            if let Some(record) = classify_enum(enum_type) {
                pass.insert(record)?;
            }
        }

        let stats = pass.extraction.stats();
        debug!(
            "Module {}: {} messages, {} enums, {} services",
            module.name(),
            stats.message_count,
            stats.enum_count,
            stats.service_count
        );
        Ok(pass.extraction)
    }
}

/// State of one extraction pass
struct Pass<'a> {
    module: &'a str,
    policy: CollisionPolicy,
    nested_messages: bool,
    extraction: ModuleExtraction,
}

impl Pass<'_> {
    /// Inserts a message, then lifts its nested definitions to module scope
    fn add_message(&mut self, mut message: MessageRecord) -> Result<()> {
        let nested_enums = std::mem::take(&mut message.nested_enums);
        let nested_messages = std::mem::take(&mut message.nested_messages);

        self.insert(message)?;

        for enum_type in nested_enums {
            self.insert(enum_type)?;
        }
        if self.nested_messages {
            for nested in nested_messages {
                self.add_message(nested)?;
            }
        }
        Ok(())
    }

    fn insert<T: Definition>(&mut self, record: T) -> Result<()> {
        let name = record.name().to_string();
        match T::slot(&mut self.extraction).entry(name) {
            Entry::Vacant(entry) => {
                entry.insert(record);
            }
            Entry::Occupied(entry) if *entry.get() == record => {}
            Entry::Occupied(mut entry) => match self.policy {
                CollisionPolicy::LastWins => {
                    trace!(
                        "{} {} redefined in {}, keeping the later definition",
                        T::KIND,
                        entry.key(),
                        self.module
                    );
                    entry.insert(record);
                }
                CollisionPolicy::Reject => {
                    return Err(Error::name_collision(
                        T::KIND,
                        entry.key().clone(),
                        self.module,
                    ));
                }
            },
        }
        Ok(())
    }
}

/// A record stored in one of the extraction maps
trait Definition: PartialEq + Sized {
    const KIND: &'static str;

    fn name(&self) -> &str;

    fn slot(extraction: &mut ModuleExtraction) -> &mut BTreeMap<String, Self>;
}

impl Definition for MessageRecord {
    const KIND: &'static str = "message";

    fn name(&self) -> &str {
        &self.name
    }

    fn slot(extraction: &mut ModuleExtraction) -> &mut BTreeMap<String, Self> {
        &mut extraction.messages
    }
}

impl Definition for EnumRecord {
    const KIND: &'static str = "enum";

    fn name(&self) -> &str {
        &self.name
    }

    fn slot(extraction: &mut ModuleExtraction) -> &mut BTreeMap<String, Self> {
        &mut extraction.enums
    }
}

impl Definition for ServiceRecord {
    const KIND: &'static str = "service";

    fn name(&self) -> &str {
        &self.name
    }

    fn slot(extraction: &mut ModuleExtraction) -> &mut BTreeMap<String, Self> {
        &mut extraction.services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{
        EnumShape, EnumValueShape, FieldShape, MessageShape, MethodShape, SchemaObject,
        ServiceShape,
    };

    fn enum_shape(name: &str, values: &[(&str, i32)]) -> EnumShape {
        EnumShape {
            name: name.into(),
            values: values
                .iter()
                .map(|(n, v)| EnumValueShape {
                    name: (*n).into(),
                    number: *v,
                })
                .collect(),
        }
    }

    fn message_with_enum(name: &str, nested: EnumShape) -> SchemaObject {
        SchemaObject::Message(MessageShape {
            name: name.into(),
            fields: vec![FieldShape {
                name: "mode".into(),
                number: 1,
                type_code: 14,
                label_code: 1,
                type_ref: Some(nested.name.clone()),
            }],
            nested_enums: vec![nested],
            ..Default::default()
        })
    }

    fn value_names(extraction: &ModuleExtraction, name: &str) -> Vec<String> {
        extraction.enums[name]
            .values
            .iter()
            .map(|v| v.name.clone())
            .collect()
    }

    #[test]
    fn test_extract_all_kinds() {
        let module = SchemaModule::new("ping")
            .with_attribute("DESCRIPTOR", SchemaObject::Other("file descriptor".into()))
            .with_attribute(
                "Ping",
                message_with_enum("Ping", enum_shape("Mode", &[("MODE_UNSPECIFIED", 0)])),
            )
            .with_attribute(
                "Pinger",
                SchemaObject::Service(ServiceShape {
                    name: "Pinger".into(),
                    methods: vec![MethodShape {
                        name: "Send".into(),
                        input_type: "Ping".into(),
                        output_type: "Ping".into(),
                        client_streaming: false,
                        server_streaming: false,
                    }],
                }),
            )
            .with_enum(enum_shape("Status", &[("OK", 0), ("FAILED", 1)]));

        let extraction = Extractor::new().extract(&module).unwrap();
        assert_eq!(extraction.messages.keys().collect::<Vec<_>>(), ["Ping"]);
        assert_eq!(extraction.enums.keys().collect::<Vec<_>>(), ["Mode", "Status"]);
        assert_eq!(extraction.services.keys().collect::<Vec<_>>(), ["Pinger"]);
        assert!(extraction.messages["Ping"].nested_enums.is_empty());
    }

    #[test]
    fn test_nested_collision_last_attribute_wins() {
        let module = SchemaModule::new("chat")
            .with_attribute("A", message_with_enum("A", enum_shape("Mode", &[("FROM_A", 0)])))
            .with_attribute("B", message_with_enum("B", enum_shape("Mode", &[("FROM_B", 0)])));

        let extraction = Extractor::new().extract(&module).unwrap();
        assert_eq!(extraction.enums.len(), 1);
        assert_eq!(value_names(&extraction, "Mode"), ["FROM_B"]);
    }

    #[test]
    fn test_module_enum_beats_nested() {
        let module = SchemaModule::new("chat")
            .with_attribute("A", message_with_enum("A", enum_shape("Mode", &[("NESTED", 0)])))
            .with_enum(enum_shape("Mode", &[("TOP_LEVEL", 0)]));

        let extraction = Extractor::new().extract(&module).unwrap();
        assert_eq!(value_names(&extraction, "Mode"), ["TOP_LEVEL"]);
    }

    #[test]
    fn test_reject_policy() {
        let module = SchemaModule::new("chat")
            .with_attribute("A", message_with_enum("A", enum_shape("Mode", &[("FROM_A", 0)])))
            .with_attribute("B", message_with_enum("B", enum_shape("Mode", &[("FROM_B", 0)])));

        let extractor = Extractor::with_config(
            ExtractorConfig::new().collision_policy(CollisionPolicy::Reject),
        );
        let err = extractor.extract(&module).unwrap_err();
        assert!(matches!(
            err,
            Error::NameCollision { kind: "enum", ref name, ref module } if name == "Mode" && module == "chat"
        ));
    }

    #[test]
    fn test_reject_policy_allows_identical_duplicates() {
        let status = enum_shape("Status", &[("OK", 0)]);
        let module = SchemaModule::new("chat")
            .with_attribute("Status", SchemaObject::Enum(status.clone()))
            .with_enum(status);

        let extractor = Extractor::with_config(
            ExtractorConfig::new().collision_policy(CollisionPolicy::Reject),
        );
        let extraction = extractor.extract(&module).unwrap();
        assert_eq!(extraction.enums.len(), 1);
    }

    #[test]
    fn test_nested_messages_opt_in() {
        let outer = SchemaObject::Message(MessageShape {
            name: "Outer".into(),
            nested_messages: vec![MessageShape {
                name: "Inner".into(),
                nested_enums: vec![enum_shape("Depth", &[("SHALLOW", 0)])],
                ..Default::default()
            }],
            ..Default::default()
        });
        let module = SchemaModule::new("chat").with_attribute("Outer", outer);

        let flat = Extractor::new().extract(&module).unwrap();
        assert_eq!(flat.messages.keys().collect::<Vec<_>>(), ["Outer"]);
        assert!(flat.enums.is_empty());

        let lifted = Extractor::with_config(ExtractorConfig::new().include_nested_messages(true))
            .extract(&module)
            .unwrap();
        assert_eq!(lifted.messages.keys().collect::<Vec<_>>(), ["Inner", "Outer"]);
        assert_eq!(lifted.enums.keys().collect::<Vec<_>>(), ["Depth"]);
    }

    #[test]
    fn test_type_table_opt_in() {
        let module = SchemaModule::new("types").with_attribute(
            "Counter",
            SchemaObject::Message(MessageShape {
                name: "Counter".into(),
                fields: vec![FieldShape {
                    name: "ticks".into(),
                    number: 1,
                    type_code: 6,
                    label_code: 1,
                    type_ref: None,
                }],
                ..Default::default()
            }),
        );

        let reference = Extractor::new().extract(&module).unwrap();
        assert_eq!(reference.messages["Counter"].fields[0].type_name(), "type6");

        let complete = Extractor::with_config(ExtractorConfig::new().type_table(TypeTable::Complete))
            .extract(&module)
            .unwrap();
        assert_eq!(complete.messages["Counter"].fields[0].type_name(), "fixed64");
    }

    #[test]
    fn test_empty_module() {
        let extraction = Extractor::new()
            .extract(&SchemaModule::new("shared"))
            .unwrap();
        assert!(extraction.is_empty());
    }
}
