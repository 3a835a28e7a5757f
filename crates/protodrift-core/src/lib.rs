//! # protodrift-core
//!
//! A library for regenerating canonical `.proto` text from compiled protobuf
//! descriptors, so a vendor's schema can be diffed against a locally
//! maintained copy.
//!
//! ## Architecture
//!
//! The pipeline runs once per schema module:
//!
//! - [`schema`]: the registry of modules and their raw descriptor objects,
//!   plus a loader for `FileDescriptorSet` files
//! - [`extract`]: classifies each object and collects message, enum and
//!   service records for a module
//! - [`render`]: serializes the records into deterministic, sorted text
//! - [`output`]: writes one document per module
//! - [`error`]: error types
//!
//! ## Example
//!
//! ```no_run
//! use protodrift_core::{Extractor, Renderer, SchemaRegistry, DEFAULT_MODULES};
//!
//! let registry = SchemaRegistry::from_path("xai.binpb")?;
//! let extractor = Extractor::new();
//! let renderer = Renderer::new();
//!
//! for module in registry.resolve(DEFAULT_MODULES)? {
//!     let extraction = extractor.extract(module)?;
//!     println!("{}", renderer.render(module.name(), &extraction));
//! }
//! # Ok::<(), protodrift_core::Error>(())
//! ```
//!
//! ## Limitations
//!
//! Fields and rpcs refer to other types by bare declared name, and nested
//! enums are flattened into module scope. Two types with the same name in
//! different scopes or modules are not told apart.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod error;
pub mod extract;
pub mod output;
pub mod record;
pub mod render;
pub mod schema;

// Re-export primary types for convenience
pub use error::{Error, Result};
pub use extract::{CollisionPolicy, Extractor, ExtractorConfig, TypeTable};
pub use record::{
    EnumRecord, EnumValueRecord, ExtractionStats, FieldRecord, FieldType, MessageRecord,
    MethodRecord, ModuleExtraction, ServiceRecord,
};
pub use render::{FixedImport, ImportResolver, NoImports, RenderConfig, Renderer};
pub use schema::{SchemaModule, SchemaObject, SchemaRegistry};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Modules of the reference schema, in processing order
pub const DEFAULT_MODULES: &[&str] = &[
    "auth",
    "chat",
    "collections",
    "deferred",
    "documents",
    "embed",
    "files",
    "image",
    "models",
    "sample",
    "shared",
    "tokenize",
    "types",
    "usage",
];
