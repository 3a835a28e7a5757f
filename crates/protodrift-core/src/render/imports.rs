//! Import resolution strategies.
//!
//! The renderer asks an [`ImportResolver`] which `import` lines a module's
//! document should carry. The default [`FixedImport`] emits one well-known
//! import for every module outside an exclusion list; a resolver that walks
//! the referenced-type graph can be plugged in through the same trait.

use crate::record::ModuleExtraction;

/// Import pulled in by [`FixedImport::default`]
pub const TIMESTAMP_IMPORT: &str = "google/protobuf/timestamp.proto";

/// Module that [`FixedImport::default`] leaves without imports
pub const BASE_MODULE: &str = "shared";

/// Decides which files a rendered module imports
pub trait ImportResolver: Send + Sync {
    /// Import paths for one module, in output order
    fn imports(&self, module: &str, extraction: &ModuleExtraction) -> Vec<String>;
}

/// The same import for every module except the excluded ones
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedImport {
    /// Path to import
    pub import: String,
    /// Modules that get no import line
    pub excluded_modules: Vec<String>,
}

impl Default for FixedImport {
    fn default() -> Self {
        Self {
            import: TIMESTAMP_IMPORT.to_string(),
            excluded_modules: vec![BASE_MODULE.to_string()],
        }
    }
}

impl FixedImport {
    /// Creates a fixed import with no exclusions
    pub fn new(import: impl Into<String>) -> Self {
        Self {
            import: import.into(),
            excluded_modules: Vec::new(),
        }
    }

    /// Adds a module that gets no import line
    pub fn exclude(mut self, module: impl Into<String>) -> Self {
        self.excluded_modules.push(module.into());
        self
    }
}

impl ImportResolver for FixedImport {
    fn imports(&self, module: &str, _extraction: &ModuleExtraction) -> Vec<String> {
        if self.excluded_modules.iter().any(|m| m == module) {
            Vec::new()
        } else {
            vec![self.import.clone()]
        }
    }
}

/// Emits no imports at all
#[derive(Debug, Clone, Copy, Default)]
pub struct NoImports;

impl ImportResolver for NoImports {
    fn imports(&self, _module: &str, _extraction: &ModuleExtraction) -> Vec<String> {
        Vec::new()
    }
}
