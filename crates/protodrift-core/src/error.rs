//! Error types for the protodrift-core library.
//!
//! Unknown field type codes and unclassifiable module attributes are not
//! errors: the first renders as a `type<N>` placeholder, the second is skipped.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for protodrift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for all protodrift operations
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Failed to read a descriptor set
    #[error("failed to read file '{path}': {source}")]
    FileRead {
        /// Path to the file that failed to read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to write a module's output document
    #[error("failed to write module '{module}' to '{path}': {source}")]
    FileWrite {
        /// Module whose document was being written
        module: String,
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Failed to create output directory
    #[error("failed to create directory '{path}': {source}")]
    DirectoryCreate {
        /// Path to the directory that failed to create
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Input bytes are not a `FileDescriptorSet`
    #[error("failed to parse FileDescriptorSet: {0}")]
    DescriptorParse(#[from] prost::DecodeError),

    /// Descriptor set could not be linked into a pool
    #[error("failed to build descriptor pool: {0}")]
    DescriptorBuild(String),

    /// A directory input held no descriptor sets
    #[error("no descriptor sets found under '{path}'")]
    NoDescriptorsFound {
        /// The directory that was searched
        path: PathBuf,
    },

    /// A requested module has no registry entry
    #[error("module '{module}' is not present in the schema registry")]
    MissingModule {
        /// The requested module name
        module: String,
    },

    /// Two different definitions share a name under the strict collision policy
    #[error("{kind} '{name}' is defined more than once in module '{module}'")]
    NameCollision {
        /// "message", "enum" or "service"
        kind: &'static str,
        /// The colliding declared name
        name: String,
        /// Module being extracted
        module: String,
    },
}

impl Error {
    /// Creates a new file read error
    pub fn file_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    /// Creates a new file write error
    pub fn file_write(
        module: impl Into<String>,
        path: impl Into<PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::FileWrite {
            module: module.into(),
            path: path.into(),
            source,
        }
    }

    /// Creates a new directory creation error
    pub fn directory_create(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::DirectoryCreate {
            path: path.into(),
            source,
        }
    }

    /// Creates a new descriptor build error
    pub fn descriptor_build(msg: impl Into<String>) -> Self {
        Self::DescriptorBuild(msg.into())
    }

    /// Creates a new missing module error
    pub fn missing_module(module: impl Into<String>) -> Self {
        Self::MissingModule {
            module: module.into(),
        }
    }

    /// Creates a new name collision error
    pub fn name_collision(
        kind: &'static str,
        name: impl Into<String>,
        module: impl Into<String>,
    ) -> Self {
        Self::NameCollision {
            kind,
            name: name.into(),
            module: module.into(),
        }
    }

    /// Returns true if this error aborts the whole run rather than one module
    pub fn is_fatal_for_run(&self) -> bool {
        !matches!(
            self,
            Self::FileWrite { .. } | Self::DirectoryCreate { .. } | Self::NameCollision { .. }
        )
    }
}
