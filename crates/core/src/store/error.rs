use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::model::{ModuleId, SectionId};

/// Reference to an entity that a mutation or query could not find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityRef {
    Section(SectionId),
    Module(ModuleId),
    /// The range owned by `module` inside `section`.
    Range { module: ModuleId, section: SectionId },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityRef::Section(id) => write!(f, "section #{id}"),
            EntityRef::Module(id) => write!(f, "module #{id}"),
            EntityRef::Range { module, section } => {
                write!(f, "range of module #{module} in section #{section}")
            }
        }
    }
}

/// Coarse classification of a `StoreError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A mutation's preconditions failed; nothing was changed.
    Validation,
    /// A referenced id does not exist.
    NotFound,
    /// A project document could not be read, parsed, or accepted.
    Persistence,
}

/// Error type for project store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A mutation was rejected. The message names the conflicting entity.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(EntityRef),

    /// The document is not valid JSON or does not match the schema.
    #[error("Malformed project document: {0}")]
    MalformedDocument(#[from] serde_json::Error),

    /// The document parsed but describes a project that breaks an invariant.
    #[error("Invalid project document: {0}")]
    InvalidDocument(String),

    /// The document was written by a newer format than we understand.
    #[error("Unsupported project format version {found}; newest supported is {max_supported}")]
    UnsupportedFormatVersion { found: u32, max_supported: u32 },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::MalformedDocument(_)
            | StoreError::InvalidDocument(_)
            | StoreError::UnsupportedFormatVersion { .. }
            | StoreError::Io { .. } => ErrorKind::Persistence,
        }
    }

    pub(crate) fn validation(reason: impl Into<String>) -> Self {
        StoreError::Validation(reason.into())
    }
}

/// Convenience result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
