//! Error type shared by every traitor operation

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving, locating or editing a type
#[derive(Error, Debug)]
pub enum TraitorError {
    #[error("No traits specified. Call `with_trait` first.")]
    NoTraitsSpecified,

    #[error("{kind} `{name}` not found")]
    NotFound { kind: String, name: String },

    #[error("Body of `{name}` opened on line {line} is never closed")]
    UnclosedBody { name: String, line: usize },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", path.display())]
    Composer { path: PathBuf, message: String },
}

impl TraitorError {
    pub fn not_found(kind: impl Into<String>, name: impl Into<String>) -> Self {
        TraitorError::NotFound {
            kind: kind.into(),
            name: name.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TraitorError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the target could not be located, either by a resolver or inside its file
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TraitorError::NotFound { .. } | TraitorError::UnclosedBody { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TraitorError>;
