//! Error type shared by the codec, the store and the credential sources.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse classification of a [`ProfileError`], used by callers that only
/// care about the category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    AlreadyExists,
    Format,
    MissingCredentials,
    Unavailable,
    Io,
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile '{name}' does not exist")]
    ProfileNotFound { name: String },

    #[error("Credentials file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("No backup found for {}", path.display())]
    BackupNotFound { path: PathBuf },

    #[error("Profile '{name}' already exists")]
    AlreadyExists { name: String },

    #[error("Line {line}: {message}")]
    Format { line: usize, message: String },

    #[error("{0}")]
    MissingCredentials(String),

    #[error("Clipboard unavailable: {0}")]
    Unavailable(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ProfileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::ProfileNotFound { .. } | Self::FileNotFound { .. } | Self::BackupNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::Format { .. } => ErrorKind::Format,
            Self::MissingCredentials(_) => ErrorKind::MissingCredentials,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn not_found(name: &str) -> Self {
        Self::ProfileNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T, E = ProfileError> = std::result::Result<T, E>;
