/*!
Error types for the backup/restore core.
*/

use thiserror::Error;

use crate::store::DocKind;

/// Result type used throughout the core.
pub type Result<T> = std::result::Result<T, BackupError>;

/// Errors that can occur during backup or restore operations.
#[derive(Error, Debug)]
pub enum BackupError {
    /// The Jenkins server could not be reached at all
    #[error("cannot reach Jenkins server: {0}")]
    GatewayUnavailable(String),

    /// A specific job/view configuration could not be retrieved
    #[error("failed to fetch {kind} '{name}': {reason}")]
    ItemFetchFailed {
        kind: DocKind,
        name: String,
        reason: String,
    },

    /// A restore-time create call failed
    #[error("failed to create {kind} '{name}': {reason}")]
    ItemCreateFailed {
        kind: DocKind,
        name: String,
        reason: String,
    },

    /// A restore-time delete call failed
    #[error("failed to delete {kind} '{name}': {reason}")]
    ItemDeleteFailed {
        kind: DocKind,
        name: String,
        reason: String,
    },

    /// Staging or writing the backup archive failed
    #[error("failed to write archive: {0}")]
    ArchiveWrite(String),

    /// The backup archive could not be opened or extracted
    #[error("failed to read archive: {0}")]
    ArchiveRead(String),

    /// The archive is missing its metadata entry, or the metadata is unparsable
    #[error("archive is corrupt: {0}")]
    ArchiveCorrupt(String),

    /// A view's include regex does not compile
    #[error("invalid include regex '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    /// Invalid server configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O errors during staging operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot metadata serialization errors
    #[error("metadata error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl BackupError {
    /// Create a new gateway-unavailable error
    pub fn gateway_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::GatewayUnavailable(msg.into())
    }

    /// Create a new item-fetch error
    pub fn fetch_failed<N, R>(kind: DocKind, name: N, reason: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Self::ItemFetchFailed {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new item-create error
    pub fn create_failed<N, R>(kind: DocKind, name: N, reason: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Self::ItemCreateFailed {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new item-delete error
    pub fn delete_failed<N, R>(kind: DocKind, name: N, reason: R) -> Self
    where
        N: Into<String>,
        R: Into<String>,
    {
        Self::ItemDeleteFailed {
            kind,
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new archive-write error
    pub fn archive_write<S: Into<String>>(msg: S) -> Self {
        Self::ArchiveWrite(msg.into())
    }

    /// Create a new archive-read error
    pub fn archive_read<S: Into<String>>(msg: S) -> Self {
        Self::ArchiveRead(msg.into())
    }

    /// Create a new archive-corrupt error
    pub fn archive_corrupt<S: Into<String>>(msg: S) -> Self {
        Self::ArchiveCorrupt(msg.into())
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
