use std::path::PathBuf;

use crate::attribute::{AttributeError, Datatype};
use crate::io::HandlerError;

/// Broad class of a [`SeriesError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised at construction or by a setter; the request itself is invalid
    Configuration,
    /// Raised while flushing or reading; storage disagrees with expectations
    Io,
}

/// Errors raised by [`Series`](super::Series) operations
#[derive(Debug, thiserror::Error)]
pub enum SeriesError {
    /// A file-based series name lacks the iteration placeholder
    #[error("For fileBased formats the iteration regex %T must be included in the file name")]
    MissingIterationPlaceholder,

    /// A structural attribute was changed after it reached storage
    #[error("A files {attribute} can not (yet) be changed after it has been written.")]
    AlreadyWritten {
        /// Name of the guarded attribute
        attribute: &'static str,
    },

    /// basePath is fixed in every known openPMD version
    #[error("Custom basePath not allowed in openPMD <=1.1.0")]
    CustomBasePath,

    /// Legacy group-based series must use their basePath as iterationFormat
    #[error("iterationFormat must not differ from basePath {base_path} for groupBased data")]
    IterationFormatMismatch {
        /// The series' basePath
        base_path: String,
    },

    /// A structural attribute was set through the generic attribute store
    #[error("Attribute '{0}' can only be changed through its dedicated setter")]
    ReservedAttribute(String),

    /// An iteration already in storage was removed from the container
    #[error("Iteration {index} can not be removed after it has been written")]
    IterationWritten {
        /// Index of the iteration
        index: u64,
    },

    /// The series path has no file name component
    #[error("Invalid series path: '{0}'")]
    InvalidPath(String),

    /// The directory of a file-based series does not exist
    #[error("Supplied directory is not valid: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// No file in the directory belongs to the file-based series
    #[error("No matching iterations found: {0}")]
    NoMatchingIterations(String),

    /// A mandatory attribute was stored with the wrong datatype
    #[error("Unexpected Attribute datatype for '{attribute}' (expected {expected}, found {found})")]
    UnexpectedDatatype {
        /// Attribute name
        attribute: String,
        /// Required datatype
        expected: Datatype,
        /// Stored datatype
        found: Datatype,
    },

    /// A mandatory attribute is absent
    #[error("Missing mandatory attribute '{0}'")]
    MissingAttribute(String),

    /// The stored iterationEncoding is neither fileBased nor groupBased
    #[error("Unknown iterationEncoding: {0}")]
    UnknownIterationEncoding(String),

    /// The stored openPMD version is not supported
    #[error("Unknown openPMD version - {0}")]
    UnknownVersion(String),

    /// A file-based series can only be written with at least one iteration
    #[error("fileBased output can not be written with no iterations.")]
    NoIterations,

    /// A group below the base path is not an iteration index
    #[error("Invalid iteration index '{0}'")]
    InvalidIterationIndex(String),

    /// Error from the storage backend
    #[error(transparent)]
    Handler(#[from] HandlerError),

    /// Attribute held an unexpected datatype
    #[error(transparent)]
    Attribute(#[from] AttributeError),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SeriesError {
    /// Whether the error stems from an invalid request or from storage
    pub fn kind(&self) -> ErrorKind {
        match self {
            SeriesError::MissingIterationPlaceholder
            | SeriesError::AlreadyWritten { .. }
            | SeriesError::CustomBasePath
            | SeriesError::IterationFormatMismatch { .. }
            | SeriesError::ReservedAttribute(_)
            | SeriesError::IterationWritten { .. }
            | SeriesError::InvalidPath(_)
            | SeriesError::UnknownVersion(_)
            | SeriesError::Attribute(_) => ErrorKind::Configuration,
            SeriesError::Handler(
                HandlerError::BackendUnavailable { .. } | HandlerError::ParallelUnavailable { .. },
            ) => ErrorKind::Configuration,
            _ => ErrorKind::Io,
        }
    }
}
