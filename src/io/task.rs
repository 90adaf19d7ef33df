//! Queued storage operations and their parameter blocks.
//!
//! Every [`Operation`] variant carries its request fields by value. Result
//! fields are [`Slot`]s: the caller keeps one clone of the slot, the queued
//! task carries the other, and the backend fills it while executing the task.
//! A slot is only meaningful after the owning handler's flush has completed.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::attributable::WritableId;
use crate::attribute::Attribute;

/// Shared result cell filled in by a backend
pub struct Slot<T>(Arc<Mutex<Option<T>>>);

impl<T> Slot<T> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    /// Store the backend's result, replacing any earlier value
    pub fn fill(&self, value: T) {
        *self.lock() = Some(value);
    }

    /// Remove and return the result, if one was filled in
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Whether a result is present
    pub fn is_filled(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // A poisoned slot still holds a consistent Option
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<T> Clone for Slot<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Slot")
            .field("filled", &self.is_filled())
            .finish()
    }
}

/// Kind of a queued operation, without its parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Create a physical file
    CreateFile,
    /// Open an existing physical file
    OpenFile,
    /// Create a group path
    CreatePath,
    /// Open an existing group path
    OpenPath,
    /// List child paths of a group
    ListPaths,
    /// Write one attribute
    WriteAtt,
    /// Read one attribute
    ReadAtt,
    /// List attribute names of an object
    ListAtts,
    /// Delete one attribute
    DeleteAtt,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::CreateFile => "CREATE_FILE",
            OperationKind::OpenFile => "OPEN_FILE",
            OperationKind::CreatePath => "CREATE_PATH",
            OperationKind::OpenPath => "OPEN_PATH",
            OperationKind::ListPaths => "LIST_PATHS",
            OperationKind::WriteAtt => "WRITE_ATT",
            OperationKind::ReadAtt => "READ_ATT",
            OperationKind::ListAtts => "LIST_ATTS",
            OperationKind::DeleteAtt => "DELETE_ATT",
        };
        f.write_str(name)
    }
}

/// One storage operation with its request and result fields
#[derive(Debug, Clone)]
pub enum Operation {
    /// Create (or truncate) the file `name`; the backend appends its extension
    CreateFile {
        /// File name, with or without extension
        name: String,
    },
    /// Open the existing file `name`
    OpenFile {
        /// File name, with or without extension
        name: String,
    },
    /// Create `path` below the parent's position (absolute paths start at the file root)
    CreatePath {
        /// Group path
        path: String,
    },
    /// Open the existing `path` below the parent's position
    OpenPath {
        /// Group path
        path: String,
    },
    /// List the child groups of the target
    ListPaths {
        /// Child group names, filled by the backend
        paths: Slot<Vec<String>>,
    },
    /// Write `attribute` as `name` on the target
    WriteAtt {
        /// Attribute name
        name: String,
        /// Value and datatype to persist
        attribute: Attribute,
    },
    /// Read the attribute `name` of the target
    ReadAtt {
        /// Attribute name
        name: String,
        /// Stored value with its datatype, filled by the backend
        attribute: Slot<Attribute>,
    },
    /// List the attribute names of the target
    ListAtts {
        /// Attribute names, filled by the backend
        attributes: Slot<Vec<String>>,
    },
    /// Delete the attribute `name` of the target
    DeleteAtt {
        /// Attribute name
        name: String,
    },
}

impl Operation {
    /// Kind tag of this operation
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::CreateFile { .. } => OperationKind::CreateFile,
            Operation::OpenFile { .. } => OperationKind::OpenFile,
            Operation::CreatePath { .. } => OperationKind::CreatePath,
            Operation::OpenPath { .. } => OperationKind::OpenPath,
            Operation::ListPaths { .. } => OperationKind::ListPaths,
            Operation::WriteAtt { .. } => OperationKind::WriteAtt,
            Operation::ReadAtt { .. } => OperationKind::ReadAtt,
            Operation::ListAtts { .. } => OperationKind::ListAtts,
            Operation::DeleteAtt { .. } => OperationKind::DeleteAtt,
        }
    }

    /// Whether executing this operation modifies storage
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Operation::CreateFile { .. }
                | Operation::CreatePath { .. }
                | Operation::WriteAtt { .. }
                | Operation::DeleteAtt { .. }
        )
    }
}

/// Non-owning reference to the object an operation concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WritableRef {
    /// The object itself
    pub id: WritableId,
    /// Its parent in the hierarchy, used to resolve relative paths
    pub parent: Option<WritableId>,
}

/// An operation queued against one object
#[derive(Debug, Clone)]
pub struct IOTask {
    /// Target object
    pub writable: WritableRef,
    /// Operation with its parameter block
    pub operation: Operation,
}

impl IOTask {
    /// Create a task for `writable`
    pub fn new(writable: WritableRef, operation: Operation) -> Self {
        Self {
            writable,
            operation,
        }
    }
}
