use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::backend::{BackendKind, StorageBackend};
use super::{AccessType, Communicator, FlushFuture, HandlerError, IOTask};

/// Queue front shared by every backend
///
/// Tasks are appended with [`enqueue`](IOHandler::enqueue) and executed, in
/// enqueue order, by the next [`flush`](IOHandler::flush). Flush is the only
/// synchronization point: result slots of queued tasks are valid once the
/// returned future has been waited on.
pub struct IOHandler {
    directory: PathBuf,
    access: AccessType,
    communicator: Option<Arc<dyn Communicator>>,
    queue: VecDeque<IOTask>,
    backend: Box<dyn StorageBackend>,
}

impl IOHandler {
    /// Wrap `backend` in a handler rooted at `directory`
    pub fn new(
        directory: impl Into<PathBuf>,
        access: AccessType,
        communicator: Option<Arc<dyn Communicator>>,
        backend: Box<dyn StorageBackend>,
    ) -> Self {
        Self {
            directory: directory.into(),
            access,
            communicator,
            queue: VecDeque::new(),
            backend,
        }
    }

    /// Directory holding the physical files
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Access mode the handler was created with
    pub fn access(&self) -> AccessType {
        self.access
    }

    /// Communicator of a parallel handler
    pub fn communicator(&self) -> Option<&Arc<dyn Communicator>> {
        self.communicator.as_ref()
    }

    /// Technology of the wrapped backend
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// Number of tasks waiting for the next flush
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Append a task to the queue
    pub fn enqueue(&mut self, task: IOTask) {
        self.queue.push_back(task);
    }

    /// Execute every queued task and clear the queue
    pub fn flush(&mut self) -> FlushFuture {
        if self.queue.is_empty() {
            return FlushFuture::ready(Ok(()));
        }
        let tasks: Vec<IOTask> = self.queue.drain(..).collect();
        log::debug!(
            "Flushing {} tasks to {} backend",
            tasks.len(),
            self.backend.kind()
        );
        self.backend.flush(tasks)
    }

    /// Enqueue one task and flush synchronously
    pub(crate) fn run(&mut self, task: IOTask) -> Result<(), HandlerError> {
        self.enqueue(task);
        self.flush().wait()
    }
}

impl fmt::Debug for IOHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IOHandler")
            .field("directory", &self.directory)
            .field("access", &self.access)
            .field("backend", &self.backend.kind())
            .field("pending", &self.queue.len())
            .finish()
    }
}
