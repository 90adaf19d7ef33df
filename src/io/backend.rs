use std::fmt;

use super::{FlushFuture, HandlerError, IOTask};

/// Concrete storage technologies a handler can dispatch to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    /// Serial HDF5
    Hdf5,
    /// MPI-parallel HDF5
    ParallelHdf5,
    /// Serial ADIOS1
    Adios1,
    /// MPI-parallel ADIOS1
    ParallelAdios1,
    /// Serial ADIOS2
    Adios2,
    /// MPI-parallel ADIOS2
    ParallelAdios2,
    /// JSON documents
    Json,
    /// No-op
    Dummy,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Hdf5 => "HDF5",
            BackendKind::ParallelHdf5 => "parallel HDF5",
            BackendKind::Adios1 => "ADIOS1",
            BackendKind::ParallelAdios1 => "parallel ADIOS1",
            BackendKind::Adios2 => "ADIOS2",
            BackendKind::ParallelAdios2 => "parallel ADIOS2",
            BackendKind::Json => "JSON",
            BackendKind::Dummy => "DUMMY",
        };
        f.write_str(name)
    }
}

/// Executor of queued tasks against one storage technology
///
/// [`IOHandler`](super::IOHandler) owns the queue and hands the drained tasks
/// to [`flush`](StorageBackend::flush) in enqueue order. The default `flush`
/// executes them one by one, stops at the first failure (the rest of the
/// batch is discarded, never retried), and calls
/// [`commit`](StorageBackend::commit) once every task has succeeded.
pub trait StorageBackend: Send {
    /// Which technology this backend drives
    fn kind(&self) -> BackendKind;

    /// Execute a single task, filling its result slots
    fn execute(&mut self, task: &IOTask) -> Result<(), HandlerError>;

    /// Make the effects of a fully executed batch durable
    fn commit(&mut self) -> Result<(), HandlerError> {
        Ok(())
    }

    /// Execute a batch of tasks in order
    fn flush(&mut self, tasks: Vec<IOTask>) -> FlushFuture {
        let total = tasks.len();
        for (position, task) in tasks.iter().enumerate() {
            log::trace!(
                "{} backend: {} on {:?}",
                self.kind(),
                task.operation.kind(),
                task.writable.id
            );
            if let Err(e) = self.execute(task) {
                let discarded = total - position - 1;
                if discarded > 0 {
                    log::debug!(
                        "{} failed, discarding {} queued tasks",
                        task.operation.kind(),
                        discarded
                    );
                }
                return FlushFuture::ready(Err(e));
            }
        }
        FlushFuture::ready(self.commit())
    }
}
