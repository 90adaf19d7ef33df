use super::backend::{BackendKind, StorageBackend};
use super::{FlushFuture, HandlerError, IOTask};

/// Backend that performs no storage operations at all
///
/// Selected for unrecognized file extensions and for formats whose backend is
/// not registered, so call sites can enqueue and flush unconditionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyBackend;

impl StorageBackend for DummyBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Dummy
    }

    fn execute(&mut self, _task: &IOTask) -> Result<(), HandlerError> {
        Ok(())
    }

    fn flush(&mut self, tasks: Vec<IOTask>) -> FlushFuture {
        log::trace!("Dummy backend dropping {} tasks", tasks.len());
        FlushFuture::ready(Ok(()))
    }
}
