//! Entry points for backends backed by native libraries.
//!
//! This build links neither HDF5 nor ADIOS. Their registry entries are stubs
//! that fail at handler construction with a descriptive error, so a
//! misconfigured build is caught before the first operation is queued.

use super::backend::{BackendKind, StorageBackend};
use super::registry::{BackendContext, BackendRegistry, Parallelism};
use super::{Format, HandlerError};

/// Native backends and the registry slots they occupy
pub(crate) const NATIVE_BACKENDS: [(Format, Parallelism, BackendKind); 6] = [
    (Format::Hdf5, Parallelism::Serial, BackendKind::Hdf5),
    (Format::Hdf5, Parallelism::Parallel, BackendKind::ParallelHdf5),
    (Format::Adios1, Parallelism::Serial, BackendKind::Adios1),
    (Format::Adios1, Parallelism::Parallel, BackendKind::ParallelAdios1),
    (Format::Adios2, Parallelism::Serial, BackendKind::Adios2),
    (Format::Adios2, Parallelism::Parallel, BackendKind::ParallelAdios2),
];

/// Factory for a backend that is not part of this build
pub fn unavailable(
    backend: BackendKind,
) -> impl Fn(&BackendContext<'_>) -> Result<Box<dyn StorageBackend>, HandlerError> + Send + Sync
{
    move |_ctx| Err(HandlerError::BackendUnavailable { backend })
}

/// Occupy every native slot with its fail-loud stub
pub(crate) fn register_stubs(registry: &mut BackendRegistry) {
    for (format, parallelism, backend) in NATIVE_BACKENDS {
        registry.register(format, parallelism, unavailable(backend));
    }
}
