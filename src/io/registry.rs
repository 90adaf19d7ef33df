use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use super::backend::StorageBackend;
use super::dummy::DummyBackend;
use super::json::JsonBackend;
use super::{native, AccessType, Communicator, Format, HandlerError, IOHandler};

/// Whether a backend serves one process or a group of ranks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parallelism {
    /// Single process
    Serial,
    /// Collective I/O over a communicator with more than one rank
    Parallel,
}

/// Everything a backend factory gets to see
#[derive(Debug, Clone, Copy)]
pub struct BackendContext<'a> {
    /// Directory holding the physical files
    pub directory: &'a Path,
    /// Access mode of the series
    pub access: AccessType,
    /// Storage format derived from the file name
    pub format: Format,
    /// Communicator of a parallel series
    pub communicator: Option<&'a Arc<dyn Communicator>>,
}

/// Constructor of a backend, registered per format and parallelism
pub type BackendFactory = Arc<
    dyn Fn(&BackendContext<'_>) -> Result<Box<dyn StorageBackend>, HandlerError> + Send + Sync,
>;

/// Runtime table of available backends
///
/// Selection in [`create_io_handler`](BackendRegistry::create_io_handler):
///
/// 1. [`Format::Dummy`] always yields the no-op backend.
/// 2. A communicator with more than one rank needs a parallel entry; a missing
///    one is a hard error.
/// 3. Otherwise the serial entry is used; a missing one degrades to the no-op
///    backend with a warning.
///
/// A registered factory may still fail, which is how native stubs report a
/// backend that was left out of the build.
#[derive(Clone)]
pub struct BackendRegistry {
    factories: HashMap<(Format, Parallelism), BackendFactory>,
}

impl BackendRegistry {
    /// A registry without any backend; everything degrades to no-op
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The registry of this build
    ///
    /// Registers the JSON backend and, when `strict` is set, fail-loud stubs
    /// for the native HDF5/ADIOS backends.
    pub fn builtin(strict: bool, json_pretty: bool) -> Self {
        let mut registry = Self::empty();
        registry.register(
            Format::Json,
            Parallelism::Serial,
            JsonBackend::factory(json_pretty),
        );
        if strict {
            native::register_stubs(&mut registry);
        }
        registry
    }

    /// Register (or replace) the factory for `format` and `parallelism`
    pub fn register<F>(&mut self, format: Format, parallelism: Parallelism, factory: F) -> &mut Self
    where
        F: Fn(&BackendContext<'_>) -> Result<Box<dyn StorageBackend>, HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert((format, parallelism), Arc::new(factory));
        self
    }

    /// Remove a factory; returns whether one was registered
    pub fn unregister(&mut self, format: Format, parallelism: Parallelism) -> bool {
        self.factories.remove(&(format, parallelism)).is_some()
    }

    /// Whether a factory is registered for `format` and `parallelism`
    pub fn is_registered(&self, format: Format, parallelism: Parallelism) -> bool {
        self.factories.contains_key(&(format, parallelism))
    }

    /// Construct the handler serving `format` under `directory`
    pub fn create_io_handler(
        &self,
        directory: &Path,
        access: AccessType,
        format: Format,
        communicator: Option<Arc<dyn Communicator>>,
    ) -> Result<IOHandler, HandlerError> {
        let ranks = communicator.as_ref().map_or(1, |c| c.size());

        if format == Format::Dummy {
            log::debug!("No storage format for {}, using no-op backend", directory.display());
            return Ok(IOHandler::new(
                directory,
                access,
                communicator,
                Box::new(DummyBackend),
            ));
        }

        let parallelism = if ranks > 1 {
            Parallelism::Parallel
        } else {
            Parallelism::Serial
        };

        let backend = match self.factories.get(&(format, parallelism)) {
            Some(factory) => {
                let ctx = BackendContext {
                    directory,
                    access,
                    format,
                    communicator: communicator.as_ref(),
                };
                factory(&ctx)?
            }
            None if parallelism == Parallelism::Parallel => {
                return Err(HandlerError::ParallelUnavailable { format, ranks });
            }
            None => {
                log::warn!(
                    "No {} backend available. Your IO operations will be NOOPS!",
                    format
                );
                Box::new(DummyBackend)
            }
        };

        log::debug!(
            "Using {} backend for {} ({} ranks)",
            backend.kind(),
            directory.display(),
            ranks
        );
        Ok(IOHandler::new(directory, access, communicator, backend))
    }
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::builtin(true, true)
    }
}

impl fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self
            .factories
            .keys()
            .map(|(format, parallelism)| format!("{}/{:?}", format, parallelism))
            .collect();
        keys.sort();
        f.debug_struct("BackendRegistry")
            .field("backends", &keys)
            .finish()
    }
}

/// Construct a handler from the builtin registry
pub fn create_io_handler(
    directory: &Path,
    access: AccessType,
    format: Format,
    communicator: Option<Arc<dyn Communicator>>,
) -> Result<IOHandler, HandlerError> {
    BackendRegistry::default().create_io_handler(directory, access, format, communicator)
}
