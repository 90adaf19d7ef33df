//! # Series
//!
//! The root object of an openPMD dataset. A [`Series`] owns the
//! [`IOHandler`] serving its storage, the [`Iterations`] container and the
//! series-level attributes, and drives the two orchestration protocols:
//!
//! - **flush**: walk the hierarchy, enqueue create/write tasks for everything
//!   unwritten or dirty, and synchronize with the backend.
//! - **read**: open the file(s), validate the mandatory attributes and
//!   rebuild the hierarchy from what storage lists.
//!
//! ## Iteration encodings
//!
//! | encoding     | name          | physical layout                        |
//! |--------------|---------------|----------------------------------------|
//! | `fileBased`  | `run%T.h5`    | `run0.h5`, `run100.h5`, one per step   |
//! | `groupBased` | `run.h5`      | `/data/0`, `/data/100` inside one file |
//!
//! The placeholder `%T` in the file name selects file-based encoding. When
//! reading, the encoding stored in the file wins over that guess.
//!
//! ## Lifecycle
//!
//! A created series stays unwritten until its first successful flush. An
//! opened series is fully read during construction and starts out written
//! and clean. Dropping a series flushes it one last time; failures there are
//! logged, use [`Series::close`] to observe them.

mod attributes;
mod error;
mod filename;
mod flush;
mod read;

#[cfg(test)]
mod tests;

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use crate::attributable::Attributable;
use crate::config::Config;
use crate::io::{AccessType, BackendKind, BackendRegistry, Communicator, Format, IOHandler};
use crate::iteration::Iterations;

pub use error::{ErrorKind, SeriesError};
pub use filename::{clean_filename, determine_format, determine_format_with, matcher, FilenamePattern};

/// openPMD standard version written by this library
pub const OPENPMD_VERSION: &str = "1.1.0";
/// Base path template of every known version
pub const BASE_PATH: &str = "/data/%T/";
/// Versions the hierarchical read understands
pub const KNOWN_VERSIONS: [&str; 3] = ["1.0.0", "1.0.1", "1.1.0"];
/// Versions in which group-based iterationFormat must equal basePath
pub(crate) const LEGACY_VERSIONS: [&str; 2] = ["1.0.0", "1.0.1"];
/// Token replaced by the iteration index in file names and paths
pub const ITERATION_PLACEHOLDER: &str = "%T";

/// How iterations are laid out in storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterationEncoding {
    /// One physical file per iteration
    FileBased,
    /// All iterations are groups inside one file
    GroupBased,
}

impl IterationEncoding {
    /// Attribute value persisted for this encoding
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationEncoding::FileBased => "fileBased",
            IterationEncoding::GroupBased => "groupBased",
        }
    }
}

impl fmt::Display for IterationEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IterationEncoding {
    type Err = SeriesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fileBased" => Ok(IterationEncoding::FileBased),
            "groupBased" => Ok(IterationEncoding::GroupBased),
            other => Err(SeriesError::UnknownIterationEncoding(other.to_string())),
        }
    }
}

/// Construction options of a [`Series`]
#[derive(Debug, Clone)]
pub struct SeriesOptions {
    registry: BackendRegistry,
    communicator: Option<Arc<dyn Communicator>>,
    bp_engine: Format,
    encoding: Option<IterationEncoding>,
}

impl Default for SeriesOptions {
    fn default() -> Self {
        Self {
            registry: BackendRegistry::default(),
            communicator: None,
            bp_engine: Format::Adios1,
            encoding: None,
        }
    }
}

impl SeriesOptions {
    /// Options following a loaded [`Config`]
    pub fn from_config(config: &Config) -> Self {
        Self {
            registry: config.registry(),
            bp_engine: config.bp_engine().format(),
            ..Self::default()
        }
    }

    /// Use `registry` to construct the backend
    pub fn registry(mut self, registry: BackendRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Perform collective I/O over `communicator`
    pub fn communicator(mut self, communicator: Arc<dyn Communicator>) -> Self {
        self.communicator = Some(communicator);
        self
    }

    /// Format `.bp` files map to
    pub fn bp_engine(mut self, format: Format) -> Self {
        self.bp_engine = format;
        self
    }

    /// Request an encoding instead of deriving it from the file name
    pub fn iteration_encoding(mut self, encoding: IterationEncoding) -> Self {
        self.encoding = Some(encoding);
        self
    }
}

/// Root of an openPMD dataset
pub struct Series {
    attributable: Attributable,
    iterations: Iterations,
    handler: IOHandler,
    name: String,
    format: Format,
    iteration_encoding: IterationEncoding,
    flush_on_drop: bool,
}

impl Series {
    /// Create or open the series at `filepath` with default options
    pub fn new(filepath: &str, access: AccessType) -> Result<Self, SeriesError> {
        Self::with_options(filepath, access, SeriesOptions::default())
    }

    /// Create or open the series at `filepath`
    ///
    /// `filepath` is split at its last `/` into directory and file name; a
    /// bare file name lives in the current directory. The extension selects
    /// the storage format and is stripped from the series name.
    pub fn with_options(
        filepath: &str,
        access: AccessType,
        options: SeriesOptions,
    ) -> Result<Self, SeriesError> {
        let (directory, file) = match filepath.rfind('/') {
            Some(pos) => (&filepath[..=pos], &filepath[pos + 1..]),
            None => ("./", filepath),
        };
        if file.is_empty() {
            return Err(SeriesError::InvalidPath(filepath.to_string()));
        }

        let format = determine_format_with(file, options.bp_engine);
        let name = clean_filename(file, format);
        let handler = options.registry.create_io_handler(
            Path::new(directory),
            access,
            format,
            options.communicator,
        )?;

        let guessed = if name.contains(ITERATION_PLACEHOLDER) {
            IterationEncoding::FileBased
        } else {
            IterationEncoding::GroupBased
        };
        let attributable = Attributable::new(None);
        let iterations = Iterations::new(attributable.id());
        let mut series = Series {
            attributable,
            iterations,
            handler,
            name,
            format,
            iteration_encoding: options.encoding.unwrap_or(guessed),
            flush_on_drop: false,
        };

        match access {
            AccessType::Create => series.init(options.encoding.unwrap_or(guessed))?,
            AccessType::ReadOnly | AccessType::ReadWrite => {
                if series.handler.backend_kind() == BackendKind::Dummy {
                    log::warn!(
                        "No backend serves '{}', nothing is read",
                        series.name
                    );
                    series.attributable.state_mut().mark_synced();
                    series.iterations.state_mut().mark_synced();
                } else if guessed == IterationEncoding::FileBased {
                    series.read_file_based()?;
                } else {
                    series.read_group_based()?;
                }
            }
        }

        log::debug!(
            "Opened series '{}' ({}, {}, {})",
            series.name,
            series.format,
            series.iteration_encoding,
            access
        );
        series.flush_on_drop = true;
        Ok(series)
    }

    fn init(&mut self, encoding: IterationEncoding) -> Result<(), SeriesError> {
        if encoding == IterationEncoding::FileBased && !self.name.contains(ITERATION_PLACEHOLDER) {
            return Err(SeriesError::MissingIterationPlaceholder);
        }
        self.set_open_pmd(OPENPMD_VERSION);
        self.set_open_pmd_extension(0);
        self.attributable.set_attribute("basePath", BASE_PATH);
        let date = chrono::Local::now().format("%Y-%m-%d %H:%M:%S %z").to_string();
        self.set_date(&date);
        self.set_iteration_encoding(encoding)?;
        Ok(())
    }

    /// Series name without extension, possibly containing `%T`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage format derived from the file name
    pub fn format(&self) -> Format {
        self.format
    }

    /// Access mode the series was opened with
    pub fn access(&self) -> AccessType {
        self.handler.access()
    }

    /// Directory holding the series' files
    pub fn directory(&self) -> &Path {
        self.handler.directory()
    }

    /// Backend serving this series
    pub fn backend_kind(&self) -> BackendKind {
        self.handler.backend_kind()
    }

    /// Current iteration encoding
    pub fn iteration_encoding(&self) -> IterationEncoding {
        self.iteration_encoding
    }

    /// The iterations of this series
    pub fn iterations(&self) -> &Iterations {
        &self.iterations
    }

    /// The iterations of this series, mutably
    pub fn iterations_mut(&mut self) -> &mut Iterations {
        &mut self.iterations
    }

    /// Series-level attribute store
    pub fn attributable(&self) -> &Attributable {
        &self.attributable
    }

    /// Whether the series exists in storage
    pub fn written(&self) -> bool {
        self.attributable.state().written()
    }

    /// Whether the series has changes to flush
    pub fn dirty(&self) -> bool {
        self.attributable.state().dirty()
    }

    /// Flush and report the outcome instead of logging it on drop
    pub fn close(mut self) -> Result<(), SeriesError> {
        self.flush_on_drop = false;
        self.flush()
    }
}

impl fmt::Debug for Series {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Series")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("encoding", &self.iteration_encoding)
            .field("handler", &self.handler)
            .field("iterations", &self.iterations.len())
            .finish()
    }
}

impl Drop for Series {
    fn drop(&mut self) {
        if !self.flush_on_drop {
            return;
        }
        if let Err(e) = self.flush() {
            log::error!("Failed to flush series '{}' on drop: {}", self.name, e);
        }
    }
}
