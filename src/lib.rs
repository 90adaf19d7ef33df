//! # openpmd - Backend-agnostic openPMD series
//!
//! `openpmd` models an openPMD dataset as a [`Series`](series::Series) of
//! iterations carrying typed attributes, and persists it through
//! interchangeable storage backends without the calling code knowing which
//! one is active.
//!
//! ## Key Features
//!
//! - **Queued I/O**: every storage operation is an [`IOTask`](io::IOTask)
//!   enqueued on an [`IOHandler`](io::IOHandler) and executed, in order, on
//!   flush.
//!
//! - **Runtime backend registry**: formats map to backends through a
//!   [`BackendRegistry`](io::BackendRegistry). Native backends missing from
//!   the build fail loudly at construction; unknown formats degrade to a
//!   no-op backend.
//!
//! - **Written/dirty bookkeeping**: repeated flush and read cycles only touch
//!   storage for what actually changed.
//!
//! - **File-based and group-based encodings**: `run%T.h5` writes one file per
//!   iteration, `run.h5` keeps every iteration in one file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openpmd::prelude::*;
//!
//! let mut series = Series::new("diags/run.json", AccessType::Create)?;
//! series.set_author("Jane Doe");
//! series.iterations_mut().get_or_create(100).set_time(42.0);
//! series.close()?;
//!
//! let series = Series::new("diags/run.json", AccessType::ReadOnly)?;
//! assert_eq!(series.iterations().keys().collect::<Vec<_>>(), vec![100]);
//! # Ok::<(), openpmd::series::SeriesError>(())
//! ```
//!
//! ## Architecture
//!
//! - [`attribute`]: typed attribute values
//! - [`attributable`]: object identity, written/dirty state, attribute store
//! - [`io`]: tasks, handler queue, backends and their registry
//! - [`iteration`]: iterations and their container
//! - [`series`]: the root object with its flush and read protocols
//! - [`config`]: TOML configuration of backend selection

#![warn(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod attributable;
pub mod attribute;
pub mod config;
pub mod io;
pub mod iteration;
pub mod series;

/// Re-export commonly used types for convenience
pub mod prelude {
    pub use crate::attributable::{Attributes, Lifecycle, WriteState};
    pub use crate::attribute::{Attribute, Datatype};
    pub use crate::config::Config;
    pub use crate::io::{AccessType, BackendRegistry, Format, Parallelism};
    pub use crate::iteration::{Iteration, Iterations, RecordGroup};
    pub use crate::series::{IterationEncoding, Series, SeriesError, SeriesOptions};
}
