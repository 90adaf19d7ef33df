//! Integration tests for backend selection and the task protocol
//!
//! A recording backend registered for `.h5` counts the operations a series
//! enqueues, which pins down how many tasks repeated flushes produce.

use openpmd::io::{
    AccessType, BackendKind, BackendRegistry, Communicator, Format, HandlerError, IOTask,
    JsonBackend, OperationKind, Parallelism, StorageBackend,
};
use openpmd::prelude::Config;
use openpmd::series::{ErrorKind, Series, SeriesError, SeriesOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;

type Counts = Arc<Mutex<HashMap<OperationKind, usize>>>;

struct Counting {
    counts: Counts,
}

impl StorageBackend for Counting {
    fn kind(&self) -> BackendKind {
        BackendKind::Hdf5
    }

    fn execute(&mut self, task: &IOTask) -> Result<(), HandlerError> {
        *self
            .counts
            .lock()
            .unwrap()
            .entry(task.operation.kind())
            .or_default() += 1;
        Ok(())
    }
}

fn counting_options(counts: &Counts) -> SeriesOptions {
    let counts = Arc::clone(counts);
    let mut registry = BackendRegistry::default();
    registry.register(Format::Hdf5, Parallelism::Serial, move |_ctx| {
        Ok(Box::new(Counting {
            counts: Arc::clone(&counts),
        }) as Box<dyn StorageBackend>)
    });
    SeriesOptions::default().registry(registry)
}

fn count(counts: &Counts, kind: OperationKind) -> usize {
    counts.lock().unwrap().get(&kind).copied().unwrap_or(0)
}

#[derive(Debug)]
struct Ranks(usize);

impl Communicator for Ranks {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        self.0
    }
}

/// Repeated flushes of an unchanged group-based series create the file once
#[test]
fn test_create_file_enqueued_once() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let counts = Counts::default();
    let path = format!("{}/run.h5", dir.path().display());
    let mut series = Series::with_options(&path, AccessType::Create, counting_options(&counts))?;
    assert_eq!(series.backend_kind(), BackendKind::Hdf5);

    series.flush()?;
    let writes = count(&counts, OperationKind::WriteAtt);
    assert_eq!(count(&counts, OperationKind::CreateFile), 1);
    assert!(writes > 0);

    series.flush()?;
    series.flush()?;
    assert_eq!(count(&counts, OperationKind::CreateFile), 1);
    assert_eq!(count(&counts, OperationKind::WriteAtt), writes);

    // a dirty attribute rewrites the series attributes, not the file
    series.set_author("Jane Doe");
    series.flush()?;
    assert_eq!(count(&counts, OperationKind::CreateFile), 1);
    assert!(count(&counts, OperationKind::WriteAtt) > writes);
    series.close()?;
    Ok(())
}

/// File-based series create one file per new iteration and nothing on re-flush
#[test]
fn test_file_based_creates_one_file_per_iteration() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let counts = Counts::default();
    let path = format!("{}/run%T.h5", dir.path().display());
    let mut series = Series::with_options(&path, AccessType::Create, counting_options(&counts))?;
    for index in [0, 10, 20] {
        series.iterations_mut().get_or_create(index);
    }
    series.flush()?;
    assert_eq!(count(&counts, OperationKind::CreateFile), 3);
    assert_eq!(count(&counts, OperationKind::CreatePath), 6);

    series.flush()?;
    assert_eq!(count(&counts, OperationKind::CreateFile), 3);
    assert_eq!(count(&counts, OperationKind::OpenFile), 0);

    series.iterations_mut().get_or_create(30);
    series.flush()?;
    assert_eq!(count(&counts, OperationKind::CreateFile), 4);
    series.close()?;
    Ok(())
}

/// Native backends missing from the build fail at construction
#[test]
fn test_unavailable_backend_fails_loudly() {
    let err = Series::new("diags/run.h5", AccessType::Create).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert!(matches!(
        err,
        SeriesError::Handler(HandlerError::BackendUnavailable {
            backend: BackendKind::Hdf5
        })
    ));
    assert_eq!(err.to_string(), "openPMD built without HDF5 support");
}

/// Without strict stubs an absent backend degrades to the no-op backend
#[test]
fn test_lenient_config_degrades() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let config: Config = "[backends]\nstrict = false\nbp_engine = \"adios2\"".parse()?;
    let path = format!("{}/run.bp", dir.path().display());

    let mut series = Series::with_options(&path, AccessType::Create, SeriesOptions::from_config(&config))?;
    assert_eq!(series.format(), Format::Adios2);
    assert_eq!(series.backend_kind(), BackendKind::Dummy);
    series.iterations_mut().get_or_create(0);
    series.close()?;
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

/// The `.bp` engine follows the configuration
#[test]
fn test_bp_engine_selection() {
    let config: Config = "[backends]\nbp_engine = \"adios2\"".parse().unwrap();
    let err = Series::with_options(
        "diags/run.bp",
        AccessType::Create,
        SeriesOptions::from_config(&config),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SeriesError::Handler(HandlerError::BackendUnavailable {
            backend: BackendKind::Adios2
        })
    ));
}

/// More than one rank needs a parallel backend; single ranks use the serial one
#[test]
fn test_parallel_selection() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = format!("{}/run.json", dir.path().display());

    let err = Series::with_options(
        &path,
        AccessType::Create,
        SeriesOptions::default().communicator(Arc::new(Ranks(4))),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        SeriesError::Handler(HandlerError::ParallelUnavailable {
            format: Format::Json,
            ranks: 4
        })
    ));

    let series = Series::with_options(
        &path,
        AccessType::Create,
        SeriesOptions::default().communicator(Arc::new(Ranks(1))),
    )?;
    assert_eq!(series.backend_kind(), BackendKind::Json);
    series.close()?;

    let mut registry = BackendRegistry::default();
    registry.register(Format::Json, Parallelism::Parallel, JsonBackend::factory(false));
    let series = Series::with_options(
        &path,
        AccessType::Create,
        SeriesOptions::default()
            .registry(registry)
            .communicator(Arc::new(Ranks(2))),
    )?;
    assert_eq!(series.backend_kind(), BackendKind::Json);
    series.close()?;
    Ok(())
}
