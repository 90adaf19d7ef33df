use super::*;
use crate::attribute::Attribute;
use crate::attributable::Attributes;
use tempfile::{tempdir, TempDir};

fn path(dir: &TempDir, name: &str) -> String {
    format!("{}/{}", dir.path().display(), name)
}

#[test]
fn test_create_initializes_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;

    assert_eq!(series.name(), "run");
    assert_eq!(series.format(), Format::Json);
    assert_eq!(series.backend_kind(), BackendKind::Json);
    assert_eq!(series.open_pmd()?, "1.1.0");
    assert_eq!(series.open_pmd_extension()?, 0);
    assert_eq!(series.base_path()?, "/data/%T/");
    assert_eq!(series.iteration_encoding(), IterationEncoding::GroupBased);
    assert_eq!(series.iteration_format()?, "/data/%T/");
    assert!(series.date()?.is_some());
    assert_eq!(series.meshes_path()?, None);
    assert!(!series.written());
    assert!(series.dirty());

    series.close()?;
    assert!(dir.path().join("run.json").is_file());
    Ok(())
}

#[test]
fn test_file_based_requires_placeholder() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let options = SeriesOptions::default().iteration_encoding(IterationEncoding::FileBased);
    let err = Series::with_options(&path(&dir, "run.json"), AccessType::Create, options)
        .unwrap_err();
    assert!(matches!(err, SeriesError::MissingIterationPlaceholder));
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let series = Series::new(&path(&dir, "run%T.json"), AccessType::Create)?;
    assert_eq!(series.iteration_encoding(), IterationEncoding::FileBased);
    assert_eq!(series.iteration_format()?, "run%T");
    Ok(())
}

#[test]
fn test_file_based_flush_without_iterations() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run%T.json"), AccessType::Create)?;
    let err = series.flush().unwrap_err();
    assert!(matches!(err, SeriesError::NoIterations));
    assert_eq!(
        err.to_string(),
        "fileBased output can not be written with no iterations."
    );

    series.iterations_mut().get_or_create(0);
    series.close()?;
    assert!(dir.path().join("run0.json").is_file());
    Ok(())
}

#[test]
fn test_failed_flush_on_drop_is_swallowed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run%T.json"), AccessType::Create)?;
    assert!(matches!(series.flush(), Err(SeriesError::NoIterations)));

    let dropped = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || drop(series)));
    assert!(dropped.is_ok());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_structural_setters_frozen_after_flush() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;
    series.set_name("renamed")?;
    series.flush()?;
    assert!(series.written());
    assert!(!series.dirty());
    assert!(dir.path().join("renamed.json").is_file());

    assert!(matches!(
        series.set_iteration_encoding(IterationEncoding::GroupBased),
        Err(SeriesError::AlreadyWritten {
            attribute: "iterationEncoding"
        })
    ));
    assert!(matches!(
        series.set_iteration_format("/data/%T/"),
        Err(SeriesError::AlreadyWritten {
            attribute: "iterationFormat"
        })
    ));
    assert!(matches!(
        series.set_name("other"),
        Err(SeriesError::AlreadyWritten { attribute: "name" })
    ));
    assert!(series.set_base_path("/data/%T/").is_ok());
    assert!(matches!(
        series.set_base_path("/other/%T/"),
        Err(SeriesError::AlreadyWritten {
            attribute: "basePath"
        })
    ));
    assert!(!series.dirty());
    Ok(())
}

#[test]
fn test_custom_base_path_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;
    assert!(matches!(
        series.set_base_path("/custom/%T/"),
        Err(SeriesError::CustomBasePath)
    ));
    assert_eq!(series.base_path()?, "/data/%T/");
    Ok(())
}

#[test]
fn test_legacy_iteration_format_must_match_base_path() -> Result<(), Box<dyn std::error::Error>>
{
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;
    series.set_open_pmd("1.0.0");
    let err = series.set_iteration_format("/other/%T/").unwrap_err();
    assert!(matches!(err, SeriesError::IterationFormatMismatch { .. }));
    series.set_iteration_format("/data/%T/")?;

    series.set_open_pmd("1.1.0");
    series.set_iteration_format("/other/%T/")?;
    assert_eq!(series.iteration_format()?, "/other/%T/");
    Ok(())
}

#[test]
fn test_meshes_path_guard() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;
    series.flush()?;
    assert!(!series.dirty());

    series.set_meshes_path("fields")?;
    assert_eq!(series.meshes_path()?.as_deref(), Some("fields/"));
    assert!(series.dirty());
    series.set_particles_path("species/")?;
    assert_eq!(series.particles_path()?.as_deref(), Some("species/"));

    series
        .iterations_mut()
        .get_or_create(0)
        .meshes_mut()
        .set_attribute("comment", "fields");
    series.flush()?;
    assert!(series.iterations().get(0).ok_or("missing iteration")?.meshes().written());

    assert!(matches!(
        series.set_meshes_path("meshes"),
        Err(SeriesError::AlreadyWritten {
            attribute: "meshesPath"
        })
    ));
    // no particle group was written
    series.set_particles_path("particles")?;
    Ok(())
}

#[test]
fn test_reserved_attributes() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;
    assert!(matches!(
        series.set_attribute("basePath", "/x/"),
        Err(SeriesError::ReservedAttribute(name)) if name == "basePath"
    ));
    assert!(matches!(
        series.delete_attribute("iterationEncoding"),
        Err(SeriesError::ReservedAttribute(_))
    ));
    series.set_attribute("comment", "generic")?;
    assert_eq!(
        series.get_attribute("comment"),
        Some(&Attribute::from("generic"))
    );
    Ok(())
}

#[test]
fn test_group_based_round_trip() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = path(&dir, "run.json");
    {
        let mut series = Series::new(&file, AccessType::Create)?;
        series.set_author("Jane Doe").set_software("openpmd");
        for index in [0u64, 10] {
            series
                .iterations_mut()
                .get_or_create(index)
                .set_time(index as f64 * 0.5);
        }
        series
            .iterations_mut()
            .get_or_create(10)
            .meshes_mut()
            .set_attribute("gridUnitSI", 1.0f64);
        series.close()?;
    }

    let series = Series::new(&file, AccessType::ReadOnly)?;
    assert!(series.written());
    assert!(!series.dirty());
    assert_eq!(series.iteration_encoding(), IterationEncoding::GroupBased);
    assert_eq!(series.open_pmd()?, "1.1.0");
    assert_eq!(series.base_path()?, "/data/%T/");
    assert_eq!(series.meshes_path()?.as_deref(), Some("meshes/"));
    assert_eq!(series.author()?.as_deref(), Some("Jane Doe"));
    assert_eq!(series.software()?.as_deref(), Some("openpmd"));

    let iterations = series.iterations();
    assert_eq!(iterations.keys().collect::<Vec<_>>(), vec![0, 10]);
    let it = iterations.get(10).ok_or("missing iteration")?;
    assert_eq!(it.time()?, 5.0);
    assert!(it.written());
    assert!(!it.dirty());
    assert!(it.meshes().written());
    assert_eq!(
        it.meshes().get_attribute("gridUnitSI"),
        Some(&Attribute::from(1.0f64))
    );
    assert!(!iterations.get(0).ok_or("missing iteration")?.meshes().written());
    Ok(())
}

#[test]
fn test_read_write_appends_iteration() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = path(&dir, "run.json");
    {
        let mut series = Series::new(&file, AccessType::Create)?;
        series.iterations_mut().get_or_create(1);
        series.close()?;
    }
    {
        let mut series = Series::new(&file, AccessType::ReadWrite)?;
        series.iterations_mut().get_or_create(2).set_dt(0.25);
        series.set_machine("cluster");
        series.close()?;
    }

    let series = Series::new(&file, AccessType::ReadOnly)?;
    assert_eq!(series.iterations().keys().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(
        series.iterations().get(2).ok_or("missing iteration")?.dt()?,
        0.25
    );
    assert_eq!(series.machine()?.as_deref(), Some("cluster"));
    Ok(())
}

#[test]
fn test_delete_attribute_reaches_storage() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = path(&dir, "run.json");
    {
        let mut series = Series::new(&file, AccessType::Create)?;
        series.set_attribute("comment", "temporary")?;
        series.flush()?;
        assert!(series.delete_attribute("comment")?.is_some());
        assert!(series.dirty());
        series.close()?;
    }
    let series = Series::new(&file, AccessType::ReadOnly)?;
    assert!(series.get_attribute("comment").is_none());
    Ok(())
}

#[test]
fn test_unknown_version_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = path(&dir, "run.json");
    let mut series = Series::new(&file, AccessType::Create)?;
    series.set_open_pmd("2.0.0");
    series.close()?;

    let err = Series::new(&file, AccessType::ReadOnly).unwrap_err();
    assert!(matches!(&err, SeriesError::UnknownVersion(v) if v == "2.0.0"));
    assert_eq!(err.to_string(), "Unknown openPMD version - 2.0.0");
    Ok(())
}

#[test]
fn test_unexpected_datatype_is_fatal() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = path(&dir, "run.json");
    Series::new(&file, AccessType::Create)?.close()?;

    let stored = dir.path().join("run.json");
    let mut document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&stored)?)?;
    document["attributes"]["openPMDextension"] =
        serde_json::json!({ "datatype": "UINT64", "value": 0 });
    std::fs::write(&stored, serde_json::to_string(&document)?)?;

    let err = Series::new(&file, AccessType::ReadOnly).unwrap_err();
    assert!(matches!(
        err,
        SeriesError::UnexpectedDatatype {
            expected: crate::attribute::Datatype::Uint32,
            found: crate::attribute::Datatype::Uint64,
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::Io);
    Ok(())
}

#[test]
fn test_stored_encoding_wins() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run%T.json"), AccessType::Create)?;
    series.iterations_mut().get_or_create(3);
    series.close()?;

    let series = Series::new(&path(&dir, "run3.json"), AccessType::ReadOnly)?;
    assert_eq!(series.iteration_encoding(), IterationEncoding::FileBased);
    assert_eq!(series.iteration_format()?, "run%T");
    assert_eq!(series.iterations().keys().collect::<Vec<_>>(), vec![3]);
    Ok(())
}

#[test]
fn test_missing_file_name() {
    let err = Series::new("some/dir/", AccessType::Create).unwrap_err();
    assert!(matches!(err, SeriesError::InvalidPath(_)));
}

#[test]
fn test_unknown_extension_is_noop() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.txt"), AccessType::Create)?;
    assert_eq!(series.format(), Format::Dummy);
    assert_eq!(series.backend_kind(), BackendKind::Dummy);
    series.iterations_mut().get_or_create(0);
    series.flush()?;
    assert!(series.written());
    assert_eq!(std::fs::read_dir(dir.path())?.count(), 0);
    Ok(())
}

#[test]
fn test_read_only_flush_is_noop() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = path(&dir, "run.json");
    Series::new(&file, AccessType::Create)?.close()?;
    let before = std::fs::read_to_string(dir.path().join("run.json"))?;

    let mut series = Series::new(&file, AccessType::ReadOnly)?;
    series.set_author("ignored");
    series.flush()?;
    drop(series);
    assert_eq!(std::fs::read_to_string(dir.path().join("run.json"))?, before);
    Ok(())
}

#[test]
fn test_written_iteration_can_not_be_removed() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let mut series = Series::new(&path(&dir, "run.json"), AccessType::Create)?;
    series.iterations_mut().get_or_create(0);
    series.iterations_mut().get_or_create(1);
    series.flush()?;
    series.iterations_mut().get_or_create(2);

    assert!(series.iterations_mut().remove(2)?.is_some());
    assert!(matches!(
        series.iterations_mut().remove(0),
        Err(SeriesError::IterationWritten { index: 0 })
    ));
    Ok(())
}
