use std::fmt;

/// How a series is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// Create a new series, truncating existing files
    Create,
    /// Read an existing series; no operation may modify storage
    ReadOnly,
    /// Read an existing series and allow further writes
    ReadWrite,
}

impl AccessType {
    /// Whether flushes may touch storage under this access mode
    pub fn is_writable(&self) -> bool {
        matches!(self, AccessType::Create | AccessType::ReadWrite)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessType::Create => "CREATE",
            AccessType::ReadOnly => "READ_ONLY",
            AccessType::ReadWrite => "READ_WRITE",
        };
        f.write_str(name)
    }
}

/// Storage format of a series, derived from the file name extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// HDF5 (`.h5`)
    Hdf5,
    /// ADIOS1 (`.bp`)
    Adios1,
    /// ADIOS2 (`.bp`)
    Adios2,
    /// JSON reference backend (`.json`)
    Json,
    /// No storage at all; every operation is a no-op
    Dummy,
}

impl Format {
    /// File name extension belonging to this format, including the dot
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            Format::Hdf5 => Some(".h5"),
            Format::Adios1 | Format::Adios2 => Some(".bp"),
            Format::Json => Some(".json"),
            Format::Dummy => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Format::Hdf5 => "HDF5",
            Format::Adios1 => "ADIOS1",
            Format::Adios2 => "ADIOS2",
            Format::Json => "JSON",
            Format::Dummy => "DUMMY",
        };
        f.write_str(name)
    }
}
