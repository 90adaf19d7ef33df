//! Series-level attribute accessors and their guards.

use crate::attribute::{Attribute, AttributeType};
use crate::iteration::{RecordPaths, RecordScope};

use super::{
    IterationEncoding, Series, SeriesError, BASE_PATH, ITERATION_PLACEHOLDER, KNOWN_VERSIONS,
    LEGACY_VERSIONS,
};

/// Attributes that may only change through their dedicated setters
const RESERVED: [&str; 7] = [
    "openPMD",
    "openPMDextension",
    "basePath",
    "meshesPath",
    "particlesPath",
    "iterationEncoding",
    "iterationFormat",
];

fn with_separator(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{}/", path)
    }
}

impl Series {
    fn required<T: AttributeType + Clone>(&self, name: &str) -> Result<T, SeriesError> {
        self.attributable
            .get_attribute(name)
            .ok_or_else(|| SeriesError::MissingAttribute(name.to_string()))?
            .get::<T>()
            .map_err(SeriesError::from)
    }

    fn optional<T: AttributeType + Clone>(&self, name: &str) -> Result<Option<T>, SeriesError> {
        self.attributable
            .get_attribute(name)
            .map(|a| a.get::<T>())
            .transpose()
            .map_err(SeriesError::from)
    }

    /// Set a generic attribute
    ///
    /// Structural attributes are rejected here; use their setters.
    pub fn set_attribute(
        &mut self,
        name: &str,
        value: impl Into<Attribute>,
    ) -> Result<&mut Self, SeriesError> {
        if RESERVED.contains(&name) {
            return Err(SeriesError::ReservedAttribute(name.to_string()));
        }
        self.attributable.set_attribute(name, value);
        Ok(self)
    }

    /// Look up any series-level attribute
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributable.get_attribute(name)
    }

    /// Remove a generic attribute
    pub fn delete_attribute(&mut self, name: &str) -> Result<Option<Attribute>, SeriesError> {
        if RESERVED.contains(&name) {
            return Err(SeriesError::ReservedAttribute(name.to_string()));
        }
        Ok(self.attributable.delete_attribute(name))
    }

    /// openPMD standard version
    pub fn open_pmd(&self) -> Result<String, SeriesError> {
        self.required("openPMD")
    }

    /// Set the openPMD standard version
    pub fn set_open_pmd(&mut self, version: &str) -> &mut Self {
        self.attributable.set_attribute("openPMD", version);
        self
    }

    /// Bitmask of applied openPMD extensions
    pub fn open_pmd_extension(&self) -> Result<u32, SeriesError> {
        self.required("openPMDextension")
    }

    /// Set the bitmask of applied openPMD extensions
    pub fn set_open_pmd_extension(&mut self, extension: u32) -> &mut Self {
        self.attributable.set_attribute("openPMDextension", extension);
        self
    }

    /// Path template below which iterations live
    pub fn base_path(&self) -> Result<String, SeriesError> {
        self.required("basePath")
    }

    /// Set the base path template
    ///
    /// Every known version fixes the base path to `/data/%T/`, so only that
    /// value is accepted, and only before the series is written.
    pub fn set_base_path(&mut self, base_path: &str) -> Result<&mut Self, SeriesError> {
        if self.base_path().ok().as_deref() == Some(base_path) {
            return Ok(self);
        }
        if self.written() {
            return Err(SeriesError::AlreadyWritten {
                attribute: "basePath",
            });
        }
        let version = self.open_pmd()?;
        if KNOWN_VERSIONS.contains(&version.as_str()) {
            return Err(SeriesError::CustomBasePath);
        }
        self.attributable.set_attribute("basePath", base_path);
        Ok(self)
    }

    /// Path of the meshes group inside every iteration
    pub fn meshes_path(&self) -> Result<Option<String>, SeriesError> {
        self.optional("meshesPath")
    }

    /// Set the meshes path; a trailing `/` is appended when missing
    pub fn set_meshes_path(&mut self, path: &str) -> Result<&mut Self, SeriesError> {
        if self.iterations.any_written(RecordScope::Meshes) {
            return Err(SeriesError::AlreadyWritten {
                attribute: "meshesPath",
            });
        }
        self.attributable
            .set_attribute("meshesPath", with_separator(path));
        Ok(self)
    }

    /// Path of the particles group inside every iteration
    pub fn particles_path(&self) -> Result<Option<String>, SeriesError> {
        self.optional("particlesPath")
    }

    /// Set the particles path; a trailing `/` is appended when missing
    pub fn set_particles_path(&mut self, path: &str) -> Result<&mut Self, SeriesError> {
        if self.iterations.any_written(RecordScope::Particles) {
            return Err(SeriesError::AlreadyWritten {
                attribute: "particlesPath",
            });
        }
        self.attributable
            .set_attribute("particlesPath", with_separator(path));
        Ok(self)
    }

    /// Author of the data
    pub fn author(&self) -> Result<Option<String>, SeriesError> {
        self.optional("author")
    }

    /// Set the author of the data
    pub fn set_author(&mut self, author: &str) -> &mut Self {
        self.attributable.set_attribute("author", author);
        self
    }

    /// Software that wrote the data
    pub fn software(&self) -> Result<Option<String>, SeriesError> {
        self.optional("software")
    }

    /// Set the software that wrote the data
    pub fn set_software(&mut self, software: &str) -> &mut Self {
        self.attributable.set_attribute("software", software);
        self
    }

    /// Version of the software that wrote the data
    pub fn software_version(&self) -> Result<Option<String>, SeriesError> {
        self.optional("softwareVersion")
    }

    /// Set the version of the software that wrote the data
    pub fn set_software_version(&mut self, version: &str) -> &mut Self {
        self.attributable.set_attribute("softwareVersion", version);
        self
    }

    /// Creation date, `YYYY-MM-DD HH:mm:ss tz`
    pub fn date(&self) -> Result<Option<String>, SeriesError> {
        self.optional("date")
    }

    /// Set the creation date
    pub fn set_date(&mut self, date: &str) -> &mut Self {
        self.attributable.set_attribute("date", date);
        self
    }

    /// Dependencies of the writing software
    pub fn software_dependencies(&self) -> Result<Option<String>, SeriesError> {
        self.optional("softwareDependencies")
    }

    /// Set the dependencies of the writing software
    pub fn set_software_dependencies(&mut self, dependencies: &str) -> &mut Self {
        self.attributable
            .set_attribute("softwareDependencies", dependencies);
        self
    }

    /// Machine the data was written on
    pub fn machine(&self) -> Result<Option<String>, SeriesError> {
        self.optional("machine")
    }

    /// Set the machine the data was written on
    pub fn set_machine(&mut self, machine: &str) -> &mut Self {
        self.attributable.set_attribute("machine", machine);
        self
    }

    /// Expanded template addressing iterations
    pub fn iteration_format(&self) -> Result<String, SeriesError> {
        self.required("iterationFormat")
    }

    /// Change the iteration encoding before the series is written
    ///
    /// File-based encoding uses the series name as iterationFormat,
    /// group-based encoding the base path template.
    pub fn set_iteration_encoding(
        &mut self,
        encoding: IterationEncoding,
    ) -> Result<&mut Self, SeriesError> {
        if self.written() {
            return Err(SeriesError::AlreadyWritten {
                attribute: "iterationEncoding",
            });
        }
        if encoding == IterationEncoding::FileBased && !self.name.contains(ITERATION_PLACEHOLDER) {
            return Err(SeriesError::MissingIterationPlaceholder);
        }
        let format = match encoding {
            IterationEncoding::FileBased => self.name.clone(),
            IterationEncoding::GroupBased => BASE_PATH.to_string(),
        };
        let previous = std::mem::replace(&mut self.iteration_encoding, encoding);
        if let Err(e) = self.set_iteration_format(&format) {
            self.iteration_encoding = previous;
            return Err(e);
        }
        self.attributable
            .set_attribute("iterationEncoding", encoding.as_str());
        Ok(self)
    }

    /// Change the iteration format before the series is written
    pub fn set_iteration_format(&mut self, format: &str) -> Result<&mut Self, SeriesError> {
        if self.written() {
            return Err(SeriesError::AlreadyWritten {
                attribute: "iterationFormat",
            });
        }
        if self.iteration_encoding == IterationEncoding::GroupBased {
            let version = self.open_pmd()?;
            let base_path = self.base_path()?;
            if LEGACY_VERSIONS.contains(&version.as_str()) && base_path != format {
                return Err(SeriesError::IterationFormatMismatch { base_path });
            }
        }
        self.attributable.set_attribute("iterationFormat", format);
        Ok(self)
    }

    /// Rename the series before it is written
    pub fn set_name(&mut self, name: &str) -> Result<&mut Self, SeriesError> {
        if self.written() {
            return Err(SeriesError::AlreadyWritten { attribute: "name" });
        }
        if self.iteration_encoding == IterationEncoding::FileBased
            && !name.contains(ITERATION_PLACEHOLDER)
        {
            return Err(SeriesError::MissingIterationPlaceholder);
        }
        self.name = name.to_string();
        self.attributable.state_mut().touch();
        Ok(self)
    }

    /// Record group paths, falling back to the defaults
    pub(crate) fn record_paths(&self) -> Result<RecordPaths, SeriesError> {
        let defaults = RecordPaths::default();
        Ok(RecordPaths {
            meshes: self.meshes_path()?.unwrap_or(defaults.meshes),
            particles: self.particles_path()?.unwrap_or(defaults.particles),
        })
    }

    /// Group holding all iterations, relative to the file root
    pub(crate) fn container_path(&self) -> Result<String, SeriesError> {
        Ok(self
            .base_path()?
            .replacen(&format!("{}/", ITERATION_PLACEHOLDER), "", 1))
    }
}
