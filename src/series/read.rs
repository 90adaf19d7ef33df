use crate::attribute::{Attribute, Datatype};
use crate::io::{IOTask, Operation, Slot};
use crate::iteration::RecordScope;

use super::{matcher, IterationEncoding, Series, SeriesError, ITERATION_PLACEHOLDER, KNOWN_VERSIONS};

impl Series {
    /// Read every file of a file-based series in ascending iteration order
    pub(super) fn read_file_based(&mut self) -> Result<(), SeriesError> {
        let directory = self.handler.directory().to_path_buf();
        if !directory.is_dir() {
            return Err(SeriesError::DirectoryNotFound(directory));
        }

        let pattern = matcher(&self.name, self.format);
        let mut files: Vec<(u64, String)> = Vec::new();
        for entry in std::fs::read_dir(&directory)? {
            let file = entry?.file_name().to_string_lossy().into_owned();
            match pattern.iteration_of(&file) {
                Some(index) => files.push((index, file)),
                None if pattern.matches(&file) => log::warn!(
                    "Skipping {}: iteration index does not fit into 64 bits",
                    file
                ),
                None => {}
            }
        }
        files.sort();
        log::debug!(
            "Found {} files of series '{}' in {}",
            files.len(),
            self.name,
            directory.display()
        );

        for (_, file) in files {
            self.handler.run(IOTask::new(
                self.attributable.writable_ref(),
                Operation::OpenFile { name: file },
            ))?;
            self.attributable.state_mut().reopen();

            self.read_base()?;
            self.read_encoding(IterationEncoding::FileBased)?;
            self.read_hierarchy()?;
        }

        if self.iterations.is_empty() {
            return Err(SeriesError::NoMatchingIterations(self.name.clone()));
        }
        self.iterations.state_mut().mark_synced();
        self.attributable.state_mut().mark_synced();
        Ok(())
    }

    /// Read the single file of a group-based series
    pub(super) fn read_group_based(&mut self) -> Result<(), SeriesError> {
        self.handler.run(IOTask::new(
            self.attributable.writable_ref(),
            Operation::OpenFile {
                name: self.name.clone(),
            },
        ))?;
        self.attributable.state_mut().reopen();

        self.read_base()?;
        self.read_encoding(IterationEncoding::GroupBased)?;

        // storage is authoritative for an opened file
        self.iterations.clear_unchecked();
        self.read_hierarchy()?;

        self.iterations.state_mut().mark_synced();
        self.attributable.state_mut().mark_synced();
        Ok(())
    }

    /// Read one attribute of the series, insisting on its datatype
    fn read_typed(&mut self, name: &str, expected: Datatype) -> Result<Attribute, SeriesError> {
        let slot = Slot::new();
        self.handler.run(IOTask::new(
            self.attributable.writable_ref(),
            Operation::ReadAtt {
                name: name.to_string(),
                attribute: slot.clone(),
            },
        ))?;
        let attribute = slot
            .take()
            .ok_or_else(|| SeriesError::MissingAttribute(name.to_string()))?;
        if attribute.dtype() != expected {
            return Err(SeriesError::UnexpectedDatatype {
                attribute: name.to_string(),
                expected,
                found: attribute.dtype(),
            });
        }
        Ok(attribute)
    }

    fn read_string(&mut self, name: &str) -> Result<String, SeriesError> {
        Ok(self.read_typed(name, Datatype::String)?.into_value()?)
    }

    /// Mandatory attributes plus the optional record paths
    fn read_base(&mut self) -> Result<(), SeriesError> {
        let version = self.read_string("openPMD")?;
        self.set_open_pmd(&version);

        let extension: u32 = self.read_typed("openPMDextension", Datatype::Uint32)?.into_value()?;
        self.set_open_pmd_extension(extension);

        let base_path = self.read_string("basePath")?;
        self.attributable.set_attribute("basePath", base_path);

        let listed = Slot::new();
        self.handler.run(IOTask::new(
            self.attributable.writable_ref(),
            Operation::ListAtts {
                attributes: listed.clone(),
            },
        ))?;
        let listed = listed.take().unwrap_or_default();

        if listed.iter().any(|a| a == "meshesPath") {
            let path = self.read_string("meshesPath")?;
            let snapshot = self.iterations.mark_unwritten_for(RecordScope::Meshes);
            let result = self.set_meshes_path(&path).map(|_| ());
            self.iterations.restore(snapshot);
            result?;
        }
        if listed.iter().any(|a| a == "particlesPath") {
            let path = self.read_string("particlesPath")?;
            let snapshot = self.iterations.mark_unwritten_for(RecordScope::Particles);
            let result = self.set_particles_path(&path).map(|_| ());
            self.iterations.restore(snapshot);
            result?;
        }
        Ok(())
    }

    /// Adopt the stored encoding and iteration format
    fn read_encoding(&mut self, guessed: IterationEncoding) -> Result<(), SeriesError> {
        let stored = self.read_string("iterationEncoding")?;
        let encoding: IterationEncoding = stored.parse()?;
        if encoding != guessed {
            log::warn!(
                "Series '{}' was opened as {} but the file is {}; using {}",
                self.name,
                guessed,
                encoding,
                encoding
            );
        }
        self.iteration_encoding = encoding;
        self.attributable
            .set_attribute("iterationEncoding", encoding.as_str());

        let format = self.read_string("iterationFormat")?;
        self.set_iteration_format(&format)?;
        Ok(())
    }

    /// Base path group, its iterations and the series attributes
    fn read_hierarchy(&mut self) -> Result<(), SeriesError> {
        let version = self.open_pmd()?;
        if !KNOWN_VERSIONS.contains(&version.as_str()) {
            return Err(SeriesError::UnknownVersion(version));
        }
        let path = self
            .base_path()?
            .replacen(&format!("/{}/", ITERATION_PLACEHOLDER), "", 1);

        self.handler.run(self.iterations.open_path(&path))?;
        self.iterations.read_attributes(&mut self.handler)?;

        let paths = self.record_paths()?;
        for child in self.iterations.list_paths(&mut self.handler)? {
            let index: u64 = child
                .parse()
                .map_err(|_| SeriesError::InvalidIterationIndex(child.clone()))?;
            let iteration = self.iterations.get_or_create(index);
            self.handler.run(iteration.open_path(&child))?;
            iteration.read(&mut self.handler, &paths)?;
        }

        self.attributable.read_attributes(&mut self.handler)?;
        Ok(())
    }
}
