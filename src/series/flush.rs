use crate::io::{IOTask, Operation};
use crate::iteration::RecordScope;

use super::{IterationEncoding, Series, SeriesError};

impl Series {
    /// Write everything unwritten or dirty to storage
    ///
    /// Read-only series never touch storage. A failure aborts the flush;
    /// objects keep the state they reached before it, so a later flush
    /// resumes where this one stopped.
    pub fn flush(&mut self) -> Result<(), SeriesError> {
        if !self.handler.access().is_writable() {
            return Ok(());
        }
        self.ensure_record_paths()?;
        match self.iteration_encoding {
            IterationEncoding::FileBased => self.flush_file_based(),
            IterationEncoding::GroupBased => self.flush_group_based(),
        }
    }

    /// Record populated groups under their default paths
    fn ensure_record_paths(&mut self) -> Result<(), SeriesError> {
        if self.meshes_path()?.is_none() && self.iterations.any_populated(RecordScope::Meshes) {
            self.set_meshes_path(crate::iteration::DEFAULT_MESHES_PATH)?;
        }
        if self.particles_path()?.is_none()
            && self.iterations.any_populated(RecordScope::Particles)
        {
            self.set_particles_path(crate::iteration::DEFAULT_PARTICLES_PATH)?;
        }
        Ok(())
    }

    fn flush_file_based(&mut self) -> Result<(), SeriesError> {
        if self.iterations.is_empty() {
            return Err(SeriesError::NoIterations);
        }
        let path = self.container_path()?;
        let paths = self.record_paths()?;
        self.iterations.flush_file_based(
            &mut self.attributable,
            &mut self.handler,
            &self.name,
            &path,
            &paths,
        )?;
        Ok(())
    }

    fn flush_group_based(&mut self) -> Result<(), SeriesError> {
        if !self.written() {
            self.handler.run(IOTask::new(
                self.attributable.writable_ref(),
                Operation::CreateFile {
                    name: self.name.clone(),
                },
            ))?;
            self.attributable.state_mut().mark_written();
        }

        let path = self.container_path()?;
        let paths = self.record_paths()?;
        self.iterations
            .flush_group_based(&mut self.handler, &path, &paths)?;
        self.attributable.flush_attributes(&mut self.handler)?;
        Ok(())
    }
}
