//! Iterations and the container holding them.
//!
//! An [`Iteration`] is one snapshot of a series. Its mesh and particle
//! hierarchies are represented by [`RecordGroup`]s, which only carry
//! attributes and the written/dirty lifecycle; record data is handled
//! elsewhere. [`Iterations`] maps iteration indices to iterations in
//! ascending order and is itself a persistable object (the base path group).

use std::collections::BTreeMap;

use crate::attributable::{Attributable, Attributes, WritableId, WriteState};
use crate::attribute::AttributeError;
use crate::io::{HandlerError, IOHandler, IOTask, Operation, Slot};
use crate::series::{SeriesError, ITERATION_PLACEHOLDER};

/// Default group of mesh records below an iteration
pub const DEFAULT_MESHES_PATH: &str = "meshes/";
/// Default group of particle species below an iteration
pub const DEFAULT_PARTICLES_PATH: &str = "particles/";

/// Relative paths of the record groups inside every iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPaths {
    /// Path of the meshes group, ending in `/`
    pub meshes: String,
    /// Path of the particles group, ending in `/`
    pub particles: String,
}

impl Default for RecordPaths {
    fn default() -> Self {
        Self {
            meshes: DEFAULT_MESHES_PATH.to_string(),
            particles: DEFAULT_PARTICLES_PATH.to_string(),
        }
    }
}

/// Which record group of every iteration a temporary override applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordScope {
    /// The `meshes` groups
    Meshes,
    /// The `particles` groups
    Particles,
}

/// Written flags of one record group per iteration, taken before an override
///
/// Handed back to [`Iterations::restore`] to undo
/// [`Iterations::mark_unwritten_for`].
#[derive(Debug)]
#[must_use = "an override must be restored"]
pub struct WrittenSnapshot {
    scope: RecordScope,
    written: Vec<(u64, bool)>,
}

/// The meshes or particles group of one iteration
#[derive(Debug, Clone)]
pub struct RecordGroup {
    attributable: Attributable,
}

impl RecordGroup {
    fn new(parent: WritableId) -> Self {
        Self {
            attributable: Attributable::new(Some(parent)),
        }
    }

    /// Whether the group holds anything worth writing
    pub fn is_empty(&self) -> bool {
        self.attributable.num_attributes() == 0
    }

    fn flush(&mut self, handler: &mut IOHandler, path: &str) -> Result<(), HandlerError> {
        if self.is_empty() && !self.written() {
            return Ok(());
        }
        if !self.written() {
            handler.run(IOTask::new(
                self.attributable.writable_ref(),
                Operation::CreatePath {
                    path: path.to_string(),
                },
            ))?;
            self.attributable.state_mut().mark_written();
        }
        self.attributable.flush_attributes(handler)
    }

    fn read(&mut self, handler: &mut IOHandler, path: &str) -> Result<(), HandlerError> {
        handler.run(IOTask::new(
            self.attributable.writable_ref(),
            Operation::OpenPath {
                path: path.to_string(),
            },
        ))?;
        self.attributable.read_attributes(handler)?;
        self.attributable.state_mut().mark_synced();
        Ok(())
    }
}

impl Attributes for RecordGroup {
    fn attributable(&self) -> &Attributable {
        &self.attributable
    }

    fn attributable_mut(&mut self) -> &mut Attributable {
        &mut self.attributable
    }
}

/// One snapshot of a series
#[derive(Debug, Clone)]
pub struct Iteration {
    attributable: Attributable,
    meshes: RecordGroup,
    particles: RecordGroup,
}

impl Iteration {
    fn new(container: WritableId) -> Self {
        let mut attributable = Attributable::new(Some(container));
        attributable.set_attribute("time", 0.0f64);
        attributable.set_attribute("dt", 1.0f64);
        attributable.set_attribute("timeUnitSI", 1.0f64);
        let id = attributable.id();
        Self {
            attributable,
            meshes: RecordGroup::new(id),
            particles: RecordGroup::new(id),
        }
    }

    fn float_attribute(&self, name: &str) -> Result<f64, AttributeError> {
        self.attributable
            .get_attribute(name)
            .ok_or_else(|| AttributeError::Missing(name.to_string()))?
            .get::<f64>()
    }

    /// Simulation time of this iteration, in units of `timeUnitSI`
    pub fn time(&self) -> Result<f64, AttributeError> {
        self.float_attribute("time")
    }

    /// Set the simulation time
    pub fn set_time(&mut self, time: f64) -> &mut Self {
        self.attributable.set_attribute("time", time);
        self
    }

    /// Time step used to reach this iteration
    pub fn dt(&self) -> Result<f64, AttributeError> {
        self.float_attribute("dt")
    }

    /// Set the time step
    pub fn set_dt(&mut self, dt: f64) -> &mut Self {
        self.attributable.set_attribute("dt", dt);
        self
    }

    /// Conversion factor from `time` and `dt` to seconds
    pub fn time_unit_si(&self) -> Result<f64, AttributeError> {
        self.float_attribute("timeUnitSI")
    }

    /// Set the conversion factor to seconds
    pub fn set_time_unit_si(&mut self, unit: f64) -> &mut Self {
        self.attributable.set_attribute("timeUnitSI", unit);
        self
    }

    /// Mesh records of this iteration
    pub fn meshes(&self) -> &RecordGroup {
        &self.meshes
    }

    /// Mesh records of this iteration, mutably
    pub fn meshes_mut(&mut self) -> &mut RecordGroup {
        &mut self.meshes
    }

    /// Particle species of this iteration
    pub fn particles(&self) -> &RecordGroup {
        &self.particles
    }

    /// Particle species of this iteration, mutably
    pub fn particles_mut(&mut self) -> &mut RecordGroup {
        &mut self.particles
    }

    fn group(&mut self, scope: RecordScope) -> &mut RecordGroup {
        match scope {
            RecordScope::Meshes => &mut self.meshes,
            RecordScope::Particles => &mut self.particles,
        }
    }

    pub(crate) fn create_path(&self, path: &str) -> IOTask {
        IOTask::new(
            self.attributable.writable_ref(),
            Operation::CreatePath {
                path: path.to_string(),
            },
        )
    }

    pub(crate) fn open_path(&self, path: &str) -> IOTask {
        IOTask::new(
            self.attributable.writable_ref(),
            Operation::OpenPath {
                path: path.to_string(),
            },
        )
    }

    pub(crate) fn state_mut(&mut self) -> &mut WriteState {
        self.attributable.state_mut()
    }

    /// Flush inside the single file of a group-based series
    pub(crate) fn flush_group_based(
        &mut self,
        index: u64,
        handler: &mut IOHandler,
        paths: &RecordPaths,
    ) -> Result<(), HandlerError> {
        if !self.written() {
            handler.run(self.create_path(&index.to_string()))?;
            self.attributable.state_mut().mark_written();
        }
        self.flush(handler, paths)
    }

    /// Flush record groups, then the iteration's own attributes
    pub(crate) fn flush(
        &mut self,
        handler: &mut IOHandler,
        paths: &RecordPaths,
    ) -> Result<(), HandlerError> {
        self.meshes.flush(handler, &paths.meshes)?;
        self.particles.flush(handler, &paths.particles)?;
        self.attributable.flush_attributes(handler)
    }

    /// Read an iteration whose group was just opened
    pub(crate) fn read(
        &mut self,
        handler: &mut IOHandler,
        paths: &RecordPaths,
    ) -> Result<(), HandlerError> {
        self.attributable.read_attributes(handler)?;

        let children = Slot::new();
        handler.run(IOTask::new(
            self.attributable.writable_ref(),
            Operation::ListPaths {
                paths: children.clone(),
            },
        ))?;
        let children = children.take().unwrap_or_default();
        let listed = |path: &str| {
            let path = path.trim_end_matches('/');
            children.iter().any(|child| child == path)
        };

        if listed(&paths.meshes) {
            self.meshes.read(handler, &paths.meshes)?;
        }
        if listed(&paths.particles) {
            self.particles.read(handler, &paths.particles)?;
        }
        self.attributable.state_mut().mark_synced();
        Ok(())
    }
}

impl Attributes for Iteration {
    fn attributable(&self) -> &Attributable {
        &self.attributable
    }

    fn attributable_mut(&mut self) -> &mut Attributable {
        &mut self.attributable
    }
}

/// Ordered map from iteration index to [`Iteration`]
#[derive(Debug, Clone)]
pub struct Iterations {
    attributable: Attributable,
    entries: BTreeMap<u64, Iteration>,
}

impl Iterations {
    pub(crate) fn new(series: WritableId) -> Self {
        Self {
            attributable: Attributable::new(Some(series)),
            entries: BTreeMap::new(),
        }
    }

    /// Iteration with the given index
    pub fn get(&self, index: u64) -> Option<&Iteration> {
        self.entries.get(&index)
    }

    /// Iteration with the given index, mutably
    pub fn get_mut(&mut self, index: u64) -> Option<&mut Iteration> {
        self.entries.get_mut(&index)
    }

    /// Iteration with the given index, created on first access
    pub fn get_or_create(&mut self, index: u64) -> &mut Iteration {
        let container = self.attributable.id();
        self.entries
            .entry(index)
            .or_insert_with(|| Iteration::new(container))
    }

    /// Whether an iteration with this index exists
    pub fn contains(&self, index: u64) -> bool {
        self.entries.contains_key(&index)
    }

    /// Number of iterations
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether there are no iterations
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iteration indices in ascending order
    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    /// Iterations in ascending index order
    pub fn iter(&self) -> impl Iterator<Item = (u64, &Iteration)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    /// Iterations in ascending index order, mutably
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (u64, &mut Iteration)> {
        self.entries.iter_mut().map(|(k, v)| (*k, v))
    }

    /// Remove an iteration that has not been written yet
    pub fn remove(&mut self, index: u64) -> Result<Option<Iteration>, SeriesError> {
        match self.entries.get(&index) {
            Some(iteration) if iteration.written() => Err(SeriesError::IterationWritten { index }),
            _ => Ok(self.entries.remove(&index)),
        }
    }

    /// Drop every iteration regardless of its state
    pub(crate) fn clear_unchecked(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn any_written(&self, scope: RecordScope) -> bool {
        self.entries.values().any(|it| match scope {
            RecordScope::Meshes => it.meshes.written(),
            RecordScope::Particles => it.particles.written(),
        })
    }

    pub(crate) fn any_populated(&self, scope: RecordScope) -> bool {
        self.entries.values().any(|it| match scope {
            RecordScope::Meshes => !it.meshes.is_empty(),
            RecordScope::Particles => !it.particles.is_empty(),
        })
    }

    /// Mark one record group of every iteration unwritten until restored
    pub fn mark_unwritten_for(&mut self, scope: RecordScope) -> WrittenSnapshot {
        let written = self
            .entries
            .iter_mut()
            .map(|(index, it)| {
                let state = it.group(scope).attributable.state_mut();
                let was = state.written();
                state.reopen();
                (*index, was)
            })
            .collect();
        WrittenSnapshot { scope, written }
    }

    /// Put back the written flags captured by [`mark_unwritten_for`](Self::mark_unwritten_for)
    pub fn restore(&mut self, snapshot: WrittenSnapshot) {
        for (index, was) in snapshot.written {
            if let Some(it) = self.entries.get_mut(&index) {
                it.group(snapshot.scope)
                    .attributable
                    .state_mut()
                    .set_written(was);
            }
        }
    }

    pub(crate) fn state_mut(&mut self) -> &mut WriteState {
        self.attributable.state_mut()
    }

    pub(crate) fn create_path(&self, path: &str) -> IOTask {
        IOTask::new(
            self.attributable.writable_ref(),
            Operation::CreatePath {
                path: path.to_string(),
            },
        )
    }

    pub(crate) fn open_path(&self, path: &str) -> IOTask {
        IOTask::new(
            self.attributable.writable_ref(),
            Operation::OpenPath {
                path: path.to_string(),
            },
        )
    }

    /// List the iteration groups below the opened base path
    pub(crate) fn list_paths(&self, handler: &mut IOHandler) -> Result<Vec<String>, HandlerError> {
        let paths = Slot::new();
        handler.run(IOTask::new(
            self.attributable.writable_ref(),
            Operation::ListPaths {
                paths: paths.clone(),
            },
        ))?;
        Ok(paths.take().unwrap_or_default())
    }

    pub(crate) fn read_attributes(&mut self, handler: &mut IOHandler) -> Result<(), HandlerError> {
        self.attributable.read_attributes(handler)
    }

    /// Group-based flush: the base path group, then every iteration in order
    pub(crate) fn flush_group_based(
        &mut self,
        handler: &mut IOHandler,
        path: &str,
        paths: &RecordPaths,
    ) -> Result<(), HandlerError> {
        if !self.written() {
            handler.run(self.create_path(path))?;
            self.attributable.state_mut().mark_written();
        }
        self.attributable.flush_attributes(handler)?;

        for (index, iteration) in self.entries.iter_mut() {
            iteration.flush_group_based(*index, handler, paths)?;
        }
        Ok(())
    }

    /// File-based flush: every iteration materializes its own file
    ///
    /// The series and this container exist once per file, so both are treated
    /// as unwritten for every iteration file. A newly created file always
    /// receives their full attribute set; files written earlier are only
    /// rewritten if either was dirty when the flush started.
    pub(crate) fn flush_file_based(
        &mut self,
        series: &mut Attributable,
        handler: &mut IOHandler,
        name: &str,
        path: &str,
        paths: &RecordPaths,
    ) -> Result<(), HandlerError> {
        let series_dirty = series.state().dirty();
        let container_dirty = self.attributable.state().dirty();

        for (index, iteration) in self.entries.iter_mut() {
            series.state_mut().reopen();
            self.attributable.state_mut().reopen();

            let file = name.replacen(ITERATION_PLACEHOLDER, &index.to_string(), 1);
            let new_file = !iteration.written();
            if new_file {
                handler.enqueue(IOTask::new(
                    series.writable_ref(),
                    Operation::CreateFile { name: file },
                ));
                handler.enqueue(IOTask::new(
                    self.attributable.writable_ref(),
                    Operation::CreatePath {
                        path: path.to_string(),
                    },
                ));
                handler.enqueue(iteration.create_path(&index.to_string()));
                handler.flush().wait()?;
                iteration.state_mut().mark_written();
            } else if series_dirty || container_dirty {
                handler.enqueue(IOTask::new(
                    series.writable_ref(),
                    Operation::OpenFile { name: file },
                ));
                handler.enqueue(IOTask::new(
                    self.attributable.writable_ref(),
                    Operation::OpenPath {
                        path: path.to_string(),
                    },
                ));
                handler.flush().wait()?;
            }
            series.state_mut().mark_written();
            self.attributable.state_mut().mark_written();

            iteration.flush(handler, paths)?;

            if new_file || container_dirty {
                self.attributable.write_attributes(handler)?;
            }
            if new_file || series_dirty {
                series.write_attributes(handler)?;
            }
        }

        self.attributable.commit_attributes();
        series.commit_attributes();
        Ok(())
    }
}

impl Attributes for Iterations {
    fn attributable(&self) -> &Attributable {
        &self.attributable
    }

    fn attributable_mut(&mut self) -> &mut Attributable {
        &mut self.attributable
    }
}
