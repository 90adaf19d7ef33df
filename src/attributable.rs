//! Persistable objects: identity, written/dirty lifecycle and attribute store.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::attribute::Attribute;
use crate::io::{HandlerError, IOHandler, IOTask, Operation, Slot, WritableRef};

static NEXT_WRITABLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique handle of a persistable object
///
/// Backends key their bookkeeping (open file, group path) by this id; the
/// object itself is never shared with the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WritableId(u64);

impl WritableId {
    pub(crate) fn next() -> Self {
        Self(NEXT_WRITABLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for WritableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The four states an object moves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Not in storage yet, with changes to write
    UnwrittenDirty,
    /// Not in storage yet, nothing pending
    UnwrittenClean,
    /// In storage and in sync
    WrittenClean,
    /// In storage, with changes to write
    WrittenDirty,
}

/// Written/dirty flags of one object, changed only through named transitions
///
/// `written` means the object's structure exists in storage and structural
/// attributes are frozen. `dirty` means in-memory attributes diverge from the
/// last flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteState {
    written: bool,
    dirty: bool,
}

impl WriteState {
    /// Fresh object: unwritten and dirty
    pub fn new() -> Self {
        Self {
            written: false,
            dirty: true,
        }
    }

    /// Whether the structure exists in storage
    pub fn written(&self) -> bool {
        self.written
    }

    /// Whether attributes need to be flushed
    pub fn dirty(&self) -> bool {
        self.dirty
    }

    /// Current state as one of the four lifecycle states
    pub fn lifecycle(&self) -> Lifecycle {
        match (self.written, self.dirty) {
            (false, true) => Lifecycle::UnwrittenDirty,
            (false, false) => Lifecycle::UnwrittenClean,
            (true, false) => Lifecycle::WrittenClean,
            (true, true) => Lifecycle::WrittenDirty,
        }
    }

    /// In-memory state changed
    pub(crate) fn touch(&mut self) {
        self.dirty = true;
    }

    /// Structure was created or opened in storage
    pub(crate) fn mark_written(&mut self) {
        self.written = true;
    }

    /// Attributes were flushed successfully
    pub(crate) fn mark_flushed(&mut self) {
        self.dirty = false;
    }

    /// A read pass brought the object in sync with storage
    pub(crate) fn mark_synced(&mut self) {
        self.written = true;
        self.dirty = false;
    }

    /// Treat the structure as not yet present, e.g. once per physical file
    pub(crate) fn reopen(&mut self) {
        self.written = false;
    }

    pub(crate) fn set_written(&mut self, written: bool) {
        self.written = written;
    }
}

impl Default for WriteState {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity, lifecycle and attributes of one persistable object
#[derive(Debug, Clone)]
pub struct Attributable {
    id: WritableId,
    parent: Option<WritableId>,
    state: WriteState,
    attributes: BTreeMap<String, Attribute>,
    deleted: Vec<String>,
}

impl Attributable {
    pub(crate) fn new(parent: Option<WritableId>) -> Self {
        Self {
            id: WritableId::next(),
            parent,
            state: WriteState::new(),
            attributes: BTreeMap::new(),
            deleted: Vec::new(),
        }
    }

    /// Handle of this object
    pub fn id(&self) -> WritableId {
        self.id
    }

    /// Handle of the parent object
    pub fn parent(&self) -> Option<WritableId> {
        self.parent
    }

    /// Current written/dirty flags
    pub fn state(&self) -> WriteState {
        self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut WriteState {
        &mut self.state
    }

    pub(crate) fn writable_ref(&self) -> WritableRef {
        WritableRef {
            id: self.id,
            parent: self.parent,
        }
    }

    /// Set an attribute and mark the object dirty
    pub fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Attribute>) {
        let name = name.into();
        self.deleted.retain(|d| *d != name);
        self.attributes.insert(name, value.into());
        self.state.touch();
    }

    /// Look up an attribute
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Whether an attribute is present
    pub fn contains_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Remove an attribute; the removal reaches storage on the next flush
    pub fn delete_attribute(&mut self, name: &str) -> Option<Attribute> {
        let removed = self.attributes.remove(name)?;
        if self.state.written() {
            self.deleted.push(name.to_string());
        }
        self.state.touch();
        Some(removed)
    }

    /// Attribute names in sorted order
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    /// Number of attributes
    pub fn num_attributes(&self) -> usize {
        self.attributes.len()
    }

    /// Store a value read from storage without marking the object dirty
    pub(crate) fn store_attribute(&mut self, name: impl Into<String>, value: Attribute) {
        self.attributes.insert(name.into(), value);
    }

    /// Write every attribute (and pending deletion) without touching the state
    pub(crate) fn write_attributes(&self, handler: &mut IOHandler) -> Result<(), HandlerError> {
        let target = self.writable_ref();
        for name in &self.deleted {
            handler.enqueue(IOTask::new(target, Operation::DeleteAtt { name: name.clone() }));
        }
        for (name, attribute) in &self.attributes {
            handler.enqueue(IOTask::new(
                target,
                Operation::WriteAtt {
                    name: name.clone(),
                    attribute: attribute.clone(),
                },
            ));
        }
        handler.flush().wait()
    }

    /// The attributes written by [`write_attributes`](Self::write_attributes) are in storage
    pub(crate) fn commit_attributes(&mut self) {
        self.deleted.clear();
        self.state.mark_flushed();
    }

    /// Write the attributes if dirty and clear the dirty flag on success
    pub(crate) fn flush_attributes(&mut self, handler: &mut IOHandler) -> Result<(), HandlerError> {
        if !self.state.dirty() {
            return Ok(());
        }
        self.write_attributes(handler)?;
        self.commit_attributes();
        Ok(())
    }

    /// Read every attribute stored for this object
    ///
    /// Values keep whatever datatype storage reports. A backend that returns
    /// nothing (the no-op backend) leaves the store untouched.
    pub(crate) fn read_attributes(&mut self, handler: &mut IOHandler) -> Result<(), HandlerError> {
        let target = self.writable_ref();
        let names = Slot::new();
        handler.run(IOTask::new(
            target,
            Operation::ListAtts {
                attributes: names.clone(),
            },
        ))?;
        let names = names.take().unwrap_or_default();

        let reads: Vec<(String, Slot<Attribute>)> = names
            .into_iter()
            .map(|name| {
                let slot = Slot::new();
                handler.enqueue(IOTask::new(
                    target,
                    Operation::ReadAtt {
                        name: name.clone(),
                        attribute: slot.clone(),
                    },
                ));
                (name, slot)
            })
            .collect();
        handler.flush().wait()?;

        for (name, slot) in reads {
            if let Some(value) = slot.take() {
                self.store_attribute(name, value);
            }
        }
        Ok(())
    }
}

/// Objects carrying a generic attribute store
pub trait Attributes {
    /// The underlying store
    fn attributable(&self) -> &Attributable;

    /// The underlying store, mutably
    fn attributable_mut(&mut self) -> &mut Attributable;

    /// Set an attribute and mark the object dirty
    fn set_attribute(&mut self, name: impl Into<String>, value: impl Into<Attribute>) {
        self.attributable_mut().set_attribute(name, value);
    }

    /// Look up an attribute
    fn get_attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributable().get_attribute(name)
    }

    /// Remove an attribute
    fn delete_attribute(&mut self, name: &str) -> Option<Attribute> {
        self.attributable_mut().delete_attribute(name)
    }

    /// Whether the object's structure exists in storage
    fn written(&self) -> bool {
        self.attributable().state().written()
    }

    /// Whether the object has changes to flush
    fn dirty(&self) -> bool {
        self.attributable().state().dirty()
    }
}
