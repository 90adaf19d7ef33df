//! JSON reference backend.
//!
//! Each physical file is one JSON document: a tree of groups, every group
//! holding typed attributes and child groups. Documents are loaded lazily on
//! open, mutated in memory while a batch executes, and written back to disk in
//! [`commit`](StorageBackend::commit) once the whole batch has succeeded.
//!
//! ```text
//! {
//!   "attributes": { "openPMD": { "datatype": "STRING", "value": "1.1.0" } },
//!   "children": { "data": { "children": { "100": { ... } } } }
//! }
//! ```

mod node;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::attributable::WritableId;

use super::backend::{BackendKind, StorageBackend};
use super::registry::BackendContext;
use super::{AccessType, HandlerError, IOTask, Operation, OperationKind, WritableRef};

use node::{display_path, split_path, Node};

#[derive(Debug)]
struct Document {
    root: Node,
    modified: bool,
}

/// Location of an object: file name plus group path inside it
#[derive(Debug, Clone, PartialEq, Eq)]
struct Position {
    file: String,
    path: Vec<String>,
}

/// Backend storing every physical file as a JSON document
#[derive(Debug)]
pub struct JsonBackend {
    directory: PathBuf,
    access: AccessType,
    extension: String,
    pretty: bool,
    documents: HashMap<String, Document>,
    positions: HashMap<WritableId, Position>,
}

impl JsonBackend {
    /// Backend for files with `extension` (including the dot) under `directory`
    pub fn new(directory: impl Into<PathBuf>, access: AccessType, extension: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            access,
            extension: extension.into(),
            pretty: true,
            documents: HashMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Whether documents are pretty-printed
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Registry factory; the extension follows the requested format
    pub fn factory(
        pretty: bool,
    ) -> impl Fn(&BackendContext<'_>) -> Result<Box<dyn StorageBackend>, HandlerError> + Send + Sync
    {
        move |ctx| {
            let extension = ctx.format.extension().unwrap_or(".json");
            let backend = JsonBackend::new(ctx.directory, ctx.access, extension).with_pretty(pretty);
            Ok(Box::new(backend) as Box<dyn StorageBackend>)
        }
    }

    fn file_name(&self, name: &str) -> String {
        if name.ends_with(&self.extension) {
            name.to_string()
        } else {
            format!("{}{}", name, self.extension)
        }
    }

    fn file_path(&self, file: &str) -> PathBuf {
        self.directory.join(file)
    }

    fn check_access(&self, operation: &Operation) -> Result<(), HandlerError> {
        if operation.is_mutating() && !self.access.is_writable() {
            return Err(HandlerError::AccessViolation {
                operation: operation.kind(),
                access: self.access,
            });
        }
        Ok(())
    }

    fn position(&self, id: WritableId, operation: OperationKind) -> Result<&Position, HandlerError> {
        self.positions
            .get(&id)
            .ok_or(HandlerError::Unpositioned { operation })
    }

    /// Where paths of a new or opened object are resolved from
    fn base_position(
        &self,
        writable: &WritableRef,
        operation: OperationKind,
    ) -> Result<Position, HandlerError> {
        writable
            .parent
            .and_then(|parent| self.positions.get(&parent))
            .or_else(|| self.positions.get(&writable.id))
            .cloned()
            .ok_or(HandlerError::Unpositioned { operation })
    }

    fn resolve(base: Position, path: &str) -> Position {
        let mut components = if path.starts_with('/') {
            Vec::new()
        } else {
            base.path
        };
        components.extend(split_path(path));
        Position {
            file: base.file,
            path: components,
        }
    }

    fn node(&self, position: &Position) -> Result<&Node, HandlerError> {
        self.documents
            .get(&position.file)
            .and_then(|doc| doc.root.at(&position.path))
            .ok_or_else(|| HandlerError::NoSuchPath(display_path(&position.path)))
    }

    fn node_mut(&mut self, position: &Position) -> Result<&mut Node, HandlerError> {
        let document = self
            .documents
            .get_mut(&position.file)
            .ok_or_else(|| HandlerError::NoSuchFile(self.directory.join(&position.file)))?;
        document.modified = true;
        document
            .root
            .at_mut(&position.path)
            .ok_or_else(|| HandlerError::NoSuchPath(display_path(&position.path)))
    }

    fn load(path: &Path, operation: OperationKind) -> Result<Node, HandlerError> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader).map_err(|e| HandlerError::TaskFailed {
            operation,
            message: format!("{} is not an openPMD JSON document: {}", path.display(), e),
        })
    }

    fn create_file(&mut self, writable: &WritableRef, name: &str) -> Result<(), HandlerError> {
        let file = self.file_name(name);
        let path = self.file_path(&file);
        let root = if self.access == AccessType::ReadWrite && path.exists() {
            Self::load(&path, OperationKind::CreateFile)?
        } else {
            Node::default()
        };
        self.documents.insert(
            file.clone(),
            Document {
                root,
                modified: true,
            },
        );
        self.positions.insert(
            writable.id,
            Position {
                file,
                path: Vec::new(),
            },
        );
        Ok(())
    }

    fn open_file(&mut self, writable: &WritableRef, name: &str) -> Result<(), HandlerError> {
        let file = self.file_name(name);
        if !self.documents.contains_key(&file) {
            let path = self.file_path(&file);
            if !path.is_file() {
                return Err(HandlerError::NoSuchFile(path));
            }
            let root = Self::load(&path, OperationKind::OpenFile)?;
            self.documents.insert(
                file.clone(),
                Document {
                    root,
                    modified: false,
                },
            );
        }
        self.positions.insert(
            writable.id,
            Position {
                file,
                path: Vec::new(),
            },
        );
        Ok(())
    }

    fn write_document(&self, file: &str, root: &Node) -> Result<(), HandlerError> {
        let mut writer = BufWriter::new(File::create(self.file_path(file))?);
        if self.pretty {
            serde_json::to_writer_pretty(&mut writer, root)?;
        } else {
            serde_json::to_writer(&mut writer, root)?;
        }
        writer.flush()?;
        Ok(())
    }
}

impl StorageBackend for JsonBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Json
    }

    fn execute(&mut self, task: &IOTask) -> Result<(), HandlerError> {
        let operation = &task.operation;
        let kind = operation.kind();
        self.check_access(operation)?;

        match operation {
            Operation::CreateFile { name } => self.create_file(&task.writable, name)?,
            Operation::OpenFile { name } => self.open_file(&task.writable, name)?,
            Operation::CreatePath { path } => {
                let position = Self::resolve(self.base_position(&task.writable, kind)?, path);
                let document = self
                    .documents
                    .get_mut(&position.file)
                    .ok_or_else(|| HandlerError::NoSuchFile(self.directory.join(&position.file)))?;
                document.root.create(&position.path);
                document.modified = true;
                self.positions.insert(task.writable.id, position);
            }
            Operation::OpenPath { path } => {
                let position = Self::resolve(self.base_position(&task.writable, kind)?, path);
                self.node(&position)?;
                self.positions.insert(task.writable.id, position);
            }
            Operation::ListPaths { paths } => {
                let position = self.position(task.writable.id, kind)?;
                let node = self.node(position)?;
                paths.fill(node.children.keys().cloned().collect());
            }
            Operation::WriteAtt { name, attribute } => {
                let position = self.position(task.writable.id, kind)?.clone();
                self.node_mut(&position)?
                    .attributes
                    .insert(name.clone(), attribute.clone());
            }
            Operation::ReadAtt { name, attribute } => {
                let position = self.position(task.writable.id, kind)?;
                let value = self
                    .node(position)?
                    .attributes
                    .get(name)
                    .cloned()
                    .ok_or_else(|| HandlerError::NoSuchAttribute(name.clone()))?;
                attribute.fill(value);
            }
            Operation::ListAtts { attributes } => {
                let position = self.position(task.writable.id, kind)?;
                let node = self.node(position)?;
                attributes.fill(node.attributes.keys().cloned().collect());
            }
            Operation::DeleteAtt { name } => {
                let position = self.position(task.writable.id, kind)?.clone();
                self.node_mut(&position)?.attributes.remove(name);
            }
        }
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HandlerError> {
        let mut modified: Vec<&String> = self
            .documents
            .iter()
            .filter(|(_, doc)| doc.modified)
            .map(|(file, _)| file)
            .collect();
        modified.sort();
        for file in &modified {
            if let Some(document) = self.documents.get(*file) {
                self.write_document(file, &document.root)?;
                log::trace!("Wrote {}", file);
            }
        }
        let written: Vec<String> = modified.into_iter().cloned().collect();
        for file in written {
            if let Some(document) = self.documents.get_mut(&file) {
                document.modified = false;
            }
        }
        Ok(())
    }
}
