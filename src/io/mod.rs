//! # Backend dispatch and task queue
//!
//! Series operations never talk to storage directly. They enqueue [`IOTask`]s
//! on an [`IOHandler`], which hands them to a [`StorageBackend`] on
//! [`flush`](IOHandler::flush):
//!
//! ```text
//! Series ──enqueue(IOTask)──▶ IOHandler queue ──flush()──▶ StorageBackend
//!    ▲                                                         │
//!    └──────── FlushFuture::wait() + filled result Slots ◀─────┘
//! ```
//!
//! Which backend serves a series is decided once, at construction, by the
//! [`BackendRegistry`].

mod access;
mod backend;
mod comm;
mod dummy;
mod error;
mod future;
mod handler;
mod json;
pub mod native;
mod registry;
mod task;

pub use access::{AccessType, Format};
pub use backend::{BackendKind, StorageBackend};
pub use comm::{Communicator, SingleProcess};
pub use dummy::DummyBackend;
pub use error::HandlerError;
pub use future::{FlushCompleter, FlushFuture};
pub use handler::IOHandler;
pub use json::JsonBackend;
pub use registry::{
    create_io_handler, BackendContext, BackendFactory, BackendRegistry, Parallelism,
};
pub use task::{IOTask, Operation, OperationKind, Slot, WritableRef};
