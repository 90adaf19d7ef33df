use crossbeam_channel::{bounded, Receiver, Sender};

use super::HandlerError;

/// Completion handle returned by a flush
///
/// Backends that execute their queue synchronously hand back an already
/// completed future via [`FlushFuture::ready`]. Backends that pipeline work
/// elsewhere create a pair with [`FlushFuture::pending`] and complete it later.
/// Callers always [`wait`](FlushFuture::wait) before reading result slots.
#[must_use = "a flush is only observed once its future is waited on"]
#[derive(Debug)]
pub struct FlushFuture {
    receiver: Receiver<Result<(), HandlerError>>,
}

/// Sending half of a pending [`FlushFuture`]
#[derive(Debug)]
pub struct FlushCompleter {
    sender: Sender<Result<(), HandlerError>>,
}

impl FlushFuture {
    /// A future that has already resolved to `result`
    pub fn ready(result: Result<(), HandlerError>) -> Self {
        let (completer, future) = Self::pending();
        completer.complete(result);
        future
    }

    /// A future resolved later through the returned completer
    pub fn pending() -> (FlushCompleter, Self) {
        let (sender, receiver) = bounded(1);
        (FlushCompleter { sender }, Self { receiver })
    }

    /// Whether the outcome is already available
    pub fn is_ready(&self) -> bool {
        !self.receiver.is_empty()
    }

    /// Block until the flush has finished and return its outcome
    ///
    /// A completer dropped without reporting resolves to
    /// [`HandlerError::FlushAborted`].
    pub fn wait(self) -> Result<(), HandlerError> {
        self.receiver
            .recv()
            .unwrap_or(Err(HandlerError::FlushAborted))
    }
}

impl FlushCompleter {
    /// Resolve the paired future
    pub fn complete(self, result: Result<(), HandlerError>) {
        // The receiver may already be gone if the caller discarded the future
        let _ = self.sender.send(result);
    }
}
