use std::fmt;

/// Group of processes performing collective I/O
///
/// Every rank of a communicator must issue the same sequence of enqueue and
/// flush calls; divergence is not detected.
pub trait Communicator: Send + Sync + fmt::Debug {
    /// Rank of the calling process
    fn rank(&self) -> usize;

    /// Number of participating processes
    fn size(&self) -> usize;
}

/// Communicator of a single process
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleProcess;

impl Communicator for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }
}
