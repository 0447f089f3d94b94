//! Search job orchestration
//!
//! Submission and tracking of asynchronous search jobs. All remote access
//! goes through the [`SearchBackend`] port.

pub mod ports;
pub mod submitter;
pub mod tracker;

#[cfg(test)]
mod testing;

pub use ports::SearchBackend;
pub use submitter::JobSubmitter;
pub use tracker::{JobTracker, PollSequence};
