//! Testing infrastructure: mocks and fixtures.
//!
//! Controllable test doubles for every Launchpad collaborator trait, so the
//! triage core can be exercised deterministically without the network. The
//! module is public so integration tests can drive whole records through
//! canned queues and changes files.

mod fixtures;
mod mocks;

pub use fixtures::{bug_title, task_link};
pub use mocks::{
    MockArchive, MockBugTask, MockChangesFetcher, MockDistroSeries, MockPublishedSource,
    MockSession, MockUpload,
};
