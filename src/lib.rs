//! lp-triage - Launchpad bug task triage reports
//!
//! Renders human-readable summaries of bug tasks pulled from Launchpad for
//! Ubuntu triage. The core is [`TaskRecord`]: it wraps one remote bug task,
//! lazily computes and memoizes derived display attributes, aggregates the
//! parent bug's sibling tasks across distribution series, and renders
//! fixed-width report lines plus a serializable snapshot.
//!
//! # Architecture
//!
//! - [`task`] - The [`TaskRecord`] model and its derived-state computation
//! - [`launchpad`] - Trait abstractions over the remote API collaborators
//! - [`changes`] - Changes-file retrieval and fixed-bug extraction
//! - [`render`] - Fixed-width text helpers and the report header
//! - [`config`] - Shared thresholds and status sets
//! - [`error`] - Custom error types and the per-upload skip policy
//! - [`testing`] - Mocks and fixtures for every collaborator trait
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lp_triage::{header, HttpChangesFetcher, TaskRecord, TriageConfig};
//!
//! let config = Arc::new(TriageConfig::new());
//! let fetcher = Arc::new(HttpChangesFetcher::new());
//!
//! println!("{}", header(false));
//! for task in bug_tasks {
//!     let mut record = TaskRecord::from_task(task, Arc::clone(&config),
//!                                            Arc::clone(&session),
//!                                            Arc::clone(&fetcher))?;
//!     record.subscribed = team_subscribed(&record);
//!     println!("{}", record.compose_pretty(true, false, false)?);
//! }
//! ```

pub mod changes;
pub mod config;
pub mod error;
pub mod launchpad;
pub mod render;
pub mod task;
pub mod testing;

// Re-export commonly used types
pub use error::{Result, TriageError};

// Re-export the core model
pub use task::{SeriesState, TaskRecord, TaskRecordBuilder, TaskSnapshot};

// Re-export configuration
pub use config::TriageConfig;

// Re-export collaborator abstractions
pub use launchpad::{
    upload_source_urls, Archive, BugTask, DistroSeries, LaunchpadSession, PublishedSource,
    TargetKind, TaskPath, Upload,
};

// Re-export changes-file handling
pub use changes::{ChangesFetcher, ChangesFile, HttpChangesFetcher};

// Re-export rendering helpers
pub use render::{header, truncate_string, BUG_COLUMN_WIDTH, LONG_URL_ROOT, SHORTLINK_ROOT};
