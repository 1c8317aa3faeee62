//! Trait abstractions over the Launchpad API collaborators.
//!
//! These traits describe exactly the capabilities the triage core consumes,
//! so records can be driven by the real launchpadlib-backed client or by the
//! mocks in [`crate::testing`] without touching the network.
//!
//! All calls are blocking; transport failures surface as
//! [`TriageError::Api`](crate::TriageError::Api) from the implementation.

use chrono::{DateTime, Utc};

use crate::error::{Result, TriageError};

/// The kind of target a bug task is filed against.
///
/// Determines how many leading tokens of the task title belong to the target
/// preamble rather than the bug summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Distribution,
    DistributionSourcePackage,
    SourcePackage,
    Project,
}

impl TargetKind {
    /// Number of leading title tokens that precede the bug summary.
    pub fn title_token_offset(self) -> usize {
        match self {
            Self::Distribution => 4,
            Self::DistributionSourcePackage => 5,
            Self::SourcePackage => 6,
            Self::Project => 7,
        }
    }
}

/// One bug task as exposed by the remote service.
///
/// Accessors mirror the remote object's properties; each may be lazily
/// fetched by the implementation, so callers memoize (see
/// [`TaskRecord`](crate::task::TaskRecord)).
pub trait BugTask {
    /// Path-like reference identifying the task, e.g.
    /// `https://api.launchpad.net/devel/ubuntu/jammy/+source/openssh/+bug/1880699`.
    fn self_link(&self) -> String;

    /// Full task title, e.g. `Bug #1880699 in openssh (Ubuntu): "summary"`.
    fn title(&self) -> String;

    /// Task status string, e.g. `Triaged`.
    fn status(&self) -> String;

    /// Importance string, e.g. `High`.
    fn importance(&self) -> String;

    /// Assignee reference, e.g. `https://api.launchpad.net/devel/~ahasenack`.
    fn assignee_link(&self) -> Option<String>;

    /// Tags on the parent bug.
    fn tags(&self) -> Vec<String>;

    /// Last update of the parent bug.
    fn date_last_updated(&self) -> DateTime<Utc>;

    /// Kind of target the task is filed against.
    fn target_kind(&self) -> TargetKind;

    /// All tasks on the parent bug, this one included.
    ///
    /// # Errors
    ///
    /// Returns an error if the task list cannot be fetched.
    fn bug_tasks(&self) -> Result<Vec<Box<dyn BugTask>>>;
}

/// Authenticated API session, used only for the unapproved-queue lookup.
pub trait LaunchpadSession {
    /// Resolve a distribution series by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the series does not exist or cannot be fetched.
    fn distribution_series(&self, name: &str) -> Result<Box<dyn DistroSeries>>;
}

/// A distribution series (one release line).
pub trait DistroSeries {
    /// Query the series' package upload queue.
    ///
    /// # Errors
    ///
    /// Returns an error if the queue cannot be queried.
    fn package_uploads(
        &self,
        pocket: &str,
        status: &str,
        exact_match: bool,
        name: &str,
    ) -> Result<Vec<Box<dyn Upload>>>;
}

/// One entry in a package upload queue.
pub trait Upload {
    /// Whether the upload carries source directly.
    fn contains_source(&self) -> bool;

    /// Whether the upload is a copy from another archive.
    fn contains_copy(&self) -> bool;

    /// Source file URLs for a direct source upload.
    ///
    /// # Errors
    ///
    /// Returns an error if the URLs cannot be fetched.
    fn source_file_urls(&self) -> Result<Vec<String>>;

    /// The archive a copy upload originates from.
    ///
    /// The handle is lazily permission-checked; resolving it succeeds even
    /// when later access would fail. Probe it before use.
    ///
    /// # Errors
    ///
    /// Returns an error if the reference itself cannot be resolved.
    fn copy_source_archive(&self) -> Result<Box<dyn Archive>>;

    /// URL of the upload's changes file, if any.
    fn changes_file_url(&self) -> Option<String>;

    /// Source package name of the upload.
    fn package_name(&self) -> String;

    /// Source package version of the upload.
    fn package_version(&self) -> String;

    /// Human-readable identity for error messages and logs.
    fn display_name(&self) -> String;
}

/// An archive that published sources can be queried from.
pub trait Archive {
    /// Touch a lightweight self-identifying attribute.
    ///
    /// Copy-source archives are lazily permission-checked, so an access
    /// failure only surfaces on first attribute access. Probing forces the
    /// failure out before any real query.
    ///
    /// # Errors
    ///
    /// Returns an error if the caller may not access the archive.
    fn probe(&self) -> Result<()>;

    /// Published sources matching name and version exactly, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn published_sources(
        &self,
        source_name: &str,
        version: &str,
    ) -> Result<Vec<Box<dyn PublishedSource>>>;
}

/// One published source record in an archive.
pub trait PublishedSource {
    /// Source file URLs of the publication.
    ///
    /// # Errors
    ///
    /// Returns an error if the URLs cannot be fetched.
    fn source_file_urls(&self) -> Result<Vec<String>>;
}

/// Identity fields recovered from a task reference path.
///
/// The remote API encodes them at fixed positions:
/// `https:` `''` `api.launchpad.net` `devel` `<distro>` `<series>` ...
/// `<source-package>` `+bug` `<number>` - distro at index 4, series at
/// index 5, source package third from last. Those indices are a contract of
/// the URL shape, not a coincidence; a structured accessor would be
/// preferred if the service exposed one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPath {
    pub distro: String,
    pub series: String,
    pub source_package_name: String,
}

impl TaskPath {
    /// Synthetic series name for the unreleased development series.
    pub const DEVEL_SERIES: &'static str = "-devel";

    /// Parse a task reference path into its identity fields.
    ///
    /// The `+source` pseudo-series (a task against the development series)
    /// normalizes to [`Self::DEVEL_SERIES`].
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::MalformedTaskLink`] if the path has too few
    /// segments to carry all three fields.
    pub fn parse(link: &str) -> Result<Self> {
        let elements: Vec<&str> = link.split('/').collect();
        if elements.len() < 9 {
            return Err(TriageError::malformed_task_link(link));
        }
        let mut series = elements[5].to_string();
        if series == "+source" {
            series = Self::DEVEL_SERIES.to_string();
        }
        Ok(Self {
            distro: elements[4].to_string(),
            series,
            source_package_name: elements[elements.len() - 3].to_string(),
        })
    }
}

/// Resolve the source file URLs an upload was built from.
///
/// Direct source uploads answer from their own files. Copy uploads resolve
/// through their source archive: the archive is probed first (the permission
/// check is lazy and would otherwise fail mid-query), then the newest
/// published source matching the upload's name and version exactly is used.
///
/// # Errors
///
/// - [`TriageError::CopyArchivePermission`] if the archive probe fails.
/// - [`TriageError::UnresolvableSource`] if the upload is neither source nor
///   copy, or the copy archive has no matching publication.
///
/// Both are skippable for the unapproved-queue scan; anything else
/// propagates.
pub fn upload_source_urls(upload: &dyn Upload) -> Result<Vec<String>> {
    if upload.contains_source() {
        return upload.source_file_urls();
    }

    if upload.contains_copy() {
        let archive = upload.copy_source_archive()?;
        archive
            .probe()
            .map_err(|_| TriageError::copy_archive_permission(upload.display_name()))?;
        let sources = archive.published_sources(&upload.package_name(), &upload.package_version())?;
        let newest = sources
            .into_iter()
            .next()
            .ok_or_else(|| TriageError::unresolvable_source(upload.display_name()))?;
        return newest.source_file_urls();
    }

    Err(TriageError::unresolvable_source(upload.display_name()))
}
