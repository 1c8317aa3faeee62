//! Mock implementations of the Launchpad collaborator traits.
//!
//! Builder-style test doubles; call counters are shared across clones so a
//! test can hand a mock to a record and still observe how often it was hit.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};

use crate::changes::{ChangesFetcher, ChangesFile};
use crate::error::{Result, TriageError};
use crate::launchpad::{
    Archive, BugTask, DistroSeries, LaunchpadSession, PublishedSource, TargetKind, Upload,
};

/// Mock bug task.
///
/// # Example
///
/// ```rust,ignore
/// let task = MockBugTask::new(&task_link(Some("jammy"), "openssh", "1880699"),
///                             &bug_title("1880699", "openssh", "summary"))
///     .with_status("Triaged")
///     .with_importance("High");
/// ```
#[derive(Debug, Clone)]
pub struct MockBugTask {
    self_link: String,
    title: String,
    status: String,
    importance: String,
    assignee_link: Option<String>,
    tags: Vec<String>,
    date_last_updated: DateTime<Utc>,
    target_kind: TargetKind,
    siblings: Vec<MockBugTask>,
    title_calls: Arc<AtomicU32>,
}

impl MockBugTask {
    /// Create a task with the given reference path and title.
    #[must_use]
    pub fn new(self_link: &str, title: &str) -> Self {
        Self {
            self_link: self_link.to_string(),
            title: title.to_string(),
            status: "New".to_string(),
            importance: "Undecided".to_string(),
            assignee_link: None,
            tags: Vec::new(),
            date_last_updated: Utc.with_ymd_and_hms(2026, 1, 15, 12, 0, 0).unwrap(),
            target_kind: TargetKind::DistributionSourcePackage,
            siblings: Vec::new(),
            title_calls: Arc::new(AtomicU32::new(0)),
        }
    }

    /// Set the task status.
    #[must_use]
    pub fn with_status(mut self, status: &str) -> Self {
        self.status = status.to_string();
        self
    }

    /// Set the importance.
    #[must_use]
    pub fn with_importance(mut self, importance: &str) -> Self {
        self.importance = importance.to_string();
        self
    }

    /// Set the assignee reference link.
    #[must_use]
    pub fn with_assignee_link(mut self, link: &str) -> Self {
        self.assignee_link = Some(link.to_string());
        self
    }

    /// Set the bug tags.
    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the last-update timestamp.
    #[must_use]
    pub fn with_date_last_updated(mut self, when: DateTime<Utc>) -> Self {
        self.date_last_updated = when;
        self
    }

    /// Set the target kind.
    #[must_use]
    pub fn with_target_kind(mut self, kind: TargetKind) -> Self {
        self.target_kind = kind;
        self
    }

    /// Set the parent bug's full task list (include this task if the test
    /// wants it reported as its own sibling).
    #[must_use]
    pub fn with_bug_tasks(mut self, tasks: Vec<MockBugTask>) -> Self {
        self.siblings = tasks;
        self
    }

    /// Reference path without going through the trait object.
    #[must_use]
    pub fn mock_self_link(&self) -> String {
        self.self_link.clone()
    }

    /// Counter of `title()` calls, shared across clones.
    #[must_use]
    pub fn title_call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.title_calls)
    }
}

impl BugTask for MockBugTask {
    fn self_link(&self) -> String {
        self.self_link.clone()
    }

    fn title(&self) -> String {
        self.title_calls.fetch_add(1, Ordering::SeqCst);
        self.title.clone()
    }

    fn status(&self) -> String {
        self.status.clone()
    }

    fn importance(&self) -> String {
        self.importance.clone()
    }

    fn assignee_link(&self) -> Option<String> {
        self.assignee_link.clone()
    }

    fn tags(&self) -> Vec<String> {
        self.tags.clone()
    }

    fn date_last_updated(&self) -> DateTime<Utc> {
        self.date_last_updated
    }

    fn target_kind(&self) -> TargetKind {
        self.target_kind
    }

    fn bug_tasks(&self) -> Result<Vec<Box<dyn BugTask>>> {
        Ok(self
            .siblings
            .iter()
            .map(|task| Box::new(task.clone()) as Box<dyn BugTask>)
            .collect())
    }
}

/// Mock API session resolving distribution series by name.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    series: HashMap<String, MockDistroSeries>,
    calls: Arc<AtomicU32>,
}

impl MockSession {
    /// Create a session with no series.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a series under a name.
    #[must_use]
    pub fn with_series(mut self, name: &str, series: MockDistroSeries) -> Self {
        self.series.insert(name.to_string(), series);
        self
    }

    /// Counter of series lookups, shared across clones.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

impl LaunchpadSession for MockSession {
    fn distribution_series(&self, name: &str) -> Result<Box<dyn DistroSeries>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.series
            .get(name)
            .map(|series| Box::new(series.clone()) as Box<dyn DistroSeries>)
            .ok_or_else(|| TriageError::api(format!("no such series: {name}")))
    }
}

/// Mock distribution series holding an upload queue.
#[derive(Debug, Clone, Default)]
pub struct MockDistroSeries {
    uploads: Vec<MockUpload>,
}

impl MockDistroSeries {
    /// Create a series with an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an upload to the queue.
    #[must_use]
    pub fn with_upload(mut self, upload: MockUpload) -> Self {
        self.uploads.push(upload);
        self
    }
}

impl DistroSeries for MockDistroSeries {
    fn package_uploads(
        &self,
        _pocket: &str,
        _status: &str,
        exact_match: bool,
        name: &str,
    ) -> Result<Vec<Box<dyn Upload>>> {
        Ok(self
            .uploads
            .iter()
            .filter(|upload| !exact_match || upload.package_name == name)
            .map(|upload| Box::new(upload.clone()) as Box<dyn Upload>)
            .collect())
    }
}

/// Mock queue upload.
#[derive(Debug, Clone)]
pub struct MockUpload {
    package_name: String,
    package_version: String,
    source: bool,
    copy: bool,
    source_file_urls: Vec<String>,
    changes_file_url: Option<String>,
    archive: Option<MockArchive>,
}

impl MockUpload {
    /// Create an upload that is neither source nor copy; configure one of
    /// the two with the builders below.
    #[must_use]
    pub fn new(package_name: &str, package_version: &str) -> Self {
        Self {
            package_name: package_name.to_string(),
            package_version: package_version.to_string(),
            source: false,
            copy: false,
            source_file_urls: Vec::new(),
            changes_file_url: None,
            archive: None,
        }
    }

    /// Mark the upload as carrying source directly.
    #[must_use]
    pub fn with_source(mut self, source: bool) -> Self {
        self.source = source;
        self
    }

    /// Mark the upload as a copy from another archive.
    #[must_use]
    pub fn with_copy(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }

    /// Set the source file URLs a direct upload answers with.
    #[must_use]
    pub fn with_source_file_urls(mut self, urls: Vec<String>) -> Self {
        self.source_file_urls = urls;
        self
    }

    /// Set the copy-source archive.
    #[must_use]
    pub fn with_copy_source_archive(mut self, archive: MockArchive) -> Self {
        self.archive = Some(archive);
        self
    }

    /// Set the changes file URL.
    #[must_use]
    pub fn with_changes_file_url(mut self, url: &str) -> Self {
        self.changes_file_url = Some(url.to_string());
        self
    }
}

impl Upload for MockUpload {
    fn contains_source(&self) -> bool {
        self.source
    }

    fn contains_copy(&self) -> bool {
        self.copy
    }

    fn source_file_urls(&self) -> Result<Vec<String>> {
        Ok(self.source_file_urls.clone())
    }

    fn copy_source_archive(&self) -> Result<Box<dyn Archive>> {
        self.archive
            .as_ref()
            .map(|archive| Box::new(archive.clone()) as Box<dyn Archive>)
            .ok_or_else(|| TriageError::api(format!("{} has no copy source archive", self.display_name())))
    }

    fn changes_file_url(&self) -> Option<String> {
        self.changes_file_url.clone()
    }

    fn package_name(&self) -> String {
        self.package_name.clone()
    }

    fn package_version(&self) -> String {
        self.package_version.clone()
    }

    fn display_name(&self) -> String {
        format!("{} {}", self.package_name, self.package_version)
    }
}

/// Mock archive; probing can be made to fail like a lazily
/// permission-checked copy-source archive.
#[derive(Debug, Clone, Default)]
pub struct MockArchive {
    probe_fails: bool,
    published: Vec<MockPublishedSource>,
}

impl MockArchive {
    /// Create an accessible archive with no publications.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the access probe fail.
    #[must_use]
    pub fn with_probe_failure(mut self) -> Self {
        self.probe_fails = true;
        self
    }

    /// Append a published source, newest first.
    #[must_use]
    pub fn with_published_source(mut self, source: MockPublishedSource) -> Self {
        self.published.push(source);
        self
    }
}

impl Archive for MockArchive {
    fn probe(&self) -> Result<()> {
        if self.probe_fails {
            return Err(TriageError::api("archive access denied"));
        }
        Ok(())
    }

    fn published_sources(
        &self,
        _source_name: &str,
        _version: &str,
    ) -> Result<Vec<Box<dyn PublishedSource>>> {
        Ok(self
            .published
            .iter()
            .map(|source| Box::new(source.clone()) as Box<dyn PublishedSource>)
            .collect())
    }
}

/// Mock published source record.
#[derive(Debug, Clone)]
pub struct MockPublishedSource {
    source_file_urls: Vec<String>,
}

impl MockPublishedSource {
    /// Create a publication answering with the given URLs.
    #[must_use]
    pub fn new(source_file_urls: Vec<String>) -> Self {
        Self { source_file_urls }
    }
}

impl PublishedSource for MockPublishedSource {
    fn source_file_urls(&self) -> Result<Vec<String>> {
        Ok(self.source_file_urls.clone())
    }
}

/// Mock changes-file fetcher answering from canned files.
#[derive(Debug, Clone, Default)]
pub struct MockChangesFetcher {
    files: HashMap<String, ChangesFile>,
    failures: HashSet<String>,
    calls: Arc<AtomicU32>,
}

impl MockChangesFetcher {
    /// Create a fetcher with no canned files; unknown URLs error.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a canned changes file for a URL.
    #[must_use]
    pub fn with_changes(mut self, url: &str, changes: ChangesFile) -> Self {
        self.files.insert(url.to_string(), changes);
        self
    }

    /// Register a changes file declaring the given fixed bugs.
    #[must_use]
    pub fn with_bugs_fixed(self, url: &str, bugs: &[&str]) -> Self {
        let changes = ChangesFile::new().with_field("Launchpad-Bugs-Fixed", &bugs.join(" "));
        self.with_changes(url, changes)
    }

    /// Make fetches of a URL fail like a transport error.
    #[must_use]
    pub fn with_failure(mut self, url: &str) -> Self {
        self.failures.insert(url.to_string());
        self
    }

    /// Counter of fetches, shared across clones.
    #[must_use]
    pub fn call_counter(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.calls)
    }
}

impl ChangesFetcher for MockChangesFetcher {
    fn fetch(&self, url: &str) -> Result<ChangesFile> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failures.contains(url) {
            return Err(TriageError::changes_fetch(url, "simulated transport failure"));
        }
        self.files
            .get(url)
            .cloned()
            .ok_or_else(|| TriageError::changes_fetch(url, "no such changes file"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_session_counts_calls_across_clones() {
        let session = MockSession::new().with_series("jammy", MockDistroSeries::new());
        let counter = session.call_counter();
        let clone = session.clone();
        let _ = clone.distribution_series("jammy").unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(session.distribution_series("nosuch").is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_mock_series_exact_match_filters_by_name() {
        let series = MockDistroSeries::new()
            .with_upload(MockUpload::new("openssh", "1"))
            .with_upload(MockUpload::new("casper", "2"));
        let uploads = series.package_uploads("Proposed", "Unapproved", true, "openssh").unwrap();
        assert_eq!(uploads.len(), 1);
        assert_eq!(uploads[0].package_name(), "openssh");

        let all = series.package_uploads("Proposed", "Unapproved", false, "").unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn test_mock_fetcher_canned_and_failing_urls() {
        let fetcher = MockChangesFetcher::new()
            .with_bugs_fixed("http://lp/a.changes", &["1", "2"])
            .with_failure("http://lp/b.changes");
        assert_eq!(
            fetcher.fetch("http://lp/a.changes").unwrap().bugs_fixed(),
            vec!["1", "2"]
        );
        assert!(fetcher.fetch("http://lp/b.changes").is_err());
        assert!(fetcher.fetch("http://lp/unknown.changes").is_err());
        assert_eq!(fetcher.call_counter().load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_mock_upload_without_archive_errors() {
        let upload = MockUpload::new("openssh", "1");
        assert!(upload.copy_source_archive().is_err());
    }
}
