//! The triage task record.
//!
//! [`TaskRecord`] wraps one remote bug task, derives display attributes from
//! it exactly once each, aggregates the parent bug's sibling tasks across
//! distribution series, and renders fixed-width report lines plus a
//! serializable snapshot.
//!
//! Most derived values are parsed out of the task title instead of fetched
//! through further API calls; the title is already in hand and encodes the
//! bug number, package, and summary, so this avoids a round trip per field.

use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use colored::Color;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

use crate::changes::ChangesFetcher;
use crate::config::TriageConfig;
use crate::error::Result;
use crate::launchpad::{upload_source_urls, BugTask, LaunchpadSession, TaskPath};
use crate::render::{
    mark, printable_len, truncate_string, BUG_COLUMN_WIDTH, LONG_URL_ROOT, SHORTLINK_ROOT,
};

/// Only tasks against this distribution count as siblings.
const REPORT_DISTRO: &str = "ubuntu";

/// Queue coordinates of staged-but-unreviewed uploads.
const UNAPPROVED_POCKET: &str = "Proposed";
const UNAPPROVED_STATUS: &str = "Unapproved";

/// Triage classification of one sibling series.
///
/// Ordering of the checks matters: a closed status wins over a queue hit,
/// which wins over an open status; whatever remains (e.g. Incomplete) is
/// pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesState {
    Closed,
    Unapproved,
    Open,
    Pending,
}

impl SeriesState {
    /// Stable lowercase name, as exported in snapshots.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Unapproved => "unapproved",
            Self::Open => "open",
            Self::Pending => "pending",
        }
    }
}

/// One sibling task, reduced to what classification needs.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SiblingTask {
    series: String,
    status: String,
}

/// Machine-consumable snapshot of a record.
///
/// Field names are the export contract; they feed JSON output downstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub url: String,
    pub shortlink: String,
    pub number: String,
    pub title: String,
    pub short_title: String,

    pub distro: String,
    pub source_package: String,
    pub source_package_name: String,
    pub series: String,
    pub importance: String,
    pub status: String,
    pub tags: Vec<String>,
    pub assignee: Option<String>,

    pub is_maintainer_subscribed: bool,
    pub is_last_activity_by_maintainer: bool,
    pub is_updated_recently: bool,
    pub is_old: bool,
    pub is_verification_needed: bool,
    pub is_verification_done: bool,

    pub sibling_task_status: IndexMap<String, SeriesState>,
}

/// One bug task prepared for triage reporting.
///
/// Constructed once per remote task, queried, and discarded. Everything
/// derived from the remote object is computed at most once per instance;
/// the remote task does not change during a run, so recomputation would only
/// repeat network calls. The two caller-supplied flags are assigned after
/// construction and before the first query.
///
/// # Example
///
/// ```rust,ignore
/// use lp_triage::{TaskRecord, TriageConfig};
///
/// let mut record = TaskRecord::from_task(task, config, session, fetcher)?;
/// record.subscribed = true;
/// println!("{}", record.compose_pretty(true, false, false)?);
/// ```
pub struct TaskRecord {
    task: Box<dyn BugTask>,
    config: Arc<TriageConfig>,
    session: Option<Arc<dyn LaunchpadSession>>,
    fetcher: Option<Arc<dyn ChangesFetcher>>,

    /// Distribution the task is filed against.
    pub distro: String,
    /// Series name; `-devel` denotes the development series.
    pub series: String,
    /// Package name from the task path; diverges from the current source
    /// package after a rename.
    pub source_package_name: String,

    /// Whether the team is subscribed to the bug.
    pub subscribed: bool,
    /// Whether the last activity on the bug was by us.
    pub last_activity_ours: bool,

    title: OnceLock<String>,
    number: OnceLock<String>,
    short_title: OnceLock<String>,
    source_package: OnceLock<String>,
    status: OnceLock<String>,
    importance: OnceLock<String>,
    assignee: OnceLock<Option<String>>,
    tags: OnceLock<Vec<String>>,
    date_last_updated: OnceLock<DateTime<Utc>>,
    siblings: OnceLock<Vec<SiblingTask>>,
    in_unapproved: OnceLock<Option<bool>>,
    snapshot: OnceLock<TaskSnapshot>,
}

impl TaskRecord {
    /// Create a record from a remote task, deriving identity fields from the
    /// task's reference path.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::MalformedTaskLink`](crate::TriageError) if the
    /// reference path cannot carry distro/series/package.
    pub fn from_task(
        task: Box<dyn BugTask>,
        config: Arc<TriageConfig>,
        session: Arc<dyn LaunchpadSession>,
        fetcher: Arc<dyn ChangesFetcher>,
    ) -> Result<Self> {
        let path = TaskPath::parse(&task.self_link())?;
        Ok(Self::builder(task, config)
            .with_distro(&path.distro)
            .with_series(&path.series)
            .with_source_package_name(&path.source_package_name)
            .with_session(session)
            .with_fetcher(fetcher)
            .build())
    }

    /// Start a builder for a record with explicitly known identity fields,
    /// bypassing path derivation. Used for synthetic or pre-resolved
    /// records; such records answer `None` from [`Self::is_in_unapproved`]
    /// unless a session and fetcher are supplied.
    pub fn builder(task: Box<dyn BugTask>, config: Arc<TriageConfig>) -> TaskRecordBuilder {
        TaskRecordBuilder::new(task, config)
    }

    // =========================================================================
    // Derived properties (each computed at most once)
    // =========================================================================

    /// Task title as returned by the service.
    pub fn title(&self) -> &str {
        self.title.get_or_init(|| self.task.title())
    }

    /// Bug number as a string.
    ///
    /// Taken from the title rather than the bug object; the title is already
    /// fetched and encodes the same number.
    pub fn number(&self) -> &str {
        self.number.get_or_init(|| {
            self.title()
                .split(' ')
                .nth(1)
                .unwrap_or_default()
                .replace('#', "")
        })
    }

    /// Bug summary with the target preamble tokens stripped.
    pub fn short_title(&self) -> &str {
        self.short_title.get_or_init(|| {
            let offset = self.task.target_kind().title_token_offset();
            self.title()
                .split(' ')
                .skip(offset)
                .collect::<Vec<_>>()
                .join(" ")
                .replace('"', "")
        })
    }

    /// Current source package name (4th title token); may differ from
    /// [`Self::source_package_name`] after a package rename.
    pub fn source_package(&self) -> &str {
        self.source_package
            .get_or_init(|| self.title().split(' ').nth(3).unwrap_or_default().to_string())
    }

    /// Task status.
    pub fn status(&self) -> &str {
        self.status.get_or_init(|| self.task.status())
    }

    /// Task importance.
    pub fn importance(&self) -> &str {
        self.importance.get_or_init(|| self.task.importance())
    }

    /// Assignee username, parsed from the trailing `~name` of the assignee
    /// reference. Resolving the full person object would cost another round
    /// trip; the username is enough for the report.
    pub fn assignee(&self) -> Option<&str> {
        self.assignee
            .get_or_init(|| {
                self.task
                    .assignee_link()
                    .and_then(|link| link.split('~').nth(1).map(str::to_string))
            })
            .as_deref()
    }

    /// Tags on the parent bug.
    pub fn tags(&self) -> &[String] {
        self.tags.get_or_init(|| self.task.tags())
    }

    /// Last update of the parent bug.
    pub fn date_last_updated(&self) -> DateTime<Utc> {
        *self
            .date_last_updated
            .get_or_init(|| self.task.date_last_updated())
    }

    /// User-facing URL of the bug.
    pub fn url(&self) -> String {
        format!("{LONG_URL_ROOT}{}", self.number())
    }

    /// User-facing shortlink that terminals will autolink.
    pub fn shortlink(&self) -> String {
        format!("{SHORTLINK_ROOT}{}", self.number())
    }

    /// Whether the bug was updated after the configured age threshold.
    pub fn is_updated_recently(&self) -> bool {
        self.config
            .age_threshold
            .is_some_and(|threshold| self.date_last_updated() > threshold)
    }

    /// Whether the bug was last updated before the configured old threshold.
    pub fn is_old(&self) -> bool {
        self.config
            .old_threshold
            .is_some_and(|threshold| self.date_last_updated() < threshold)
    }

    /// Whether any tag requests SRU verification.
    pub fn verification_needed(&self) -> bool {
        self.tags()
            .iter()
            .any(|tag| tag.contains("verification-needed-"))
    }

    /// Whether any tag records completed SRU verification.
    pub fn verification_done(&self) -> bool {
        self.tags()
            .iter()
            .any(|tag| tag.contains("verification-done-"))
    }

    // =========================================================================
    // Sibling aggregation
    // =========================================================================

    /// Parent bug's tasks for this package and distribution, one per series
    /// in discovery order. A duplicate series keeps its first position but
    /// takes the later task's status.
    fn sibling_tasks(&self) -> Result<&[SiblingTask]> {
        if let Some(siblings) = self.siblings.get() {
            return Ok(siblings);
        }
        let collected = self.collect_siblings()?;
        Ok(self.siblings.get_or_init(|| collected))
    }

    fn collect_siblings(&self) -> Result<Vec<SiblingTask>> {
        let mut siblings: Vec<SiblingTask> = Vec::new();
        for task in self.task.bug_tasks()? {
            let path = TaskPath::parse(&task.self_link())?;
            // Skip other distributions and projects on the same bug
            if path.distro != REPORT_DISTRO {
                continue;
            }
            // Only the package this record reports about
            if path.source_package_name != self.source_package() {
                continue;
            }
            let status = task.status();
            match siblings.iter_mut().find(|s| s.series == path.series) {
                Some(existing) => existing.status = status,
                None => siblings.push(SiblingTask {
                    series: path.series,
                    status,
                }),
            }
        }
        Ok(siblings)
    }

    /// Whether an upload fixing this bug sits in the series' unapproved
    /// queue.
    ///
    /// `None` means there is no queue to check: the development series has
    /// no unapproved pocket, and records built without a session or fetcher
    /// cannot ask. The scan is network-bound, so the answer is computed once
    /// and reused by every call site.
    ///
    /// # Errors
    ///
    /// API and changes-file transport failures propagate; per-upload
    /// resolution failures only skip that upload.
    pub fn is_in_unapproved(&self) -> Result<Option<bool>> {
        if let Some(value) = self.in_unapproved.get() {
            return Ok(*value);
        }
        let value = self.scan_unapproved()?;
        Ok(*self.in_unapproved.get_or_init(|| value))
    }

    fn scan_unapproved(&self) -> Result<Option<bool>> {
        if self.series.is_empty() || self.series == TaskPath::DEVEL_SERIES {
            return Ok(None);
        }
        let (Some(session), Some(fetcher)) = (self.session.as_ref(), self.fetcher.as_ref())
        else {
            return Ok(None);
        };

        let series = session.distribution_series(&self.series)?;
        let uploads = series.package_uploads(
            UNAPPROVED_POCKET,
            UNAPPROVED_STATUS,
            true,
            self.source_package(),
        )?;

        for upload in uploads {
            match upload_source_urls(upload.as_ref()) {
                Ok(_) => {}
                Err(err) if err.is_skippable() => {
                    debug!(
                        upload = %upload.display_name(),
                        error = %err,
                        "skipping unresolvable upload in unapproved scan"
                    );
                    continue;
                }
                Err(err) => return Err(err),
            }
            let Some(changes_url) = upload.changes_file_url() else {
                debug!(upload = %upload.display_name(), "upload has no changes file");
                continue;
            };

            let bugs = fetcher.fetch(&changes_url)?.bugs_fixed();
            if bugs.iter().any(|bug| bug == self.number()) {
                return Ok(Some(true));
            }
        }

        Ok(Some(false))
    }

    fn classify_status(&self, status: &str) -> Result<SeriesState> {
        if self.config.is_nowork(status) {
            Ok(SeriesState::Closed)
        } else if matches!(self.is_in_unapproved()?, Some(true)) {
            Ok(SeriesState::Unapproved)
        } else if self.config.is_open(status) {
            Ok(SeriesState::Open)
        } else {
            // Remaining e.g. Incomplete stay as-is
            Ok(SeriesState::Pending)
        }
    }

    /// Classification of every sibling series, in discovery order.
    ///
    /// # Errors
    ///
    /// Propagates sibling-fetch and unapproved-scan failures.
    pub fn sibling_task_status(&self) -> Result<IndexMap<String, SeriesState>> {
        let mut status = IndexMap::new();
        for sibling in self.sibling_tasks()? {
            status.insert(sibling.series.clone(), self.classify_status(&sibling.status)?);
        }
        Ok(status)
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// One status character per sibling series, padded to `length` printable
    /// columns.
    ///
    /// The character is the capitalized series initial (`-devel` renders as
    /// `D`), colored green/cyan/yellow for closed/unapproved/open and left
    /// plain for pending. Decoration bytes never count toward the padding,
    /// so the cell occupies exactly `length` printable columns.
    ///
    /// # Errors
    ///
    /// Propagates sibling-fetch and unapproved-scan failures.
    pub fn get_releases(&self, length: usize) -> Result<String> {
        let mut release_info = String::new();

        for sibling in self.sibling_tasks()? {
            let release_char = if sibling.series.starts_with('-') {
                'D'
            } else {
                sibling
                    .series
                    .chars()
                    .next()
                    .map(|c| c.to_ascii_uppercase())
                    .unwrap_or(' ')
            };
            let cell = release_char.to_string();
            let decorated = match self.classify_status(&sibling.status)? {
                SeriesState::Closed => mark(&cell, Color::Green),
                SeriesState::Unapproved => mark(&cell, Color::Cyan),
                SeriesState::Open => mark(&cell, Color::Yellow),
                SeriesState::Pending => cell,
            };
            release_info.push_str(&decorated);
        }

        let visible = printable_len(&release_info);
        if visible < length {
            release_info.push_str(&" ".repeat(length - visible));
        }
        Ok(release_info)
    }

    /// Six status flag positions: subscribed, last-activity-ours,
    /// updated/old, new bug, verification needed, verification done.
    pub fn get_flags(&self, newbug: bool) -> String {
        let mut flags = String::new();
        flags.push(if self.subscribed { '*' } else { ' ' });
        flags.push(if self.last_activity_ours { '+' } else { ' ' });
        flags.push(if self.is_updated_recently() {
            'U'
        } else if self.is_old() {
            'O'
        } else {
            ' '
        });
        flags.push(if newbug { 'N' } else { ' ' });
        if self.verification_needed() {
            flags.push_str(&mark("v", Color::Cyan));
        } else {
            flags.push(' ');
        }
        if self.verification_done() {
            flags.push_str(&mark("V", Color::Green));
        } else {
            flags.push(' ');
        }
        flags
    }

    /// Compose one fixed-column report line.
    ///
    /// # Errors
    ///
    /// Propagates sibling-fetch and unapproved-scan failures from the
    /// releases cell.
    pub fn compose_pretty(&self, shortlinks: bool, extended: bool, newbug: bool) -> Result<String> {
        let bug_ref = if shortlinks {
            self.shortlink()
        } else {
            self.url()
        };

        let mut text = format!(
            "{bug_ref:<w$} | {flags:>6} | {releases:<7} | {status:<13} | {package:<19} |",
            w = BUG_COLUMN_WIDTH,
            flags = self.get_flags(newbug),
            releases = self.get_releases(7)?,
            status = self.status(),
            package = truncate_string(self.source_package(), 19),
        );
        if extended {
            text.push_str(&format!(
                " {date:>8} | {importance:<10} | {assignee:<13} |",
                date = self.date_last_updated().format("%d.%m.%y"),
                importance = self.importance(),
                assignee = self
                    .assignee()
                    .map(|name| truncate_string(name, 12))
                    .unwrap_or_default(),
            ));
        }
        text.push_str(&format!(
            " {:>60} |",
            truncate_string(self.short_title(), 60)
        ));
        Ok(text)
    }

    /// Compose a compact comma-separated line for a duplicate bug.
    pub fn compose_dup(&self, extended: bool) -> String {
        let mut text = format!(
            "{},{}",
            self.status(),
            truncate_string(self.source_package(), 16)
        );
        if extended {
            if let Some(assignee) = self.assignee() {
                text.push_str(&format!(",{}", truncate_string(assignee, 9)));
            }
        }
        text
    }

    // =========================================================================
    // Export and ordering
    // =========================================================================

    /// Snapshot of every derived field for machine consumption.
    ///
    /// Computed once; the record is immutable after construction, so the
    /// snapshot cannot go stale.
    ///
    /// # Errors
    ///
    /// Propagates sibling-fetch and unapproved-scan failures on the first
    /// call.
    pub fn to_structured(&self) -> Result<&TaskSnapshot> {
        if let Some(snapshot) = self.snapshot.get() {
            return Ok(snapshot);
        }
        let sibling_task_status = self.sibling_task_status()?;
        let snapshot = TaskSnapshot {
            url: self.url(),
            shortlink: self.shortlink(),
            number: self.number().to_string(),
            title: self.title().to_string(),
            short_title: self.short_title().to_string(),

            distro: self.distro.clone(),
            source_package: self.source_package().to_string(),
            source_package_name: self.source_package_name.clone(),
            series: self.series.clone(),
            importance: self.importance().to_string(),
            status: self.status().to_string(),
            tags: self.tags().to_vec(),
            assignee: self.assignee().map(str::to_string),

            is_maintainer_subscribed: self.subscribed,
            is_last_activity_by_maintainer: self.last_activity_ours,
            is_updated_recently: self.is_updated_recently(),
            is_old: self.is_old(),
            is_verification_needed: self.verification_needed(),
            is_verification_done: self.verification_done(),

            sibling_task_status,
        };
        Ok(self.snapshot.get_or_init(|| snapshot))
    }

    /// Primary sort key: records where our team acted last come first, then
    /// bug number, then package name.
    pub fn sort_key(&self) -> (bool, String, String) {
        (
            !self.last_activity_ours,
            self.number().to_string(),
            self.source_package().to_string(),
        )
    }

    /// Secondary sort key: last update alone, ascending.
    pub fn sort_date(&self) -> DateTime<Utc> {
        self.date_last_updated()
    }
}

impl fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LP #{:>8} {:<12} {}",
            self.number(),
            self.status(),
            self.title()
        )
    }
}

impl fmt::Debug for TaskRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskRecord")
            .field("distro", &self.distro)
            .field("series", &self.series)
            .field("source_package_name", &self.source_package_name)
            .field("subscribed", &self.subscribed)
            .field("last_activity_ours", &self.last_activity_ours)
            .finish_non_exhaustive()
    }
}

/// Builder for [`TaskRecord`] with explicitly named fields.
///
/// Replaces the source tool's "set arbitrary attributes on construction"
/// factory: unknown fields are a compile error here.
pub struct TaskRecordBuilder {
    task: Box<dyn BugTask>,
    config: Arc<TriageConfig>,
    session: Option<Arc<dyn LaunchpadSession>>,
    fetcher: Option<Arc<dyn ChangesFetcher>>,
    distro: String,
    series: String,
    source_package_name: String,
    subscribed: bool,
    last_activity_ours: bool,
}

impl TaskRecordBuilder {
    fn new(task: Box<dyn BugTask>, config: Arc<TriageConfig>) -> Self {
        Self {
            task,
            config,
            session: None,
            fetcher: None,
            distro: String::new(),
            series: String::new(),
            source_package_name: String::new(),
            subscribed: false,
            last_activity_ours: false,
        }
    }

    /// Set the distribution name.
    #[must_use]
    pub fn with_distro(mut self, distro: &str) -> Self {
        self.distro = distro.to_string();
        self
    }

    /// Set the series name.
    #[must_use]
    pub fn with_series(mut self, series: &str) -> Self {
        self.series = series.to_string();
        self
    }

    /// Set the source package name.
    #[must_use]
    pub fn with_source_package_name(mut self, name: &str) -> Self {
        self.source_package_name = name.to_string();
        self
    }

    /// Set the team-subscription flag.
    #[must_use]
    pub fn subscribed(mut self, subscribed: bool) -> Self {
        self.subscribed = subscribed;
        self
    }

    /// Set the last-activity-ours flag.
    #[must_use]
    pub fn last_activity_ours(mut self, ours: bool) -> Self {
        self.last_activity_ours = ours;
        self
    }

    /// Supply the API session for the unapproved-queue lookup.
    #[must_use]
    pub fn with_session(mut self, session: Arc<dyn LaunchpadSession>) -> Self {
        self.session = Some(session);
        self
    }

    /// Supply the changes-file fetcher for the unapproved-queue lookup.
    #[must_use]
    pub fn with_fetcher(mut self, fetcher: Arc<dyn ChangesFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    /// Build the record.
    #[must_use]
    pub fn build(self) -> TaskRecord {
        TaskRecord {
            task: self.task,
            config: self.config,
            session: self.session,
            fetcher: self.fetcher,
            distro: self.distro,
            series: self.series,
            source_package_name: self.source_package_name,
            subscribed: self.subscribed,
            last_activity_ours: self.last_activity_ours,
            title: OnceLock::new(),
            number: OnceLock::new(),
            short_title: OnceLock::new(),
            source_package: OnceLock::new(),
            status: OnceLock::new(),
            importance: OnceLock::new(),
            assignee: OnceLock::new(),
            tags: OnceLock::new(),
            date_last_updated: OnceLock::new(),
            siblings: OnceLock::new(),
            in_unapproved: OnceLock::new(),
            snapshot: OnceLock::new(),
        }
    }
}
