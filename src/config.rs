//! Process-wide triage configuration.
//!
//! The source tool configured these as class attributes set once at startup;
//! here they live in an explicit [`TriageConfig`] built before any record is
//! constructed and shared via `Arc`. Immutable after construction.

use chrono::{DateTime, Utc};

/// Shared configuration for every [`TaskRecord`](crate::task::TaskRecord).
///
/// # Example
///
/// ```rust,ignore
/// use chrono::{Duration, Utc};
/// use lp_triage::TriageConfig;
///
/// let config = TriageConfig::new()
///     .with_age_threshold(Utc::now() - Duration::days(2))
///     .with_old_threshold(Utc::now() - Duration::days(180));
/// ```
#[derive(Debug, Clone)]
pub struct TriageConfig {
    /// Bugs updated after this instant count as recently updated
    pub age_threshold: Option<DateTime<Utc>>,
    /// Bugs updated before this instant count as old
    pub old_threshold: Option<DateTime<Utc>>,
    /// Statuses meaning no further work is needed on a task
    pub nowork_statuses: Vec<String>,
    /// Statuses meaning a task is actively open
    pub open_statuses: Vec<String>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            age_threshold: None,
            old_threshold: None,
            nowork_statuses: [
                "Invalid",
                "Opinion",
                "Won't Fix",
                "Expired",
                "Fix Committed",
                "Fix Released",
            ]
            .map(String::from)
            .to_vec(),
            open_statuses: ["New", "Confirmed", "Triaged", "In Progress"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl TriageConfig {
    /// Create a configuration with the conventional Launchpad status sets.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the recently-updated threshold.
    #[must_use]
    pub fn with_age_threshold(mut self, threshold: DateTime<Utc>) -> Self {
        self.age_threshold = Some(threshold);
        self
    }

    /// Set the old threshold.
    #[must_use]
    pub fn with_old_threshold(mut self, threshold: DateTime<Utc>) -> Self {
        self.old_threshold = Some(threshold);
        self
    }

    /// Replace the no-work status set.
    #[must_use]
    pub fn with_nowork_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nowork_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the open status set.
    #[must_use]
    pub fn with_open_statuses<I, S>(mut self, statuses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.open_statuses = statuses.into_iter().map(Into::into).collect();
        self
    }

    /// Whether a status means the task is closed for triage purposes.
    pub fn is_nowork(&self, status: &str) -> bool {
        self.nowork_statuses.iter().any(|s| s == status)
    }

    /// Whether a status means the task is actively open.
    pub fn is_open(&self, status: &str) -> bool {
        self.open_statuses.iter().any(|s| s == status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_default_status_sets() {
        let config = TriageConfig::default();
        assert!(config.is_nowork("Fix Released"));
        assert!(config.is_nowork("Won't Fix"));
        assert!(config.is_open("Triaged"));
        // Incomplete is deliberately in neither set; it renders as pending
        assert!(!config.is_nowork("Incomplete"));
        assert!(!config.is_open("Incomplete"));
    }

    #[test]
    fn test_default_has_no_thresholds() {
        let config = TriageConfig::default();
        assert!(config.age_threshold.is_none());
        assert!(config.old_threshold.is_none());
    }

    #[test]
    fn test_builder_sets_thresholds() {
        let age = Utc::now() - Duration::days(2);
        let old = Utc::now() - Duration::days(180);
        let config = TriageConfig::new()
            .with_age_threshold(age)
            .with_old_threshold(old);
        assert_eq!(config.age_threshold, Some(age));
        assert_eq!(config.old_threshold, Some(old));
    }

    #[test]
    fn test_builder_replaces_status_sets() {
        let config = TriageConfig::new()
            .with_nowork_statuses(["Done"])
            .with_open_statuses(["Fresh"]);
        assert!(config.is_nowork("Done"));
        assert!(!config.is_nowork("Fix Released"));
        assert!(config.is_open("Fresh"));
        assert!(!config.is_open("New"));
    }
}
