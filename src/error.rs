//! Custom error types for lp-triage.
//!
//! This module provides structured error types that distinguish the two
//! skippable per-upload failures of the unapproved-queue scan from hard
//! failures that must propagate to the caller.

use thiserror::Error;

/// Main error type for lp-triage operations
#[derive(Error, Debug)]
pub enum TriageError {
    // =========================================================================
    // Upload Resolution Errors (skippable during the unapproved-queue scan)
    // =========================================================================
    /// Probing a copy-source archive for access failed
    #[error("EPERM: {upload} copy_source_archive attribute")]
    CopyArchivePermission { upload: String },

    /// Upload is neither a direct source nor a resolvable copy
    #[error("Cannot find source for {upload}")]
    UnresolvableSource { upload: String },

    // =========================================================================
    // Data Shape Errors
    // =========================================================================
    /// Task reference path has too few segments to carry identity fields
    #[error("Malformed task link: {link}")]
    MalformedTaskLink { link: String },

    // =========================================================================
    // Collaborator Errors
    // =========================================================================
    /// Launchpad API call failed
    #[error("Launchpad API error: {message}")]
    Api { message: String },

    /// Changes file could not be fetched or parsed
    #[error("Changes file error for {url}: {message}")]
    ChangesFetch { url: String, message: String },

    // =========================================================================
    // Wrapped Errors
    // =========================================================================
    /// HTTP transport error wrapper
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// JSON error wrapper
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl TriageError {
    // =========================================================================
    // Constructor helpers
    // =========================================================================

    /// Create a copy-archive permission error naming the offending upload
    pub fn copy_archive_permission(upload: impl Into<String>) -> Self {
        Self::CopyArchivePermission {
            upload: upload.into(),
        }
    }

    /// Create an unresolvable-source error naming the offending upload
    pub fn unresolvable_source(upload: impl Into<String>) -> Self {
        Self::UnresolvableSource {
            upload: upload.into(),
        }
    }

    /// Create a malformed-task-link error
    pub fn malformed_task_link(link: impl Into<String>) -> Self {
        Self::MalformedTaskLink { link: link.into() }
    }

    /// Create a generic API error
    pub fn api(message: impl Into<String>) -> Self {
        Self::Api {
            message: message.into(),
        }
    }

    /// Create a changes-file error
    pub fn changes_fetch(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChangesFetch {
            url: url.into(),
            message: message.into(),
        }
    }

    // =========================================================================
    // Classification helpers
    // =========================================================================

    /// Check if the unapproved-queue scan may skip the current upload on
    /// this error instead of aborting the whole classification.
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            Self::CopyArchivePermission { .. } | Self::UnresolvableSource { .. }
        )
    }
}

/// Type alias for lp-triage results
pub type Result<T> = std::result::Result<T, TriageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_upload() {
        let err = TriageError::copy_archive_permission("openssh 1:9.6p1 upload");
        assert!(err.to_string().contains("EPERM"));
        assert!(err.to_string().contains("openssh 1:9.6p1 upload"));

        let err = TriageError::unresolvable_source("casper upload");
        assert!(err.to_string().contains("Cannot find source"));
        assert!(err.to_string().contains("casper upload"));
    }

    #[test]
    fn test_is_skippable() {
        assert!(TriageError::copy_archive_permission("u").is_skippable());
        assert!(TriageError::unresolvable_source("u").is_skippable());
        assert!(!TriageError::api("down").is_skippable());
        assert!(!TriageError::changes_fetch("http://x", "404").is_skippable());
        assert!(!TriageError::malformed_task_link("bad").is_skippable());
    }

    #[test]
    fn test_malformed_task_link_display() {
        let err = TriageError::malformed_task_link("https://short");
        assert!(err.to_string().contains("https://short"));
    }

    #[test]
    fn test_changes_fetch_display() {
        let err = TriageError::changes_fetch("http://lp/x.changes", "timed out");
        let text = err.to_string();
        assert!(text.contains("http://lp/x.changes"));
        assert!(text.contains("timed out"));
    }
}
