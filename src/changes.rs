//! Changes file retrieval and bug extraction.
//!
//! An upload's `.changes` file declares the bugs it fixes in its
//! `Launchpad-Bugs-Fixed` field. The unapproved-queue scan downloads the
//! file and checks whether the record's bug number is among them.
//!
//! # Example
//!
//! ```rust,ignore
//! use lp_triage::changes::{ChangesFetcher, HttpChangesFetcher};
//!
//! let fetcher = HttpChangesFetcher::new();
//! let changes = fetcher.fetch("https://launchpad.net/.../x.changes")?;
//! if changes.bugs_fixed().iter().any(|b| b == "1880699") {
//!     // upload closes our bug
//! }
//! ```

use indexmap::IndexMap;

use crate::error::{Result, TriageError};

/// Field carrying the whitespace-separated fixed bug numbers.
const BUGS_FIXED_FIELD: &str = "Launchpad-Bugs-Fixed";

/// One parsed Debian changes control paragraph.
///
/// Only the flat `Key: value` structure is modelled; multi-paragraph input
/// stops at the first blank line after fields began, and continuation lines
/// fold into the preceding field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangesFile {
    fields: IndexMap<String, String>,
}

impl ChangesFile {
    /// Create an empty changes file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field, builder style. Intended for tests and mocks.
    #[must_use]
    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    /// Parse changes-file text into fields.
    ///
    /// Lines starting with whitespace continue the previous field, per
    /// control-file syntax. Clearsigned files are handled: the armor
    /// preamble (through its blank line) and everything from the signature
    /// on are ignored.
    pub fn parse(text: &str) -> Self {
        let mut fields: IndexMap<String, String> = IndexMap::new();
        let mut current: Option<String> = None;
        let mut in_armor_preamble = false;

        for line in text.lines() {
            if line.starts_with("-----BEGIN PGP SIGNED MESSAGE-----") {
                in_armor_preamble = true;
                continue;
            }
            if line.starts_with("-----BEGIN PGP SIGNATURE-----") {
                break;
            }
            if in_armor_preamble {
                // Armor hash headers run until the first blank line
                if line.trim().is_empty() {
                    in_armor_preamble = false;
                }
                continue;
            }
            if line.trim().is_empty() {
                if !fields.is_empty() {
                    break;
                }
                continue;
            }
            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some(name) = &current {
                    if let Some(value) = fields.get_mut(name) {
                        value.push('\n');
                        value.push_str(line.trim());
                    }
                }
                continue;
            }
            if let Some((name, value)) = line.split_once(':') {
                // Field names never contain spaces; anything else (e.g. PGP
                // armor) is not a field line.
                if name.contains(' ') {
                    current = None;
                    continue;
                }
                fields.insert(name.to_string(), value.trim().to_string());
                current = Some(name.to_string());
            } else {
                current = None;
            }
        }

        Self { fields }
    }

    /// Look up a field by name, case-insensitively as control files are.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Bug numbers this upload declares fixed. Absent field means none.
    pub fn bugs_fixed(&self) -> Vec<String> {
        self.field(BUGS_FIXED_FIELD)
            .map(|value| value.split_whitespace().map(String::from).collect())
            .unwrap_or_default()
    }
}

/// Retrieves changes files by URL.
///
/// Abstracted so the unapproved-queue scan is testable without the network;
/// see [`MockChangesFetcher`](crate::testing::MockChangesFetcher).
pub trait ChangesFetcher {
    /// Download and parse the changes file at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure; no retries are attempted.
    fn fetch(&self, url: &str) -> Result<ChangesFile>;
}

/// Blocking HTTP implementation of [`ChangesFetcher`].
#[derive(Debug, Default)]
pub struct HttpChangesFetcher {
    client: reqwest::blocking::Client,
}

impl HttpChangesFetcher {
    /// Create a fetcher with a default client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangesFetcher for HttpChangesFetcher {
    fn fetch(&self, url: &str) -> Result<ChangesFile> {
        let response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(TriageError::changes_fetch(
                url,
                format!("HTTP {}", response.status()),
            ));
        }
        let body = response.text()?;
        Ok(ChangesFile::parse(&body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Format: 1.8
Date: Mon, 04 May 2026 10:00:00 +0200
Source: openssh
Version: 1:9.6p1-3ubuntu1.1
Distribution: jammy
Urgency: medium
Changed-By: Some Uploader <uploader@example.com>
Launchpad-Bugs-Fixed: 1880699 1893716
Changes:
 openssh (1:9.6p1-3ubuntu1.1) jammy; urgency=medium
 .
   * Fix host key rotation (LP: #1880699)
";

    // ========================================================================
    // Parsing Tests
    // ========================================================================

    #[test]
    fn test_parse_extracts_fields() {
        let changes = ChangesFile::parse(SAMPLE);
        assert_eq!(changes.field("Source"), Some("openssh"));
        assert_eq!(changes.field("Distribution"), Some("jammy"));
    }

    #[test]
    fn test_parse_folds_continuation_lines() {
        let changes = ChangesFile::parse(SAMPLE);
        let body = changes.field("Changes").unwrap();
        assert!(body.contains("urgency=medium"));
        assert!(body.contains("host key rotation"));
    }

    #[test]
    fn test_field_lookup_is_case_insensitive() {
        let changes = ChangesFile::parse(SAMPLE);
        assert_eq!(
            changes.field("launchpad-bugs-fixed"),
            Some("1880699 1893716")
        );
    }

    #[test]
    fn test_parse_handles_clearsigned_files() {
        let armored = format!(
            "-----BEGIN PGP SIGNED MESSAGE-----\nHash: SHA512\n\n{SAMPLE}\n\
             -----BEGIN PGP SIGNATURE-----\n\niQIzBAEBCgAdFiEE\n\
             -----END PGP SIGNATURE-----\n"
        );
        let changes = ChangesFile::parse(&armored);
        assert_eq!(changes.field("Source"), Some("openssh"));
        assert_eq!(changes.bugs_fixed(), vec!["1880699", "1893716"]);
        // Armor hash headers never become fields
        assert_eq!(changes.field("Hash"), None);
    }

    // ========================================================================
    // bugs_fixed Tests
    // ========================================================================

    #[test]
    fn test_bugs_fixed_splits_on_whitespace() {
        let changes = ChangesFile::parse(SAMPLE);
        assert_eq!(changes.bugs_fixed(), vec!["1880699", "1893716"]);
    }

    #[test]
    fn test_bugs_fixed_absent_field_is_empty() {
        let changes = ChangesFile::new().with_field("Source", "openssh");
        assert!(changes.bugs_fixed().is_empty());
    }

    #[test]
    fn test_with_field_builder() {
        let changes = ChangesFile::new().with_field("Launchpad-Bugs-Fixed", "42");
        assert_eq!(changes.bugs_fixed(), vec!["42"]);
    }
}
