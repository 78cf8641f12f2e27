//! Extraction of package updates from unpacked archives

use crate::domain::archive::ArchiveContent;
use crate::domain::update::UpdateSet;
use crate::library::communication::CauseChain;
use crate::library::BoxedError;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// Parser turning an unpacked archive into a set of package updates
///
/// The parser is treated as a black box. Any error it reports sends the
/// record to the dead letter stream, so implementations are free to fail on
/// whatever they consider malformed.
pub trait UpdateReportParser: Send + Sync {
    /// Extracts the updates contained in the archive
    fn parse(&self, archive: &ArchiveContent) -> Result<UpdateSet, BoxedError>;
}

/// Error describing a failed update extraction
#[derive(Debug, Error)]
#[error("update metadata extraction failed")]
pub struct ParseError {
    #[source]
    cause: CauseChain,
}

/// Extracts updates through a configured [`UpdateReportParser`]
pub struct UpdateExtractor {
    parser: Arc<dyn UpdateReportParser>,
}

impl UpdateExtractor {
    /// Creates a new extractor delegating to the given parser
    pub fn new(parser: Arc<dyn UpdateReportParser>) -> Self {
        Self { parser }
    }

    /// Extracts the updates contained in the archive
    pub fn extract(&self, archive: &ArchiveContent) -> Result<UpdateSet, ParseError> {
        self.parser.parse(archive).map_err(|e| ParseError {
            cause: CauseChain::from_boxed(e),
        })
    }
}

/// Errors reported by the bundled [`JsonReportParser`]
#[derive(Debug, Error)]
pub enum JsonReportError {
    /// The archive does not contain the update report
    #[error("update report `{0}` not present in archive")]
    ReportMissing(String),
    /// The update report exists but does not parse
    #[error("update report is not valid JSON")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct UpdateReport {
    updates: UpdateSet,
}

/// Parser for the JSON update report produced by the host agent
///
/// Looks for the report at the configured path, either at the archive root
/// or nested below a top-level directory.
pub struct JsonReportParser {
    report_path: String,
}

impl JsonReportParser {
    /// Creates a new parser reading the report from the given path
    pub fn new<S: Into<String>>(report_path: S) -> Self {
        Self {
            report_path: report_path.into(),
        }
    }
}

impl UpdateReportParser for JsonReportParser {
    fn parse(&self, archive: &ArchiveContent) -> Result<UpdateSet, BoxedError> {
        let nested = format!("/{}", self.report_path);
        let data = archive
            .file(&self.report_path)
            .or_else(|| archive.file_with_suffix(&nested))
            .ok_or_else(|| JsonReportError::ReportMissing(self.report_path.clone()))?;

        let report: UpdateReport =
            serde_json::from_slice(data).map_err(JsonReportError::Malformed)?;

        Ok(report.updates)
    }
}

#[cfg(test)]
mod does {
    use super::*;
    use crate::domain::update::PackageUpdate;

    const REPORT: &str = r#"{
        "updates": [
            {
                "package": "openssl",
                "current_version": "1.1.1k",
                "candidate_version": "1.1.1l",
                "advisories": ["RHSA-2021:3798"]
            },
            {
                "package": "curl",
                "current_version": "7.76.0",
                "candidate_version": "7.79.1",
                "advisories": []
            }
        ]
    }"#;

    fn extractor() -> UpdateExtractor {
        UpdateExtractor::new(Arc::new(JsonReportParser::new("update_report.json")))
    }

    #[test]
    fn parse_a_report_at_the_archive_root() {
        let mut archive = ArchiveContent::default();
        archive.insert("update_report.json", REPORT.as_bytes().to_vec());

        let updates = extractor().extract(&archive).unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates[0],
            PackageUpdate {
                package: "openssl".into(),
                current_version: "1.1.1k".into(),
                candidate_version: "1.1.1l".into(),
                advisories: vec!["RHSA-2021:3798".into()],
            }
        );
    }

    #[test]
    fn parse_a_nested_report() {
        let mut archive = ArchiveContent::default();
        archive.insert("host-1234/update_report.json", REPORT.as_bytes().to_vec());

        let updates = extractor().extract(&archive).unwrap();

        assert_eq!(updates.len(), 2);
    }

    #[test]
    fn preserve_report_order() {
        let mut archive = ArchiveContent::default();
        archive.insert("update_report.json", REPORT.as_bytes().to_vec());

        let updates = extractor().extract(&archive).unwrap();
        let packages = updates.iter().map(|u| u.package.as_str()).collect::<Vec<_>>();

        assert_eq!(packages, vec!["openssl", "curl"]);
    }

    #[test]
    fn tolerate_an_empty_update_list() {
        let mut archive = ArchiveContent::default();
        archive.insert("update_report.json", br#"{"updates":[]}"#.to_vec());

        let updates = extractor().extract(&archive).unwrap();

        assert!(updates.is_empty());
    }

    #[test]
    fn fail_on_a_missing_report() {
        let mut archive = ArchiveContent::default();
        archive.insert("os-release", b"Linux".to_vec());

        let error = extractor().extract(&archive).unwrap_err();

        assert!(CauseChain::capture(&error)
            .to_string()
            .contains("not present in archive"));
    }

    #[test]
    fn fail_on_a_malformed_report() {
        let mut archive = ArchiveContent::default();
        archive.insert("update_report.json", b"[not a report]".to_vec());

        assert!(extractor().extract(&archive).is_err());
    }

    #[test]
    fn not_mistake_similarly_named_files_for_the_report() {
        let mut archive = ArchiveContent::default();
        archive.insert("not_an_update_report.json", REPORT.as_bytes().to_vec());

        assert!(extractor().extract(&archive).is_err());
    }
}
