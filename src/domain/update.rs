//! Pending package updates reported by a host

use serde::{Deserialize, Serialize};

/// Update available for a single package installed on a host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageUpdate {
    /// Name of the package
    pub package: String,
    /// Version currently installed on the host
    pub current_version: String,
    /// Version the package could be upgraded to
    pub candidate_version: String,
    /// Security advisory identifiers resolved by the upgrade
    #[serde(default)]
    pub advisories: Vec<String>,
}

/// Ordered list of updates extracted from one report
///
/// The order matches the report and is preserved all the way to the
/// published evaluation request.
pub type UpdateSet = Vec<PackageUpdate>;
