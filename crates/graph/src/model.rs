//! Normalized records.
//!
//! Every field of every record is always populated. Adapters substitute the
//! placeholders below for anything the upstream omitted, so formatting code
//! never has to ask whether a field exists.

use std::fmt;
use std::str::FromStr;

/// Placeholder for missing text fields.
pub const UNKNOWN: &str = "Unknown";

/// Placeholder for missing descriptions.
pub const NO_DESCRIPTION: &str = "No description";

/// Placeholder for a group without a dynamic membership rule.
pub const NO_MEMBERSHIP_RULE: &str = "None";

/// Status reported for an export job the upstream did not describe.
pub const EXPORT_INITIATED: &str = "initiated";

/// An Intune managed device.
#[derive(Debug, Clone, PartialEq)]
pub struct Device {
    pub id: String,
    pub device_name: String,
    pub operating_system: String,
    pub os_version: String,
    pub email_address: String,
    pub user_id: String,
    pub enrollment_type: String,
    pub management_state: String,
    pub compliance_state: String,
    pub last_sync: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

/// An Intune mobile app.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    pub id: String,
    pub display_name: String,
    pub publisher: String,
}

/// A directory user.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: String,
    pub display_name: String,
    pub user_principal_name: String,
    pub mail: String,
    pub job_title: String,
    pub department: String,
    pub account_enabled: bool,
    pub last_sign_in: String,
}

/// A directory group.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Comma-separated group types, or [`UNKNOWN`] when none are set.
    pub group_types: String,
    pub membership_rule: String,
}

/// A role or group the user is a member of.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAssignment {
    pub id: String,
    pub display_name: String,
    pub description: String,
    /// Directory object kind, e.g. `directoryRole` or `group`.
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SecurityAlert {
    pub id: String,
    pub title: String,
    pub severity: String,
    pub status: String,
    pub category: String,
    pub created: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskDetection {
    pub id: String,
    pub user_id: String,
    pub user_display_name: String,
    pub risk_type: String,
    pub risk_level: String,
    pub risk_state: String,
    pub detected: String,
}

/// Device counts per compliance state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComplianceSummary {
    pub compliant: u64,
    pub non_compliant: u64,
    pub error: u64,
    pub unknown: u64,
    pub conflict: u64,
    pub in_grace_period: u64,
    pub not_applicable: u64,
}

/// The tenant's most recent Secure Score.
#[derive(Debug, Clone, PartialEq)]
pub struct SecureScore {
    pub current_score: f64,
    pub max_score: f64,
    pub active_user_count: u64,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompliancePolicy {
    pub id: String,
    pub display_name: String,
    pub description: String,
    pub created: String,
    pub last_modified: String,
}

/// A device configuration recognized as a deployment ring.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub assignment_count: usize,
    pub created: String,
}

/// A ring configuration's state on one device.
#[derive(Debug, Clone, PartialEq)]
pub struct RingAssignment {
    pub name: String,
    pub state: String,
    pub last_reported: String,
}

/// Ring assignments of a single device.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceRingLookup {
    pub device_name: String,
    pub rings: Vec<RingAssignment>,
}

/// One row of the device export.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceReportRow {
    pub device_name: String,
    pub user_principal_name: String,
    pub compliance_state: String,
    pub operating_system: String,
    pub last_sync: String,
}

/// A server-side export job.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportJob {
    pub id: String,
    pub status: String,
}

/// Which device report to export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportKind {
    #[default]
    Devices,
    Compliance,
}

impl ReportKind {
    pub const ALL: [ReportKind; 2] = [ReportKind::Devices, ReportKind::Compliance];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Devices => "devices",
            ReportKind::Compliance => "compliance",
        }
    }
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown report type: {s}"))
    }
}

/// Result of an export request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceReport {
    /// Rows returned inline.
    Devices(Vec<DeviceReportRow>),
    /// A job started on the server; the file is produced asynchronously.
    Compliance(ExportJob),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_kind_parses_known_names() {
        assert_eq!("devices".parse::<ReportKind>(), Ok(ReportKind::Devices));
        assert_eq!("compliance".parse::<ReportKind>(), Ok(ReportKind::Compliance));
        assert!("Devices".parse::<ReportKind>().is_err());
    }

    #[test]
    fn default_report_is_devices() {
        assert_eq!(ReportKind::default(), ReportKind::Devices);
    }
}
