//! Raw upstream records and their normalization.
//!
//! Raw types mirror the Graph payloads with every field optional. Each one
//! converts into its normalized counterpart in [`crate::model`].

use serde::Deserialize;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde_json::Value;

use crate::error::{GraphError, Result};
use crate::model::{
    Application, CompliancePolicy, ComplianceSummary, Device, DeviceReportRow, DeviceRing,
    ExportJob, EXPORT_INITIATED, Group, NO_DESCRIPTION, NO_MEMBERSHIP_RULE, RingAssignment,
    RiskDetection, RoleAssignment, SecureScore, SecurityAlert, UNKNOWN, User,
};

/// Decode one raw record.
pub(crate) fn decode<R: DeserializeOwned>(value: Value) -> Result<R> {
    serde_json::from_value(value).map_err(|e| GraphError::InvalidResponse(e.to_string()))
}

/// Decode and normalize every record of a collection.
pub(crate) fn normalize_all<R, N>(values: Vec<Value>) -> Result<Vec<N>>
where
    R: DeserializeOwned,
    N: From<R>,
{
    values
        .into_iter()
        .map(|value| decode::<R>(value).map(N::from))
        .collect()
}

fn text(value: Option<String>) -> String {
    or(value, UNKNOWN)
}

fn or(value: Option<String>, placeholder: &str) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDevice {
    pub id: Option<String>,
    pub device_name: Option<String>,
    pub operating_system: Option<String>,
    pub os_version: Option<String>,
    pub email_address: Option<String>,
    pub user_id: Option<String>,
    pub device_enrollment_type: Option<String>,
    pub management_state: Option<String>,
    pub compliance_state: Option<String>,
    pub last_sync_date_time: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

impl From<RawDevice> for Device {
    fn from(raw: RawDevice) -> Self {
        Self {
            id: text(raw.id),
            device_name: text(raw.device_name),
            operating_system: text(raw.operating_system),
            os_version: text(raw.os_version),
            email_address: text(raw.email_address),
            user_id: text(raw.user_id),
            enrollment_type: text(raw.device_enrollment_type),
            management_state: text(raw.management_state),
            compliance_state: text(raw.compliance_state),
            last_sync: text(raw.last_sync_date_time),
            manufacturer: text(raw.manufacturer),
            model: text(raw.model),
            serial_number: text(raw.serial_number),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawReportRow {
    pub device_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub compliance_state: Option<String>,
    pub operating_system: Option<String>,
    pub last_sync_date_time: Option<String>,
}

impl From<RawReportRow> for DeviceReportRow {
    fn from(raw: RawReportRow) -> Self {
        Self {
            device_name: text(raw.device_name),
            user_principal_name: text(raw.user_principal_name),
            compliance_state: text(raw.compliance_state),
            operating_system: text(raw.operating_system),
            last_sync: text(raw.last_sync_date_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawExportJob {
    pub id: Option<String>,
    pub status: Option<String>,
}

impl From<RawExportJob> for ExportJob {
    fn from(raw: RawExportJob) -> Self {
        Self {
            id: text(raw.id),
            status: or(raw.status, EXPORT_INITIATED),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawApplication {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub publisher: Option<String>,
}

impl From<RawApplication> for Application {
    fn from(raw: RawApplication) -> Self {
        Self {
            id: text(raw.id),
            display_name: text(raw.display_name),
            publisher: text(raw.publisher),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawComplianceSummary {
    pub compliant_device_count: Option<u64>,
    pub non_compliant_device_count: Option<u64>,
    pub error_device_count: Option<u64>,
    pub unknown_device_count: Option<u64>,
    pub conflict_device_count: Option<u64>,
    pub in_grace_period_count: Option<u64>,
    pub not_applicable_device_count: Option<u64>,
}

impl From<RawComplianceSummary> for ComplianceSummary {
    fn from(raw: RawComplianceSummary) -> Self {
        Self {
            compliant: raw.compliant_device_count.unwrap_or(0),
            non_compliant: raw.non_compliant_device_count.unwrap_or(0),
            error: raw.error_device_count.unwrap_or(0),
            unknown: raw.unknown_device_count.unwrap_or(0),
            conflict: raw.conflict_device_count.unwrap_or(0),
            in_grace_period: raw.in_grace_period_count.unwrap_or(0),
            not_applicable: raw.not_applicable_device_count.unwrap_or(0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDeviceConfiguration {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub created_date_time: Option<String>,
    pub assignments: Option<Vec<IgnoredAny>>,
}

impl From<RawDeviceConfiguration> for DeviceRing {
    fn from(raw: RawDeviceConfiguration) -> Self {
        Self {
            id: text(raw.id),
            name: text(raw.display_name),
            description: or(raw.description, NO_DESCRIPTION),
            assignment_count: raw.assignments.map_or(0, |a| a.len()),
            created: text(raw.created_date_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawConfigurationState {
    pub display_name: Option<String>,
    pub state: Option<String>,
    pub last_reported_date_time: Option<String>,
}

impl From<RawConfigurationState> for RingAssignment {
    fn from(raw: RawConfigurationState) -> Self {
        Self {
            name: text(raw.display_name),
            state: text(raw.state),
            last_reported: text(raw.last_reported_date_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSignInActivity {
    pub last_sign_in_date_time: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawUser {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub mail: Option<String>,
    pub job_title: Option<String>,
    pub department: Option<String>,
    pub account_enabled: Option<bool>,
    pub sign_in_activity: Option<RawSignInActivity>,
}

impl From<RawUser> for User {
    fn from(raw: RawUser) -> Self {
        Self {
            id: text(raw.id),
            display_name: text(raw.display_name),
            user_principal_name: text(raw.user_principal_name),
            mail: text(raw.mail),
            job_title: text(raw.job_title),
            department: text(raw.department),
            account_enabled: raw.account_enabled.unwrap_or(false),
            last_sign_in: text(raw.sign_in_activity.and_then(|a| a.last_sign_in_date_time)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawGroup {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub group_types: Option<Vec<String>>,
    pub membership_rule: Option<String>,
}

impl From<RawGroup> for Group {
    fn from(raw: RawGroup) -> Self {
        let group_types = raw
            .group_types
            .filter(|types| !types.is_empty())
            .map(|types| types.join(", "));

        Self {
            id: text(raw.id),
            display_name: text(raw.display_name),
            description: or(raw.description, NO_DESCRIPTION),
            group_types: text(group_types),
            membership_rule: or(raw.membership_rule, NO_MEMBERSHIP_RULE),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawDirectoryObject {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    #[serde(rename = "@odata.type")]
    pub odata_type: Option<String>,
}

impl From<RawDirectoryObject> for RoleAssignment {
    fn from(raw: RawDirectoryObject) -> Self {
        let kind = raw
            .odata_type
            .map(|t| t.trim_start_matches("#microsoft.graph.").to_string());

        Self {
            id: text(raw.id),
            display_name: text(raw.display_name),
            description: or(raw.description, NO_DESCRIPTION),
            kind: text(kind),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawAlert {
    pub id: Option<String>,
    pub title: Option<String>,
    pub severity: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub created_date_time: Option<String>,
    pub description: Option<String>,
}

impl From<RawAlert> for SecurityAlert {
    fn from(raw: RawAlert) -> Self {
        Self {
            id: text(raw.id),
            title: text(raw.title),
            severity: text(raw.severity),
            status: text(raw.status),
            category: text(raw.category),
            created: text(raw.created_date_time),
            description: or(raw.description, NO_DESCRIPTION),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRiskDetection {
    pub id: Option<String>,
    pub user_id: Option<String>,
    pub user_display_name: Option<String>,
    pub risk_event_type: Option<String>,
    /// Older payloads name the event type `riskType`; beta sends both.
    pub risk_type: Option<String>,
    pub risk_level: Option<String>,
    pub risk_state: Option<String>,
    pub detected_date_time: Option<String>,
}

impl From<RawRiskDetection> for RiskDetection {
    fn from(raw: RawRiskDetection) -> Self {
        Self {
            id: text(raw.id),
            user_id: text(raw.user_id),
            user_display_name: text(raw.user_display_name),
            risk_type: text(
                raw.risk_event_type
                    .filter(|s| !s.trim().is_empty())
                    .or(raw.risk_type),
            ),
            risk_level: text(raw.risk_level),
            risk_state: text(raw.risk_state),
            detected: text(raw.detected_date_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawSecureScore {
    pub current_score: Option<f64>,
    pub max_score: Option<f64>,
    pub active_user_count: Option<u64>,
    pub created_date_time: Option<String>,
}

impl From<RawSecureScore> for SecureScore {
    fn from(raw: RawSecureScore) -> Self {
        Self {
            current_score: raw.current_score.unwrap_or(0.0),
            max_score: raw.max_score.unwrap_or(0.0),
            active_user_count: raw.active_user_count.unwrap_or(0),
            created: text(raw.created_date_time),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawCompliancePolicy {
    pub id: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub created_date_time: Option<String>,
    pub last_modified_date_time: Option<String>,
}

impl From<RawCompliancePolicy> for CompliancePolicy {
    fn from(raw: RawCompliancePolicy) -> Self {
        Self {
            id: text(raw.id),
            display_name: text(raw.display_name),
            description: or(raw.description, NO_DESCRIPTION),
            created: text(raw.created_date_time),
            last_modified: text(raw.last_modified_date_time),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_device_is_all_placeholders() {
        let device: Device = decode::<RawDevice>(json!({})).map(Device::from).unwrap();
        assert_eq!(device.id, UNKNOWN);
        assert_eq!(device.device_name, UNKNOWN);
        assert_eq!(device.serial_number, UNKNOWN);
        assert_eq!(device.last_sync, UNKNOWN);
    }

    #[test]
    fn null_and_blank_fields_become_placeholders() {
        let device = Device::from(
            decode::<RawDevice>(json!({
                "deviceName": null,
                "model": "  ",
                "manufacturer": "Dell"
            }))
            .unwrap(),
        );
        assert_eq!(device.device_name, UNKNOWN);
        assert_eq!(device.model, UNKNOWN);
        assert_eq!(device.manufacturer, "Dell");
    }

    #[test]
    fn user_sign_in_comes_from_activity() {
        let users: Vec<User> = normalize_all::<RawUser, User>(vec![
            json!({"displayName": "Ada", "signInActivity": {"lastSignInDateTime": "2024-05-01T10:00:00Z"}}),
            json!({"displayName": "Bob"}),
        ])
        .unwrap();
        assert_eq!(users[0].last_sign_in, "2024-05-01T10:00:00Z");
        assert_eq!(users[1].last_sign_in, UNKNOWN);
        assert!(!users[1].account_enabled);
    }

    #[test]
    fn group_without_types_or_rule() {
        let group = Group::from(decode::<RawGroup>(json!({"groupTypes": []})).unwrap());
        assert_eq!(group.group_types, UNKNOWN);
        assert_eq!(group.membership_rule, NO_MEMBERSHIP_RULE);
        assert_eq!(group.description, NO_DESCRIPTION);
    }

    #[test]
    fn group_types_are_joined() {
        let group = Group::from(
            decode::<RawGroup>(json!({"groupTypes": ["Unified", "DynamicMembership"]})).unwrap(),
        );
        assert_eq!(group.group_types, "Unified, DynamicMembership");
    }

    #[test]
    fn role_kind_strips_namespace() {
        let role = RoleAssignment::from(
            decode::<RawDirectoryObject>(json!({
                "@odata.type": "#microsoft.graph.directoryRole",
                "displayName": "Global Reader"
            }))
            .unwrap(),
        );
        assert_eq!(role.kind, "directoryRole");
        assert_eq!(role.description, NO_DESCRIPTION);
    }

    #[test]
    fn alert_description_placeholder() {
        let alert = SecurityAlert::from(RawAlert::default());
        assert_eq!(alert.description, NO_DESCRIPTION);
        assert_eq!(alert.severity, UNKNOWN);
    }

    #[test]
    fn risk_type_accepts_either_name() {
        let a = RiskDetection::from(decode::<RawRiskDetection>(json!({"riskEventType": "unfamiliarFeatures"})).unwrap());
        let b = RiskDetection::from(decode::<RawRiskDetection>(json!({"riskType": "leakedCredentials"})).unwrap());
        assert_eq!(a.risk_type, "unfamiliarFeatures");
        assert_eq!(b.risk_type, "leakedCredentials");
    }

    #[test]
    fn risk_type_with_both_names_prefers_event_type() {
        let risk = RiskDetection::from(
            decode::<RawRiskDetection>(json!({
                "riskEventType": "unfamiliarFeatures",
                "riskType": "generic",
            }))
            .unwrap(),
        );
        assert_eq!(risk.risk_type, "unfamiliarFeatures");
    }

    #[test]
    fn compliance_counts_default_to_zero() {
        let summary = ComplianceSummary::from(
            decode::<RawComplianceSummary>(json!({"compliantDeviceCount": 12})).unwrap(),
        );
        assert_eq!(summary.compliant, 12);
        assert_eq!(summary.non_compliant, 0);
        assert_eq!(summary.in_grace_period, 0);
    }

    #[test]
    fn ring_counts_expanded_assignments() {
        let ring = DeviceRing::from(
            decode::<RawDeviceConfiguration>(json!({
                "displayName": "Ring 0 - Pilot",
                "assignments": [{"id": "a"}, {"id": "b"}]
            }))
            .unwrap(),
        );
        assert_eq!(ring.assignment_count, 2);
        assert_eq!(DeviceRing::from(RawDeviceConfiguration::default()).assignment_count, 0);
    }

    #[test]
    fn export_job_status_defaults_to_initiated() {
        let job = ExportJob::from(decode::<RawExportJob>(json!({"id": "job-1"})).unwrap());
        assert_eq!(job.id, "job-1");
        assert_eq!(job.status, EXPORT_INITIATED);
    }

    #[test]
    fn secure_score_defaults() {
        let score = SecureScore::from(RawSecureScore::default());
        assert_eq!(score.current_score, 0.0);
        assert_eq!(score.created, UNKNOWN);
    }

    #[test]
    fn wrong_shape_is_invalid_response() {
        let err = decode::<RawDevice>(json!({"deviceName": 42})).unwrap_err();
        assert!(matches!(err, GraphError::InvalidResponse(_)));
    }
}
