//! Text rendering for normalized records.
//!
//! Records arrive with every field populated, so nothing here checks for
//! missing data.

use graph::model::{
    Application, CompliancePolicy, ComplianceSummary, Device, DeviceReport, DeviceReportRow,
    DeviceRing, DeviceRingLookup, ExportJob, Group, RingAssignment, RiskDetection,
    RoleAssignment, SecureScore, SecurityAlert, User,
};

/// `Found <n> <noun>:` followed by the rendered records.
fn found<T>(noun: &str, records: &[T], render: fn(&T) -> String) -> String {
    format!("Found {} {noun}:\n\n{}", records.len(), join(records, render))
}

fn join<T>(records: &[T], render: fn(&T) -> String) -> String {
    records.iter().map(render).collect::<Vec<_>>().join("\n")
}

pub fn not_found(kind: &str, id: &str) -> String {
    format!("{kind} with ID {id} not found.")
}

// --- Devices ---

fn device(device: &Device) -> String {
    format!(
        "📱 {} ({})\n   User: {}\n   Compliance: {}\n   Last Sync: {}\n",
        device.device_name,
        device.operating_system,
        device.email_address,
        device.compliance_state,
        device.last_sync,
    )
}

pub fn device_list(devices: &[Device]) -> String {
    found("devices", devices, device)
}

pub fn device_search(query: &str, devices: &[Device]) -> String {
    format!(
        "Search results for \"{query}\" ({} devices):\n\n{}",
        devices.len(),
        join(devices, device)
    )
}

pub fn device_details(device: &Device) -> String {
    format!(
        "🔍 Device Details:\n\n\
         Name: {}\n\
         ID: {}\n\
         OS: {} {}\n\
         User: {}\n\
         Manufacturer: {}\n\
         Model: {}\n\
         Serial: {}\n\
         Compliance: {}\n\
         Management State: {}\n\
         Enrollment Type: {}\n\
         Last Sync: {}",
        device.device_name,
        device.id,
        device.operating_system,
        device.os_version,
        device.email_address,
        device.manufacturer,
        device.model,
        device.serial_number,
        device.compliance_state,
        device.management_state,
        device.enrollment_type,
        device.last_sync,
    )
}

fn application(app: &Application) -> String {
    format!("📦 {}\n   Publisher: {}", app.display_name, app.publisher)
}

pub fn application_list(apps: &[Application]) -> String {
    found("applications", apps, application)
}

pub fn compliance_summary(summary: &ComplianceSummary) -> String {
    format!(
        "📊 Compliance Summary:\n\n\
         Compliant Devices: {}\n\
         Non-compliant Devices: {}\n\
         Error Devices: {}\n\
         Unknown Devices: {}\n\
         Conflict Devices: {}\n\
         In Grace Period: {}\n\
         Not Applicable: {}",
        summary.compliant,
        summary.non_compliant,
        summary.error,
        summary.unknown,
        summary.conflict,
        summary.in_grace_period,
        summary.not_applicable,
    )
}

// --- Reports ---

const REPORT_HEADER: &str = "DeviceName,UserPrincipalName,ComplianceState,OperatingSystem,LastSyncDateTime";

/// Quote a CSV field when it contains a separator, quote or newline.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn report_row(row: &DeviceReportRow) -> String {
    [
        &row.device_name,
        &row.user_principal_name,
        &row.compliance_state,
        &row.operating_system,
        &row.last_sync,
    ]
    .iter()
    .map(|field| csv_field(field))
    .collect::<Vec<_>>()
    .join(",")
}

fn export_job(job: &ExportJob) -> String {
    format!(
        "📤 Compliance report export {}.\n\nJob ID: {}\nFormat: csv",
        job.status, job.id
    )
}

pub fn device_report(report: &DeviceReport) -> String {
    match report {
        DeviceReport::Devices(rows) => {
            let mut lines = vec![REPORT_HEADER.to_string()];
            lines.extend(rows.iter().map(report_row));
            format!("Device report ({} devices):\n\n{}", rows.len(), lines.join("\n"))
        }
        DeviceReport::Compliance(job) => export_job(job),
    }
}

// --- Rings ---

fn ring(ring: &DeviceRing) -> String {
    format!(
        "🔄 {}\n   Description: {}\n   Assignments: {}\n   Created: {}\n",
        ring.name, ring.description, ring.assignment_count, ring.created,
    )
}

pub fn ring_list(rings: &[DeviceRing]) -> String {
    found("device rings", rings, ring)
}

fn ring_assignment(assignment: &RingAssignment) -> String {
    format!(
        "• {} ({})\n   Last Reported: {}",
        assignment.name, assignment.state, assignment.last_reported,
    )
}

pub fn ring_lookup(lookup: &DeviceRingLookup) -> String {
    if lookup.rings.is_empty() {
        return format!("No ring assignments found for {}.", lookup.device_name);
    }
    format!(
        "🔄 Ring assignments for {} ({}):\n\n{}",
        lookup.device_name,
        lookup.rings.len(),
        join(&lookup.rings, ring_assignment)
    )
}

// --- Directory ---

fn user(user: &User) -> String {
    let status = if user.account_enabled { "Enabled" } else { "Disabled" };
    format!(
        "👤 {} ({})\n   Email: {}\n   Job Title: {}\n   Department: {}\n   Account: {status}\n   Last Sign-In: {}\n",
        user.display_name,
        user.user_principal_name,
        user.mail,
        user.job_title,
        user.department,
        user.last_sign_in,
    )
}

pub fn user_list(users: &[User]) -> String {
    found("users", users, user)
}

pub fn user_search(query: &str, users: &[User]) -> String {
    format!(
        "Search results for \"{query}\" ({} users):\n\n{}",
        users.len(),
        join(users, user)
    )
}

fn group(group: &Group) -> String {
    format!(
        "👥 {}\n   Description: {}\n   Types: {}\n   Membership Rule: {}\n",
        group.display_name, group.description, group.group_types, group.membership_rule,
    )
}

pub fn group_list(groups: &[Group]) -> String {
    found("groups", groups, group)
}

fn role(role: &RoleAssignment) -> String {
    format!(
        "🔑 {} [{}]\n   {}",
        role.display_name, role.kind, role.description
    )
}

pub fn role_list(user_id: &str, roles: &[RoleAssignment]) -> String {
    format!(
        "Found {} roles and groups for user {user_id}:\n\n{}",
        roles.len(),
        join(roles, role)
    )
}

// --- Security ---

fn alert(alert: &SecurityAlert) -> String {
    format!(
        "🚨 [{}] {}\n   Status: {}\n   Category: {}\n   Created: {}\n   {}\n",
        alert.severity, alert.title, alert.status, alert.category, alert.created, alert.description,
    )
}

pub fn alert_list(alerts: &[SecurityAlert]) -> String {
    found("security alerts", alerts, alert)
}

fn risk(risk: &RiskDetection) -> String {
    format!(
        "⚠️ {} ({})\n   User: {} ({})\n   Level: {}\n   State: {}\n   Detected: {}\n",
        risk.risk_type,
        risk.id,
        risk.user_display_name,
        risk.user_id,
        risk.risk_level,
        risk.risk_state,
        risk.detected,
    )
}

pub fn risk_list(risks: &[RiskDetection]) -> String {
    found("risk detections", risks, risk)
}

pub fn secure_score(score: &SecureScore) -> String {
    let percent = if score.max_score > 0.0 {
        score.current_score / score.max_score * 100.0
    } else {
        0.0
    };
    format!(
        "🛡️ Secure Score:\n\n\
         Current Score: {:.1}\n\
         Max Score: {:.1}\n\
         Percentage: {percent:.1}%\n\
         Active Users: {}\n\
         As Of: {}",
        score.current_score, score.max_score, score.active_user_count, score.created,
    )
}

fn compliance_policy(policy: &CompliancePolicy) -> String {
    format!(
        "📋 {}\n   Description: {}\n   Created: {}\n   Last Modified: {}\n",
        policy.display_name, policy.description, policy.created, policy.last_modified,
    )
}

pub fn compliance_policy_list(policies: &[CompliancePolicy]) -> String {
    found("compliance policies", policies, compliance_policy)
}
