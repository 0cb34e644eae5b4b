//! Tool dispatch: name lookup, argument validation, adapter call, rendering.

use std::sync::Arc;

use graph::model::ReportKind;
use graph::{DeviceService, DirectoryService, GraphApi, SecurityService};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::args::{Arguments, validate};
use crate::catalogue::{Catalogue, Operation, ToolDescriptor};
use crate::error::{Result, ToolError};
use crate::format;

/// One request to execute a named tool.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub tool_name: String,
    pub arguments: Map<String, Value>,
}

impl Invocation {
    pub fn new(tool_name: impl Into<String>, arguments: Map<String, Value>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments,
        }
    }

    /// An invocation with no arguments.
    pub fn bare(tool_name: impl Into<String>) -> Self {
        Self::new(tool_name, Map::new())
    }
}

impl From<mcp::CallToolParams> for Invocation {
    fn from(params: mcp::CallToolParams) -> Self {
        Self::new(params.name, params.arguments.unwrap_or_default())
    }
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Envelope {
    Success { text: String },
    Failure { text: String },
}

impl Envelope {
    pub fn text(&self) -> &str {
        match self {
            Envelope::Success { text } | Envelope::Failure { text } => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Envelope::Failure { .. })
    }
}

impl From<Envelope> for mcp::CallToolResult {
    fn from(envelope: Envelope) -> Self {
        match envelope {
            Envelope::Success { text } => mcp::CallToolResult::text(text),
            Envelope::Failure { text } => mcp::CallToolResult::error(text),
        }
    }
}

/// Routes invocations to the Graph adapters.
///
/// Holds no per-request state. All adapters share one upstream client.
pub struct Dispatcher<C> {
    catalogue: Catalogue,
    devices: DeviceService<C>,
    directory: DirectoryService<C>,
    security: SecurityService<C>,
}

impl<C: GraphApi> Dispatcher<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            catalogue: Catalogue::standard(),
            devices: DeviceService::new(client.clone()),
            directory: DirectoryService::new(client.clone()),
            security: SecurityService::new(client),
        }
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn list_tools(&self) -> &[ToolDescriptor] {
        self.catalogue.tools()
    }

    /// Execute an invocation. Every error is turned into a failure envelope here.
    pub async fn dispatch(&self, invocation: Invocation) -> Envelope {
        match self.try_dispatch(&invocation).await {
            Ok(text) => Envelope::Success { text },
            Err(e) => {
                if e.is_validation() {
                    warn!(tool = %invocation.tool_name, error = %e, "rejected tool call");
                } else {
                    warn!(tool = %invocation.tool_name, error = %e, "tool call failed");
                }
                Envelope::Failure {
                    text: e.to_string(),
                }
            }
        }
    }

    async fn try_dispatch(&self, invocation: &Invocation) -> Result<String> {
        let descriptor = self
            .catalogue
            .find(&invocation.tool_name)
            .ok_or_else(|| ToolError::UnknownTool(invocation.tool_name.clone()))?;

        let args = validate(&descriptor.arguments, &invocation.arguments)?;

        info!(tool = descriptor.name, "calling tool");
        self.run(descriptor.operation, &args)
            .await
            .map_err(|source| ToolError::Upstream {
                tool: descriptor.name,
                source,
            })
    }

    async fn run(&self, operation: Operation, args: &Arguments) -> graph::Result<String> {
        let text = match operation {
            Operation::ListDevices => format::device_list(&self.devices.list_devices().await?),
            Operation::SearchDevices => {
                let query = args.text("query");
                format::device_search(query, &self.devices.search_devices(query).await?)
            }
            Operation::GetDevice => {
                let id = args.text("deviceId");
                match self.devices.get_device(id).await? {
                    Some(device) => format::device_details(&device),
                    None => format::not_found("Device", id),
                }
            }
            Operation::ListApplications => {
                format::application_list(&self.devices.list_applications().await?)
            }
            Operation::ComplianceReport => {
                format::compliance_summary(&self.devices.compliance_summary().await?)
            }
            Operation::ExportReport => {
                let kind = args
                    .get("reportType")
                    .and_then(|s| s.parse::<ReportKind>().ok())
                    .unwrap_or_default();
                format::device_report(&self.devices.export_report(kind).await?)
            }
            Operation::ListRings => format::ring_list(&self.devices.list_rings().await?),
            Operation::LookupRing => {
                let id = args.text("deviceId");
                match self.devices.lookup_ring(id).await? {
                    Some(lookup) => format::ring_lookup(&lookup),
                    None => format::not_found("Device", id),
                }
            }
            Operation::ListUsers => format::user_list(&self.directory.list_users().await?),
            Operation::SearchUsers => {
                let query = args.text("query");
                format::user_search(query, &self.directory.search_users(query).await?)
            }
            Operation::ListGroups => format::group_list(&self.directory.list_groups().await?),
            Operation::UserRoles => {
                let id = args.text("userId");
                match self.directory.user_roles(id).await? {
                    Some(roles) => format::role_list(id, &roles),
                    None => format::not_found("User", id),
                }
            }
            Operation::ListAlerts => format::alert_list(&self.security.list_alerts().await?),
            Operation::ListRiskDetections => {
                format::risk_list(&self.security.list_risk_detections().await?)
            }
            Operation::SecureScore => format::secure_score(&self.security.secure_score().await?),
            Operation::CompliancePolicies => {
                format::compliance_policy_list(&self.security.list_compliance_policies().await?)
            }
        };
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graph::testing::{FakeGraph, Reply};
    use serde_json::json;

    const DEVICES: &str = "/deviceManagement/managedDevices";

    fn dispatcher(fake: FakeGraph) -> (Arc<FakeGraph>, Dispatcher<FakeGraph>) {
        let fake = Arc::new(fake);
        (fake.clone(), Dispatcher::new(fake))
    }

    fn invocation(name: &str, arguments: Value) -> Invocation {
        Invocation::new(name, arguments.as_object().cloned().unwrap_or_default())
    }

    #[tokio::test]
    async fn unknown_tool_is_failure() {
        let (fake, dispatcher) = dispatcher(FakeGraph::new());

        let envelope = dispatcher.dispatch(Invocation::bare("totally_bogus")).await;

        assert_eq!(
            envelope,
            Envelope::Failure {
                text: "Unknown tool: totally_bogus".to_string()
            }
        );
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn missing_query_fails_before_upstream() {
        let (fake, dispatcher) = dispatcher(FakeGraph::new());

        let envelope = dispatcher.dispatch(invocation("search_users", json!({}))).await;

        assert!(envelope.is_error());
        assert_eq!(envelope.text(), "Query required");
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn every_required_argument_is_checked_before_upstream() {
        let (fake, dispatcher) = dispatcher(FakeGraph::new());

        for tool in dispatcher.list_tools() {
            if let Some(arg) = tool.arguments.iter().find(|a| a.required) {
                let envelope = dispatcher.dispatch(Invocation::bare(tool.name)).await;
                assert_eq!(envelope.text(), format!("{} required", arg.label()));
            }
        }
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn empty_device_list() {
        let (_, dispatcher) =
            dispatcher(FakeGraph::new().route(DEVICES, Reply::collection(vec![])));

        let envelope = dispatcher.dispatch(Invocation::bare("get_intune_devices")).await;

        assert_eq!(
            envelope,
            Envelope::Success {
                text: "Found 0 devices:\n\n".to_string()
            }
        );
    }

    #[tokio::test]
    async fn lookup_ring_shows_assignment() {
        let (_, dispatcher) = dispatcher(
            FakeGraph::new()
                .route(
                    "/deviceManagement/managedDevices/abc",
                    Reply::object(json!({"id": "abc", "deviceName": "LAPTOP-01"})),
                )
                .route(
                    "/deviceManagement/managedDevices/abc/deviceConfigurationStates",
                    Reply::collection(vec![json!({"displayName": "Ring 1", "state": "succeeded"})]),
                ),
        );

        let envelope = dispatcher
            .dispatch(invocation("lookup_device_ring", json!({"deviceId": "abc"})))
            .await;

        assert!(!envelope.is_error());
        assert!(envelope.text().contains("Ring 1 (succeeded)"));
    }

    #[tokio::test]
    async fn not_found_lookup_is_success() {
        let (_, dispatcher) = dispatcher(FakeGraph::new());

        let envelope = dispatcher
            .dispatch(invocation("get_intune_device", json!({"deviceId": "abc"})))
            .await;

        assert_eq!(
            envelope,
            Envelope::Success {
                text: "Device with ID abc not found.".to_string()
            }
        );
    }

    #[tokio::test]
    async fn missing_user_roles_is_success() {
        let (_, dispatcher) = dispatcher(FakeGraph::new());

        let envelope = dispatcher
            .dispatch(invocation("get_user_roles", json!({"userId": "ghost"})))
            .await;

        assert!(!envelope.is_error());
        assert_eq!(envelope.text(), "User with ID ghost not found.");
    }

    #[tokio::test]
    async fn upstream_error_names_the_tool() {
        let (_, dispatcher) = dispatcher(
            FakeGraph::new().route("/groups", Reply::Status(403, "Insufficient privileges".into())),
        );

        let envelope = dispatcher.dispatch(Invocation::bare("get_groups")).await;

        assert!(envelope.is_error());
        assert_eq!(
            envelope.text(),
            "Error executing get_groups: Graph API returned 403: Insufficient privileges"
        );
    }

    #[tokio::test]
    async fn auth_failure_is_reported() {
        let (_, dispatcher) = dispatcher(
            FakeGraph::new().route(DEVICES, Reply::AuthFailure("tenant unreachable".into())),
        );

        let envelope = dispatcher.dispatch(Invocation::bare("get_intune_devices")).await;

        assert!(envelope.is_error());
        assert!(
            envelope
                .text()
                .starts_with("Error executing get_intune_devices: authentication failed")
        );
    }

    #[tokio::test]
    async fn non_lookup_404_is_failure() {
        let (_, dispatcher) = dispatcher(FakeGraph::new());

        let envelope = dispatcher.dispatch(Invocation::bare("get_compliance_report")).await;

        assert!(envelope.is_error());
    }

    #[tokio::test]
    async fn malformed_payload_is_failure() {
        let (_, dispatcher) = dispatcher(
            FakeGraph::new().route(DEVICES, Reply::collection(vec![json!({"deviceName": 7})])),
        );

        let envelope = dispatcher.dispatch(Invocation::bare("get_intune_devices")).await;

        assert!(envelope.is_error());
        assert!(envelope.text().contains("invalid response"));
    }

    #[tokio::test]
    async fn repeated_reads_are_identical() {
        let (_, dispatcher) = dispatcher(FakeGraph::new().route(
            DEVICES,
            Reply::collection(vec![json!({"deviceName": "LAPTOP-01", "operatingSystem": "Windows"})]),
        ));

        let first = dispatcher.dispatch(Invocation::bare("get_intune_devices")).await;
        let second = dispatcher.dispatch(Invocation::bare("get_intune_devices")).await;

        assert_eq!(first, second);
        assert!(first.text().contains("📱 LAPTOP-01 (Windows)"));
    }

    #[tokio::test]
    async fn export_defaults_to_devices() {
        let (fake, dispatcher) = dispatcher(FakeGraph::new().route(
            DEVICES,
            Reply::collection(vec![json!({"deviceName": "LAPTOP-01"})]),
        ));

        let envelope = dispatcher.dispatch(Invocation::bare("export_device_report")).await;

        assert!(envelope.text().starts_with("Device report (1 devices):"));
        assert!(fake.last_query(DEVICES).unwrap().pairs()[0].1.contains("lastSyncDateTime"));
    }

    #[tokio::test]
    async fn export_rejects_unknown_report_type() {
        let (fake, dispatcher) = dispatcher(FakeGraph::new());

        let envelope = dispatcher
            .dispatch(invocation("export_device_report", json!({"reportType": "xlsx"})))
            .await;

        assert!(envelope.is_error());
        assert_eq!(fake.calls(), 0);
    }

    #[tokio::test]
    async fn search_query_is_echoed() {
        let (_, dispatcher) = dispatcher(FakeGraph::new().route(
            "/users",
            Reply::collection(vec![json!({"displayName": "Ada"})]),
        ));

        let envelope = dispatcher
            .dispatch(invocation("search_users", json!({"query": "Ad"})))
            .await;

        assert!(envelope.text().starts_with("Search results for \"Ad\" (1 users):"));
    }

    #[tokio::test]
    async fn applications_are_listed() {
        let (_, dispatcher) = dispatcher(FakeGraph::new().route(
            "/deviceAppManagement/mobileApps",
            Reply::collection(vec![
                json!({"id": "1", "displayName": "Company Portal", "publisher": "Microsoft"}),
                json!({"id": "2", "displayName": "Zoom"}),
            ]),
        ));

        let envelope = dispatcher.dispatch(Invocation::bare("get_intune_applications")).await;

        assert_eq!(
            envelope,
            Envelope::Success {
                text: "Found 2 applications:\n\n\
                       📦 Company Portal\n   Publisher: Microsoft\n\
                       📦 Zoom\n   Publisher: Unknown"
                    .to_string()
            }
        );
    }

    #[tokio::test]
    async fn compliance_policies_are_listed() {
        let (fake, dispatcher) = dispatcher(FakeGraph::new().route(
            "/deviceManagement/deviceCompliancePolicies",
            Reply::collection(vec![json!({
                "id": "p1",
                "displayName": "Windows baseline",
                "createdDateTime": "2024-01-01T00:00:00Z",
            })]),
        ));

        let envelope = dispatcher.dispatch(Invocation::bare("get_compliance_policies")).await;

        assert!(!envelope.is_error());
        assert_eq!(
            envelope.text(),
            "Found 1 compliance policies:\n\n\
             📋 Windows baseline\n   Description: No description\n   \
             Created: 2024-01-01T00:00:00Z\n   Last Modified: Unknown\n"
        );
        assert_eq!(fake.calls(), 1);
    }

    #[test]
    fn envelope_maps_to_call_result() {
        let result: mcp::CallToolResult = Envelope::Failure {
            text: "Unknown tool: x".to_string(),
        }
        .into();
        assert!(result.is_error);
        assert_eq!(result.content[0].as_text(), Some("Unknown tool: x"));
    }
}
