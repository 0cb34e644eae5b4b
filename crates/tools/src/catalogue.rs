//! The fixed, ordered tool catalogue.

use serde_json::{Map, Value, json};

/// Accepted values for `export_device_report.reportType`.
const REPORT_TYPES: &[&str] = &["devices", "compliance"];

/// Adapter operation a tool is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ListDevices,
    SearchDevices,
    GetDevice,
    ListApplications,
    ComplianceReport,
    ExportReport,
    ListRings,
    LookupRing,
    ListUsers,
    SearchUsers,
    ListGroups,
    UserRoles,
    ListAlerts,
    ListRiskDetections,
    SecureScore,
    CompliancePolicies,
}

/// One string argument of a tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Accepted values; empty means any string.
    pub allowed: &'static [&'static str],
    /// Value used when an optional argument is absent.
    pub default: Option<&'static str>,
}

impl ArgSpec {
    fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: true,
            allowed: &[],
            default: None,
        }
    }

    fn one_of(
        name: &'static str,
        description: &'static str,
        allowed: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self {
            name,
            description,
            required: false,
            allowed,
            default: Some(default),
        }
    }

    /// Name as shown in validation messages: first letter upper-cased.
    pub fn label(&self) -> String {
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    fn schema(&self) -> Value {
        let mut schema = Map::new();
        schema.insert("type".into(), json!("string"));
        schema.insert("description".into(), json!(self.description));
        if !self.allowed.is_empty() {
            schema.insert("enum".into(), json!(self.allowed));
        }
        if let Some(default) = self.default {
            schema.insert("default".into(), json!(default));
        }
        Value::Object(schema)
    }
}

/// A named, schema-described operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub arguments: Vec<ArgSpec>,
    pub operation: Operation,
}

impl ToolDescriptor {
    fn new(name: &'static str, description: &'static str, operation: Operation) -> Self {
        Self {
            name,
            description,
            arguments: Vec::new(),
            operation,
        }
    }

    fn arg(mut self, spec: ArgSpec) -> Self {
        self.arguments.push(spec);
        self
    }

    /// JSON schema for the tool's arguments.
    pub fn input_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .arguments
            .iter()
            .map(|arg| (arg.name.to_string(), arg.schema()))
            .collect();
        let required: Vec<&str> = self
            .arguments
            .iter()
            .filter(|arg| arg.required)
            .map(|arg| arg.name)
            .collect();

        let mut schema = json!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema["required"] = json!(required);
        }
        schema
    }

    pub fn to_tool(&self) -> mcp::Tool {
        mcp::Tool {
            name: self.name.to_string(),
            description: self.description.to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// The ordered set of tools this server advertises.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalogue {
    tools: Vec<ToolDescriptor>,
}

impl Catalogue {
    /// The full Intune, directory and security catalogue.
    pub fn standard() -> Self {
        use Operation::*;

        let tools = vec![
            ToolDescriptor::new(
                "get_intune_devices",
                "Retrieve all Intune managed devices with comprehensive details",
                ListDevices,
            ),
            ToolDescriptor::new(
                "search_intune_devices",
                "Search Intune devices by device name or user email address prefix",
                SearchDevices,
            )
            .arg(ArgSpec::required("query", "Search text matched against the start of the device name or email")),
            ToolDescriptor::new(
                "get_intune_device",
                "Get detailed information about a specific Intune device",
                GetDevice,
            )
            .arg(ArgSpec::required("deviceId", "The Intune managed device ID")),
            ToolDescriptor::new(
                "get_intune_applications",
                "Retrieve all mobile applications managed by Intune",
                ListApplications,
            ),
            ToolDescriptor::new(
                "get_compliance_report",
                "Get the device compliance summary report",
                ComplianceReport,
            ),
            ToolDescriptor::new(
                "export_device_report",
                "Export device inventory rows, or start a compliance report export job",
                ExportReport,
            )
            .arg(ArgSpec::one_of(
                "reportType",
                "Which report to export",
                REPORT_TYPES,
                "devices",
            )),
            ToolDescriptor::new(
                "get_device_rings",
                "List device configurations used as deployment rings",
                ListRings,
            ),
            ToolDescriptor::new(
                "lookup_device_ring",
                "Show which deployment rings are applied to a device",
                LookupRing,
            )
            .arg(ArgSpec::required("deviceId", "The Intune managed device ID")),
            ToolDescriptor::new("get_users", "Retrieve all users in the directory", ListUsers),
            ToolDescriptor::new(
                "search_users",
                "Search users by display name or user principal name prefix",
                SearchUsers,
            )
            .arg(ArgSpec::required("query", "Search text matched against the start of the name or UPN")),
            ToolDescriptor::new("get_groups", "Retrieve all groups in the directory", ListGroups),
            ToolDescriptor::new(
                "get_user_roles",
                "List the directory roles and groups a user is a member of",
                UserRoles,
            )
            .arg(ArgSpec::required("userId", "The user's object ID or user principal name")),
            ToolDescriptor::new(
                "get_security_alerts",
                "Retrieve the most recent security alerts",
                ListAlerts,
            ),
            ToolDescriptor::new(
                "get_risk_detections",
                "Retrieve the most recent identity protection risk detections",
                ListRiskDetections,
            ),
            ToolDescriptor::new(
                "get_security_score",
                "Get the tenant's latest Microsoft Secure Score",
                SecureScore,
            ),
            ToolDescriptor::new(
                "get_compliance_policies",
                "List Intune device compliance policies",
                CompliancePolicies,
            ),
        ];

        Self { tools }
    }

    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn find(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// The catalogue as MCP tool entries, in advertised order.
    pub fn to_mcp(&self) -> Vec<mcp::Tool> {
        self.tools.iter().map(ToolDescriptor::to_tool).collect()
    }
}
