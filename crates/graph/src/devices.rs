//! Intune device management adapter.

use std::sync::Arc;

use serde_json::json;

use crate::client::{GraphApi, Query};
use crate::error::{Result, optional};
use crate::model::{
    Application, ComplianceSummary, Device, DeviceReport, DeviceReportRow, DeviceRing,
    DeviceRingLookup, ExportJob, ReportKind, RingAssignment,
};
use crate::odata;
use crate::raw::{
    RawApplication, RawComplianceSummary, RawConfigurationState, RawDevice,
    RawDeviceConfiguration, RawExportJob, RawReportRow, decode, normalize_all,
};

const MANAGED_DEVICES: &str = "/deviceManagement/managedDevices";
const MOBILE_APPS: &str = "/deviceAppManagement/mobileApps";
const COMPLIANCE_SUMMARY: &str = "/deviceManagement/deviceCompliancePolicyDeviceStateSummary";
const DEVICE_CONFIGURATIONS: &str = "/deviceManagement/deviceConfigurations";
const EXPORT_JOBS: &str = "/deviceManagement/reports/exportJobs";

const SEARCH_FIELDS: &[&str] = &["deviceName", "emailAddress"];
const REPORT_FIELDS: &[&str] = &[
    "deviceName",
    "userPrincipalName",
    "complianceState",
    "operatingSystem",
    "lastSyncDateTime",
];

/// Deployment rings are configurations whose name mentions "ring".
fn is_ring(name: Option<&str>) -> bool {
    name.is_some_and(|n| n.to_lowercase().contains("ring"))
}

/// Intune managed devices, apps, compliance and rings.
pub struct DeviceService<C> {
    client: Arc<C>,
}

impl<C: GraphApi> DeviceService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        let values = self.client.list(MANAGED_DEVICES, &Query::new()).await?;
        normalize_all::<RawDevice, _>(values)
    }

    pub async fn search_devices(&self, text: &str) -> Result<Vec<Device>> {
        let query = Query::new().filter(odata::startswith_any(SEARCH_FIELDS, text));
        let values = self.client.list(MANAGED_DEVICES, &query).await?;
        normalize_all::<RawDevice, _>(values)
    }

    /// Look up one device; `None` if it does not exist.
    pub async fn get_device(&self, device_id: &str) -> Result<Option<Device>> {
        let path = format!("{MANAGED_DEVICES}/{}", odata::segment(device_id));
        match optional(self.client.get(&path, &Query::new()).await)? {
            Some(value) => Ok(Some(Device::from(decode::<RawDevice>(value)?))),
            None => Ok(None),
        }
    }

    pub async fn list_applications(&self) -> Result<Vec<Application>> {
        let values = self.client.list(MOBILE_APPS, &Query::new()).await?;
        normalize_all::<RawApplication, _>(values)
    }

    pub async fn compliance_summary(&self) -> Result<ComplianceSummary> {
        let value = self.client.get(COMPLIANCE_SUMMARY, &Query::new()).await?;
        Ok(decode::<RawComplianceSummary>(value)?.into())
    }

    pub async fn export_report(&self, kind: ReportKind) -> Result<DeviceReport> {
        match kind {
            ReportKind::Devices => {
                let query = Query::new().select(REPORT_FIELDS);
                let values = self.client.list(MANAGED_DEVICES, &query).await?;
                let rows = normalize_all::<RawReportRow, DeviceReportRow>(values)?;
                Ok(DeviceReport::Devices(rows))
            }
            ReportKind::Compliance => {
                let job = json!({
                    "reportName": "DeviceCompliance",
                    "format": "csv",
                    "select": ["DeviceName", "UserPrincipalName", "ComplianceState", "LastSyncDateTime"],
                });
                let value = self.client.post(EXPORT_JOBS, &job).await?;
                let job = ExportJob::from(decode::<RawExportJob>(value)?);
                Ok(DeviceReport::Compliance(job))
            }
        }
    }

    /// Device configurations that act as deployment rings.
    ///
    /// The name match is done here rather than with `$filter`, since
    /// `contains` is not supported on this collection.
    pub async fn list_rings(&self) -> Result<Vec<DeviceRing>> {
        let query = Query::new().expand("assignments");
        let values = self.client.list(DEVICE_CONFIGURATIONS, &query).await?;

        let mut rings = Vec::new();
        for value in values {
            let config: RawDeviceConfiguration = decode(value)?;
            if is_ring(config.display_name.as_deref()) {
                rings.push(DeviceRing::from(config));
            }
        }
        Ok(rings)
    }

    /// Ring configurations applied to one device; `None` if the device does not exist.
    ///
    /// The device is fetched first so a bad id is reported as missing
    /// rather than as an empty ring list.
    pub async fn lookup_ring(&self, device_id: &str) -> Result<Option<DeviceRingLookup>> {
        let device_path = format!("{MANAGED_DEVICES}/{}", odata::segment(device_id));
        let query = Query::new().select(&["id", "deviceName"]);
        let Some(value) = optional(self.client.get(&device_path, &query).await)? else {
            return Ok(None);
        };
        let device = Device::from(decode::<RawDevice>(value)?);

        let states_path = format!("{device_path}/deviceConfigurationStates");
        let values = self.client.list(&states_path, &Query::new()).await?;

        let mut rings = Vec::new();
        for value in values {
            let state: RawConfigurationState = decode(value)?;
            if is_ring(state.display_name.as_deref()) {
                rings.push(RingAssignment::from(state));
            }
        }

        Ok(Some(DeviceRingLookup {
            device_name: device.device_name,
            rings,
        }))
    }
}
