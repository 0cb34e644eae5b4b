//! Security and identity protection adapter.

use std::sync::Arc;

use crate::client::{GraphApi, Query};
use crate::error::Result;
use crate::model::{CompliancePolicy, RiskDetection, SecureScore, SecurityAlert};
use crate::raw::{
    RawAlert, RawCompliancePolicy, RawRiskDetection, RawSecureScore, decode, normalize_all,
};

const ALERTS: &str = "/security/alerts_v2";
const RISK_DETECTIONS: &str = "/identityProtection/riskDetections";
const SECURE_SCORES: &str = "/security/secureScores";
const COMPLIANCE_POLICIES: &str = "/deviceManagement/deviceCompliancePolicies";

/// Most recent records returned for alert-style feeds.
pub const FEED_LIMIT: u32 = 50;

/// Alerts, risk detections, Secure Score and compliance policies.
pub struct SecurityService<C> {
    client: Arc<C>,
}

impl<C: GraphApi> SecurityService<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    pub async fn list_alerts(&self) -> Result<Vec<SecurityAlert>> {
        let values = self.client.list(ALERTS, &Query::new().top(FEED_LIMIT)).await?;
        normalize_all::<RawAlert, _>(values)
    }

    pub async fn list_risk_detections(&self) -> Result<Vec<RiskDetection>> {
        let query = Query::new().top(FEED_LIMIT);
        let values = self.client.list(RISK_DETECTIONS, &query).await?;
        normalize_all::<RawRiskDetection, _>(values)
    }

    /// Latest Secure Score. A tenant without scores yields placeholder values.
    pub async fn secure_score(&self) -> Result<SecureScore> {
        let values = self.client.list(SECURE_SCORES, &Query::new().top(1)).await?;
        let raw = match values.into_iter().next() {
            Some(value) => decode::<RawSecureScore>(value)?,
            None => RawSecureScore::default(),
        };
        Ok(raw.into())
    }

    pub async fn list_compliance_policies(&self) -> Result<Vec<CompliancePolicy>> {
        let values = self.client.list(COMPLIANCE_POLICIES, &Query::new()).await?;
        normalize_all::<RawCompliancePolicy, _>(values)
    }
}
