use crate::http::transport::{ApiRequest, Transport, TransportError, to_json};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// On-demand-pricing settings record. Field names match the wire format.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OdpSettings {
    #[serde(default)]
    pub reporting_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reporting_interval: Option<u64>,
}

/// Get, validate, and save the on-demand-pricing settings. Validation
/// reuses the save endpoint behind the `just_validate` flag, the same
/// convention the replication settings endpoint follows.
#[derive(Clone)]
pub struct PricingService {
    transport: Arc<dyn Transport>,
}

const SETTINGS_PATH: &str = "/settings/onDemandPricing";

impl PricingService {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    pub async fn get_settings(&self) -> Result<OdpSettings, TransportError> {
        let value = self.transport.send(ApiRequest::get(SETTINGS_PATH)).await?;
        serde_json::from_value(value).map_err(|e| TransportError::Decode(e.to_string()))
    }

    pub async fn validate_settings(&self, settings: &OdpSettings) -> Result<Value, TransportError> {
        self.post_settings(settings, true).await
    }

    pub async fn save_settings(&self, settings: &OdpSettings) -> Result<Value, TransportError> {
        self.post_settings(settings, false).await
    }

    async fn post_settings(
        &self,
        settings: &OdpSettings,
        validate: bool,
    ) -> Result<Value, TransportError> {
        self.transport
            .send(
                ApiRequest::post(SETTINGS_PATH)
                    .with_query("just_validate", if validate { "1" } else { "0" })
                    .with_json(to_json(settings)?),
            )
            .await
    }
}
