use crate::pricing::{OdpSettings, PricingService};
use anyhow::anyhow;
use serde_json::Value;

/// View model of the on-demand-pricing settings pane.
///
/// `settings`, `valid`, and `errors` are the fields the view renders;
/// service failures land in `errors` instead of propagating.
pub struct PricingController {
    service: PricingService,
    pub settings: Option<OdpSettings>,
    pub valid: Option<Value>,
    pub errors: Option<Value>,
}

impl PricingController {
    pub fn new(service: PricingService) -> Self {
        Self {
            service,
            settings: None,
            valid: None,
            errors: None,
        }
    }

    /// Fetch the settings on view activation. When reporting is already
    /// enabled, validate immediately so the pane opens with its status.
    pub async fn activate(&mut self) {
        match self.service.get_settings().await {
            Ok(settings) => {
                let reporting_enabled = settings.reporting_enabled;
                self.settings = Some(settings);
                if reporting_enabled {
                    let _ = self.validate().await;
                }
            }
            Err(error) => {
                log::warn!("failed to load pricing settings: {}", error);
                self.errors = Some(error.payload());
            }
        }
    }

    /// Validate the current settings, keeping the result for the view.
    pub async fn validate(&mut self) -> anyhow::Result<()> {
        let Some(settings) = &self.settings else {
            return Ok(());
        };
        match self.service.validate_settings(settings).await {
            Ok(valid) => {
                self.errors = None;
                self.valid = Some(valid);
                Ok(())
            }
            Err(error) => {
                self.errors = Some(error.payload());
                Err(anyhow!("pricing settings validation failed: {}", error))
            }
        }
    }

    /// Validate, then save. A validation failure skips the save and
    /// leaves its errors on display.
    pub async fn submit(&mut self) {
        if self.validate().await.is_err() {
            return;
        }
        let Some(settings) = &self.settings else {
            return;
        };
        match self.service.save_settings(settings).await {
            Ok(_) => {
                self.errors = None;
            }
            Err(error) => {
                self.errors = Some(error.payload());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::MockTransport;
    use crate::http::transport::TransportError;
    use serde_json::json;

    fn query_flag(request: &crate::http::ApiRequest) -> Option<&str> {
        request
            .query
            .iter()
            .find(|(key, _)| key == "just_validate")
            .map(|(_, value)| value.as_str())
    }

    #[tokio::test]
    async fn activate_with_reporting_enabled_validates_immediately() {
        let transport = MockTransport::ok(json!({"reporting_enabled": true}));
        let mut controller = PricingController::new(PricingService::new(transport.clone()));

        controller.activate().await;
        assert!(controller.settings.is_some());
        assert!(controller.valid.is_some());

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(query_flag(&requests[1]), Some("1"));
    }

    #[tokio::test]
    async fn activate_with_reporting_disabled_skips_validation() {
        let transport = MockTransport::ok(json!({"reporting_enabled": false}));
        let mut controller = PricingController::new(PricingService::new(transport.clone()));

        controller.activate().await;
        assert!(controller.settings.is_some());
        assert!(controller.valid.is_none());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn submit_saves_after_successful_validation() {
        let transport = MockTransport::ok(json!({"reporting_enabled": false}));
        let mut controller = PricingController::new(PricingService::new(transport.clone()));
        controller.activate().await;

        controller.submit().await;
        let requests = transport.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(query_flag(&requests[1]), Some("1"));
        assert_eq!(query_flag(&requests[2]), Some("0"));
        assert!(controller.errors.is_none());
    }

    #[tokio::test]
    async fn submit_skips_the_save_when_validation_fails() {
        let transport = MockTransport::new(|request| {
            if request.query.is_empty() {
                Ok(json!({"reporting_enabled": false}))
            } else {
                Err(TransportError::Status {
                    status: 400,
                    body: r#"{"errors": {"reporting_endpoint": "unreachable"}}"#.to_string(),
                })
            }
        });
        let mut controller = PricingController::new(PricingService::new(transport.clone()));
        controller.activate().await;

        controller.submit().await;
        // Settings fetch plus the failed validation; no save attempt.
        assert_eq!(transport.request_count(), 2);
        assert_eq!(
            controller.errors,
            Some(json!({"errors": {"reporting_endpoint": "unreachable"}}))
        );
    }

    #[tokio::test]
    async fn submit_without_settings_does_nothing() {
        let transport = MockTransport::ok(Value::Null);
        let mut controller = PricingController::new(PricingService::new(transport.clone()));

        controller.submit().await;
        assert_eq!(transport.request_count(), 0);
    }
}
