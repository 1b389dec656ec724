use crate::auth::AuthService;
use crate::config::ConsoleConfig;
use crate::controllers::{DetailedChartController, PricingController};
use crate::http::transport::{HttpTransport, Transport};
use crate::pricing::PricingService;
use crate::stats::StatsPoller;
use crate::xdcr::XdcrService;
use std::sync::Arc;

/// Composition root of the console: one transport, the services built on
/// it, and the shared statistics poller. Views receive their controllers
/// from here; nothing is looked up through a registry.
pub struct Console {
    pub auth: AuthService,
    pub xdcr: XdcrService,
    pub pricing: PricingService,
    pub stats: StatsPoller,
}

impl Console {
    pub fn new(config: &ConsoleConfig) -> anyhow::Result<Self> {
        let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(config)?);
        Ok(Self::with_transport(transport, config))
    }

    /// Assemble the console over an existing transport.
    pub fn with_transport(transport: Arc<dyn Transport>, config: &ConsoleConfig) -> Self {
        Self {
            auth: AuthService::new(transport.clone()),
            xdcr: XdcrService::new(transport.clone(), config),
            pricing: PricingService::new(transport),
            stats: StatsPoller::new(),
        }
    }

    pub fn pricing_controller(&self) -> PricingController {
        PricingController::new(self.pricing.clone())
    }

    pub fn detailed_chart_controller(&self, scenario_zoom: &str) -> DetailedChartController {
        DetailedChartController::new(self.stats.clone(), scenario_zoom)
    }

    /// End the UI session and drop every cached stream value, so data
    /// fetched under this login is not replayed to the next one.
    pub async fn logout(&self) -> anyhow::Result<()> {
        let result = self.auth.logout.send(()).await;
        self.xdcr.clear_cached();
        result
            .map(|_| ())
            .map_err(|error| anyhow::anyhow!("logout failed: {}", error))
    }
}
