use std::time::Duration;

/// Connection settings for one cluster's administration endpoint.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    /// Base URL of the cluster REST API, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout applied by the HTTP transport.
    pub request_timeout: Duration,
    /// Period of the background remote-cluster list poll.
    pub remote_clusters_poll_period: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8091".to_string(),
            request_timeout: Duration::from_secs(10),
            remote_clusters_poll_period: Duration::from_secs(10),
        }
    }
}

impl ConsoleConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}
