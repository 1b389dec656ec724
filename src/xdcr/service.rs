use crate::config::ConsoleConfig;
use crate::http::request::RequestUnit;
use crate::http::transport::{ApiRequest, Transport, TransportError, to_json};
use crate::stream::{Heartbeat, SharedPoll};
use crate::xdcr::types::{
    RemoteCluster, RemoteClusterSnapshot, ReplicationSettings, prepare_remote_cluster,
};
use serde_json::{Value, json};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

/// Replication-settings submission target: a specific replication when an
/// id is present, the global defaults otherwise.
#[derive(Clone, Debug)]
pub struct ReplicationTarget {
    pub id: Option<String>,
    pub settings: ReplicationSettings,
}

/// XDCR operations: a shared, periodically refreshed view of the
/// remote-cluster list plus independent request units for every mutation.
///
/// The list poll runs only while somebody is subscribed, re-fetches on a
/// fixed period or on demand, and discards a stale in-flight fetch when a
/// newer trigger arrives. Derived views (non-deleted sorted list,
/// grouping by UUID) are computed once per refresh inside the snapshot.
pub struct XdcrService {
    transport: Arc<dyn Transport>,
    remote_clusters: SharedPoll<RemoteClusterSnapshot>,
    replication_settings: SharedPoll<Value>,
    settings_id: Arc<RwLock<Option<String>>>,

    pub delete_remote_cluster: RequestUnit<String>,
    pub cancel_replication: RequestUnit<String>,
    pub post_settings_replications: RequestUnit<ReplicationTarget>,
    pub post_pause_play_replication: RequestUnit<ReplicationTarget>,
    pub post_settings_validation: RequestUnit<ReplicationTarget>,
    pub create_replication: RequestUnit<ReplicationSettings, Value, Value>,
    pub post_remote_cluster: RequestUnit<(RemoteCluster, Option<String>)>,
    pub regexp_validation: RequestUnit<Value, Value, Value>,
}

impl XdcrService {
    pub fn new(transport: Arc<dyn Transport>, config: &ConsoleConfig) -> Self {
        let remote_clusters = {
            let transport = transport.clone();
            SharedPoll::new(
                Heartbeat::new(config.remote_clusters_poll_period),
                move || {
                    let transport = transport.clone();
                    async move {
                        let value = transport
                            .send(ApiRequest::get("/pools/default/remoteClusters"))
                            .await?;
                        let clusters: Vec<RemoteCluster> = serde_json::from_value(value)
                            .map_err(|e| TransportError::Decode(e.to_string()))?;
                        Ok(RemoteClusterSnapshot::new(clusters))
                    }
                },
            )
        };

        let settings_id = Arc::new(RwLock::new(None::<String>));
        let replication_settings = {
            let transport = transport.clone();
            let settings_id = settings_id.clone();
            SharedPoll::new(Heartbeat::manual(), move || {
                let transport = transport.clone();
                let id = settings_id.read().ok().and_then(|guard| guard.clone());
                async move {
                    transport
                        .send(ApiRequest::get(settings_replications_path(id.as_deref())))
                        .await
                }
            })
        };

        let delete_remote_cluster = {
            let transport = transport.clone();
            RequestUnit::new(move |name: String| {
                let transport = transport.clone();
                async move {
                    transport
                        .send(ApiRequest::delete(format!(
                            "/pools/default/remoteClusters/{}",
                            urlencoding::encode(&name)
                        )))
                        .await
                }
            })
        };

        let cancel_replication = {
            let transport = transport.clone();
            RequestUnit::new(move |id: String| {
                let transport = transport.clone();
                async move {
                    transport
                        .send(ApiRequest::delete(format!(
                            "/controller/cancelXDCR/{}",
                            urlencoding::encode(&id)
                        )))
                        .await
                }
            })
        };

        // Submit and pause/play share one producer, mirroring how the
        // console wires them; validation differs only in the query flag.
        let post_settings_replications = settings_replications_unit(&transport, false);
        let post_pause_play_replication = settings_replications_unit(&transport, false);
        let post_settings_validation = settings_replications_unit(&transport, true);

        let create_replication = {
            let transport = transport.clone();
            RequestUnit::with_maps(
                move |settings: ReplicationSettings| {
                    let transport = transport.clone();
                    async move {
                        let body = to_json(&settings)?;
                        transport
                            .send(ApiRequest::post("/controller/createReplication").with_json(body))
                            .await
                    }
                },
                parse_text_response,
                normalize_create_replication_error,
            )
        };

        let post_remote_cluster = {
            let transport = transport.clone();
            RequestUnit::new(move |(cluster, name): (RemoteCluster, Option<String>)| {
                let transport = transport.clone();
                async move {
                    let path = match &name {
                        Some(name) => format!(
                            "/pools/default/remoteClusters/{}",
                            urlencoding::encode(name)
                        ),
                        None => "/pools/default/remoteClusters".to_string(),
                    };
                    let body = to_json(&prepare_remote_cluster(cluster))?;
                    transport.send(ApiRequest::post(path).with_json(body)).await
                }
            })
        };

        let regexp_validation = {
            let transport = transport.clone();
            RequestUnit::with_maps(
                move |params: Value| {
                    let transport = transport.clone();
                    async move {
                        transport
                            .send(ApiRequest::post("/_goxdcr/regexpValidation").with_json(params))
                            .await
                    }
                },
                parse_text_response,
                normalize_regexp_validation_error,
            )
        };

        Self {
            transport,
            remote_clusters,
            replication_settings,
            settings_id,
            delete_remote_cluster,
            cancel_replication,
            post_settings_replications,
            post_pause_play_replication,
            post_settings_validation,
            create_replication,
            post_remote_cluster,
            regexp_validation,
        }
    }

    /// Subscribe to the shared remote-cluster view. The snapshot carries
    /// the raw list, the filtered+sorted list, and the by-UUID grouping.
    pub fn remote_clusters(&self) -> watch::Receiver<Option<RemoteClusterSnapshot>> {
        self.remote_clusters.subscribe()
    }

    /// Demand an immediate re-fetch of the remote-cluster list.
    pub fn refresh_remote_clusters(&self) {
        self.remote_clusters.refresh();
    }

    /// One-shot fetch of GET /settings/replications[/id].
    pub async fn get_settings_replications(
        &self,
        id: Option<&str>,
    ) -> Result<Value, TransportError> {
        self.transport
            .send(ApiRequest::get(settings_replications_path(id)))
            .await
    }

    /// Subscribe to the id-keyed replication-settings view. It fetches
    /// for the current id on first subscription and again on every
    /// `set_replication_settings_id`, keeping only the latest result.
    pub fn replication_settings(&self) -> watch::Receiver<Option<Value>> {
        self.replication_settings.subscribe()
    }

    /// Point the settings view at another replication and re-fetch.
    pub fn set_replication_settings_id(&self, id: Option<String>) {
        if let Ok(mut guard) = self.settings_id.write() {
            *guard = id;
        }
        self.replication_settings.refresh();
    }

    /// Drop every cached stream value, so nothing fetched under one login
    /// survives into the next.
    pub fn clear_cached(&self) {
        self.remote_clusters.clear();
        self.replication_settings.clear();
    }
}

fn settings_replications_path(id: Option<&str>) -> String {
    match id {
        Some(id) => format!("/settings/replications/{}", urlencoding::encode(id)),
        None => "/settings/replications".to_string(),
    }
}

fn settings_replications_unit(
    transport: &Arc<dyn Transport>,
    validate: bool,
) -> RequestUnit<ReplicationTarget> {
    let transport = transport.clone();
    RequestUnit::new(move |target: ReplicationTarget| {
        let transport = transport.clone();
        async move {
            let body = to_json(&target.settings)?;
            transport
                .send(
                    ApiRequest::post(settings_replications_path(target.id.as_deref()))
                        .with_query("just_validate", if validate { "1" } else { "0" })
                        .with_json(body),
                )
                .await
        }
    })
}

/// Endpoints that answer with a JSON document as text get re-parsed;
/// anything already structured passes through.
fn parse_text_response(value: Value) -> Value {
    match value {
        Value::String(text) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
        other => other,
    }
}

/// Normalize a create-replication failure: a structured `errors` field is
/// surfaced verbatim, anything else is wrapped under the `_` key so the
/// view always sees a field-to-message map.
fn normalize_create_replication_error(error: TransportError) -> Value {
    match error.payload() {
        Value::Object(object) => {
            if let Some(errors) = object.get("errors") {
                errors.clone()
            } else if let Some(message) = object.get("error") {
                json!({ "_": message })
            } else {
                json!({ "_": Value::Object(object) })
            }
        }
        other => json!({ "_": other }),
    }
}

/// Normalize a regex-validation failure to `{"error": ...}`.
fn normalize_regexp_validation_error(error: TransportError) -> Value {
    match error.payload() {
        Value::Object(object) => {
            let inner = object
                .get("error")
                .cloned()
                .unwrap_or(Value::Object(object));
            json!({ "error": inner })
        }
        other => json!({ "error": other }),
    }
}
