use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

/// Port appended to remote-cluster hostnames given without one.
pub const DEFAULT_ADMIN_PORT: &str = "8091";

/// A configured replication peer, as submitted by the form and as listed
/// by GET /pools/default/remoteClusters.
///
/// Encryption fields ride along only while encryption is demanded; the
/// outbound payload never carries them otherwise.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCluster {
    pub name: String,
    pub hostname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub demand_encryption: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encryption_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key: Option<String>,
    /// UI-only radio state; never part of the outbound payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_type: Option<String>,
}

/// Host with an explicit port: hostname, IPv4, or bracketed IPv6, then
/// a colon and digits.
fn host_port_regex() -> &'static Regex {
    static HOST_PORT: OnceLock<Regex> = OnceLock::new();
    HOST_PORT.get_or_init(|| {
        Regex::new(r"^\[?([^\]]+)\]?:(\d+)$").expect("host:port regex should compile")
    })
}

/// Shape a cluster descriptor for submission: default the admin port when
/// the hostname carries none, drop encryption fields unless encryption is
/// demanded, and drop the UI-only secure-type marker.
pub fn prepare_remote_cluster(mut cluster: RemoteCluster) -> RemoteCluster {
    if !cluster.hostname.is_empty() && !host_port_regex().is_match(&cluster.hostname) {
        cluster.hostname = format!("{}:{}", cluster.hostname, DEFAULT_ADMIN_PORT);
    }
    if cluster.demand_encryption != Some(true) {
        cluster.certificate = None;
        cluster.demand_encryption = None;
        cluster.encryption_type = None;
        cluster.client_certificate = None;
        cluster.client_key = None;
    }
    cluster.secure_type = None;
    cluster
}

/// Wire protocol of a replication.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicationType {
    Capi,
    Xmem,
}

/// Raw replication form state, before edition and compatibility rules are
/// applied. `filter_skip_restream` arrives as the radio group's string
/// value.
#[derive(Clone, Debug)]
pub struct ReplicationFormData {
    pub from_bucket: String,
    pub to_cluster: String,
    pub to_bucket: String,
    pub kind: ReplicationType,
    pub filter_expression: Option<String>,
    pub filter_skip_restream: String,
    pub compression_type: Option<String>,
    pub network_usage_limit: Option<u64>,
}

/// Outbound replication settings. Fields absent from the payload are
/// `None` and skipped during serialization.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationSettings {
    pub from_bucket: String,
    pub to_cluster: String,
    pub to_bucket: String,
    #[serde(rename = "type")]
    pub kind: ReplicationType,
    pub replication_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_expression: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_skip_restream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_usage_limit: Option<u64>,
}

/// Build the outbound settings record from form state.
///
/// The conditions run in a fixed order and later ones re-examine fields
/// the earlier ones may already have cleared; keep the order intact.
pub fn prepare_replication_settings(
    form: &ReplicationFormData,
    is_enterprise: bool,
    compat_version_55: bool,
    is_edit_mode: bool,
) -> ReplicationSettings {
    let mut settings = ReplicationSettings {
        from_bucket: form.from_bucket.clone(),
        to_cluster: form.to_cluster.clone(),
        to_bucket: form.to_bucket.clone(),
        kind: form.kind,
        replication_type: "continuous",
        filter_expression: form.filter_expression.clone(),
        filter_skip_restream: None,
        compression_type: form.compression_type.clone(),
        network_usage_limit: form.network_usage_limit,
    };

    if is_enterprise {
        settings.filter_skip_restream = Some(form.filter_skip_restream == "true");
    } else {
        settings.filter_expression = None;
        settings.filter_skip_restream = None;
    }

    if !is_edit_mode {
        settings.filter_skip_restream = None;
    }
    if !is_enterprise || !compat_version_55 || settings.kind == ReplicationType::Capi {
        settings.compression_type = None;
    }
    if !is_enterprise || settings.kind != ReplicationType::Xmem {
        settings.network_usage_limit = None;
    }

    settings
}

/// One refresh of the remote-cluster list with its derived views, built
/// once per fetch and shared by every subscriber.
#[derive(Clone, Debug, Default)]
pub struct RemoteClusterSnapshot {
    /// The list as returned by the backend.
    pub clusters: Vec<RemoteCluster>,
    /// Non-deleted entries, sorted by name.
    pub filtered: Vec<RemoteCluster>,
    /// All entries that share a cluster UUID, keyed by that UUID.
    pub by_uuid: BTreeMap<String, Vec<RemoteCluster>>,
}

impl RemoteClusterSnapshot {
    pub fn new(clusters: Vec<RemoteCluster>) -> Self {
        let mut filtered: Vec<RemoteCluster> =
            clusters.iter().filter(|c| !c.deleted).cloned().collect();
        filtered.sort_by(|a, b| a.name.cmp(&b.name));

        let mut by_uuid: BTreeMap<String, Vec<RemoteCluster>> = BTreeMap::new();
        for cluster in &clusters {
            if let Some(uuid) = &cluster.uuid {
                by_uuid.entry(uuid.clone()).or_default().push(cluster.clone());
            }
        }

        Self {
            clusters,
            filtered,
            by_uuid,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cluster(name: &str, hostname: &str) -> RemoteCluster {
        RemoteCluster {
            name: name.to_string(),
            hostname: hostname.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn bare_hostname_gets_the_default_port() {
        let prepared = prepare_remote_cluster(cluster("east", "east.example.com"));
        assert_eq!(prepared.hostname, "east.example.com:8091");
    }

    #[test]
    fn hostname_with_port_is_untouched() {
        for hostname in ["east.example.com:9000", "10.1.1.2:8091", "[fd00::1]:9000"] {
            let prepared = prepare_remote_cluster(cluster("east", hostname));
            assert_eq!(prepared.hostname, hostname);
        }
    }

    #[test]
    fn bracketed_ipv6_without_port_gets_the_default_port() {
        let prepared = prepare_remote_cluster(cluster("east", "[fd00::1]"));
        assert_eq!(prepared.hostname, "[fd00::1]:8091");
    }

    #[test]
    fn empty_hostname_stays_empty() {
        let prepared = prepare_remote_cluster(cluster("east", ""));
        assert_eq!(prepared.hostname, "");
    }

    #[test]
    fn encryption_fields_are_dropped_unless_demanded() {
        let mut input = cluster("east", "east:9000");
        input.demand_encryption = Some(false);
        input.certificate = Some("cert".to_string());
        input.client_certificate = Some("client-cert".to_string());
        input.client_key = Some("client-key".to_string());
        input.encryption_type = Some("full".to_string());
        input.secure_type = Some("full".to_string());

        let payload = serde_json::to_value(prepare_remote_cluster(input)).expect("serialize");
        let object = payload.as_object().expect("object payload");
        for field in [
            "demandEncryption",
            "certificate",
            "clientCertificate",
            "clientKey",
            "encryptionType",
            "secureType",
        ] {
            assert!(!object.contains_key(field), "{} should be absent", field);
        }
    }

    #[test]
    fn encryption_fields_survive_when_demanded() {
        let mut input = cluster("east", "east:9000");
        input.demand_encryption = Some(true);
        input.certificate = Some("cert".to_string());
        input.encryption_type = Some("half".to_string());
        input.secure_type = Some("half".to_string());

        let prepared = prepare_remote_cluster(input);
        assert_eq!(prepared.demand_encryption, Some(true));
        assert_eq!(prepared.certificate.as_deref(), Some("cert"));
        assert_eq!(prepared.encryption_type.as_deref(), Some("half"));
        // The radio marker is UI state and never leaves the console.
        assert_eq!(prepared.secure_type, None);
    }

    fn form(kind: ReplicationType) -> ReplicationFormData {
        ReplicationFormData {
            from_bucket: "beer-sample".to_string(),
            to_cluster: "east".to_string(),
            to_bucket: "beer-backup".to_string(),
            kind,
            filter_expression: Some("^brewery".to_string()),
            filter_skip_restream: "true".to_string(),
            compression_type: Some("Auto".to_string()),
            network_usage_limit: Some(512),
        }
    }

    #[test]
    fn non_enterprise_strips_filter_fields() {
        let settings = prepare_replication_settings(&form(ReplicationType::Xmem), false, true, true);
        assert_eq!(settings.filter_expression, None);
        assert_eq!(settings.filter_skip_restream, None);
        assert_eq!(settings.compression_type, None);
        assert_eq!(settings.network_usage_limit, None);
    }

    #[test]
    fn skip_restream_requires_edit_mode() {
        let editing = prepare_replication_settings(&form(ReplicationType::Xmem), true, true, true);
        assert_eq!(editing.filter_skip_restream, Some(true));

        let creating = prepare_replication_settings(&form(ReplicationType::Xmem), true, true, false);
        assert_eq!(creating.filter_skip_restream, None);
    }

    #[test]
    fn skip_restream_string_converts_to_bool() {
        let mut data = form(ReplicationType::Xmem);
        data.filter_skip_restream = "false".to_string();
        let settings = prepare_replication_settings(&data, true, true, true);
        assert_eq!(settings.filter_skip_restream, Some(false));
    }

    #[test]
    fn compression_requires_enterprise_compat_and_non_capi() {
        let capi = prepare_replication_settings(&form(ReplicationType::Capi), true, true, true);
        assert_eq!(capi.compression_type, None);

        let old_compat = prepare_replication_settings(&form(ReplicationType::Xmem), true, false, true);
        assert_eq!(old_compat.compression_type, None);

        let eligible = prepare_replication_settings(&form(ReplicationType::Xmem), true, true, true);
        assert_eq!(eligible.compression_type.as_deref(), Some("Auto"));
    }

    #[test]
    fn network_limit_requires_enterprise_xmem() {
        let capi = prepare_replication_settings(&form(ReplicationType::Capi), true, true, true);
        assert_eq!(capi.network_usage_limit, None);

        let xmem = prepare_replication_settings(&form(ReplicationType::Xmem), true, true, true);
        assert_eq!(xmem.network_usage_limit, Some(512));
    }

    #[test]
    fn replication_type_is_always_continuous() {
        for enterprise in [false, true] {
            let settings =
                prepare_replication_settings(&form(ReplicationType::Capi), enterprise, false, false);
            let payload = serde_json::to_value(settings).expect("serialize");
            assert_eq!(payload["replicationType"], json!("continuous"));
        }
    }

    #[test]
    fn stripped_fields_are_absent_from_the_payload() {
        let settings = prepare_replication_settings(&form(ReplicationType::Capi), false, false, false);
        let payload = serde_json::to_value(settings).expect("serialize");
        let object = payload.as_object().expect("object payload");
        for field in [
            "filterExpression",
            "filterSkipRestream",
            "compressionType",
            "networkUsageLimit",
        ] {
            assert!(!object.contains_key(field), "{} should be absent", field);
        }
        assert_eq!(payload["type"], json!("capi"));
        assert_eq!(payload["fromBucket"], json!("beer-sample"));
    }

    fn listed(uuid: &str, deleted: bool, name: &str) -> RemoteCluster {
        RemoteCluster {
            name: name.to_string(),
            hostname: format!("{}.example.com:8091", name),
            deleted,
            uuid: Some(uuid.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn snapshot_filters_deleted_and_sorts_by_name() {
        let snapshot = RemoteClusterSnapshot::new(vec![
            listed("a", false, "z"),
            listed("a", true, "y"),
            listed("b", false, "x"),
        ]);
        let names: Vec<&str> = snapshot.filtered.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["x", "z"]);
    }

    #[test]
    fn snapshot_groups_all_entries_by_uuid() {
        let snapshot = RemoteClusterSnapshot::new(vec![
            listed("a", false, "z"),
            listed("a", true, "y"),
            listed("b", false, "x"),
        ]);
        assert_eq!(snapshot.by_uuid.len(), 2);
        let group_a: Vec<&str> = snapshot.by_uuid["a"].iter().map(|c| c.name.as_str()).collect();
        assert_eq!(group_a, vec!["z", "y"]);
        assert_eq!(snapshot.by_uuid["b"].len(), 1);
        assert_eq!(snapshot.by_uuid["b"][0].name, "x");
    }

    #[test]
    fn entries_without_a_uuid_are_not_grouped() {
        let mut nameless = listed("a", false, "z");
        nameless.uuid = None;
        let snapshot = RemoteClusterSnapshot::new(vec![nameless]);
        assert!(snapshot.by_uuid.is_empty());
        assert_eq!(snapshot.filtered.len(), 1);
    }

    #[test]
    fn listing_deserializes_with_absent_flags() {
        let listed: Vec<RemoteCluster> = serde_json::from_value(json!([
            {"name": "east", "hostname": "east.example.com:8091", "uuid": "a"},
            {"name": "west", "hostname": "west.example.com:8091", "uuid": "b", "deleted": true}
        ]))
        .expect("deserialize listing");
        assert!(!listed[0].deleted);
        assert!(listed[1].deleted);
        assert_eq!(listed[0].demand_encryption, None);
    }
}
