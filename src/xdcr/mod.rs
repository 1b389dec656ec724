pub mod service;
pub mod types;

pub use service::{ReplicationTarget, XdcrService};
pub use types::{
    RemoteCluster, RemoteClusterSnapshot, ReplicationFormData, ReplicationSettings,
    ReplicationType, prepare_remote_cluster, prepare_replication_settings,
};
