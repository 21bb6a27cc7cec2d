use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier the service assigns to clusters and pools.
pub type ResourceId = u64;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Cluster {
    pub id: ResourceId,
    #[serde(rename = "projectID")]
    pub project_id: i64,
    #[serde(rename = "regionID")]
    pub region_id: i64,
    pub processing: bool,
    pub ha: bool,
    #[serde(rename = "internalLB")]
    pub internal_lb: bool,
    pub endpoint: String,
    pub kube_auth_type: String,
    pub version: String,
    pub name: String,
    #[serde(rename = "networkID")]
    pub network_id: String,
    #[serde(rename = "subnetID")]
    pub subnet_id: String,
    pub state: String,
    pub status: String,
    pub existed: String,
    pub created: DateTime<Utc>,
    pub masters_pool: Pool,
    pub workers_pools: Vec<Pool>,
}

/// Payload for creating a cluster.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterOpt {
    pub ha: bool,
    #[serde(rename = "internalLB")]
    pub internal_lb: bool,
    pub auth_type: String,
    pub name: String,
    pub version: String,
    pub api_lb_flavor: String,
    #[serde(rename = "networkID")]
    pub network_id: String,
    #[serde(rename = "subnetID")]
    pub subnet_id: String,
    pub master_opt: PoolOpt,
    pub worker_opts: Vec<PoolOpt>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Pool {
    pub id: ResourceId,
    pub node_count: i64,
    pub max_node_count: i64,
    pub min_node_count: i64,
    pub volume_size: i64,
    #[serde(rename = "set-k8s-taint")]
    pub set_taint: bool,
    #[serde(rename = "k8s-role")]
    pub role: String,
    pub name: String,
    pub flavor: String,
    pub state: String,
    pub status: String,
    pub volume_type: String,
}

/// Payload for creating or updating a node pool.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolOpt {
    pub node_count: i64,
    pub max_node_count: i64,
    pub min_node_count: i64,
    pub volume_size: i64,
    pub repair: bool,
    #[serde(rename = "set-taint")]
    pub set_taint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(rename = "k8s-role")]
    pub role: String,
    pub volume_type: String,
    pub name: String,
    pub flavor: String,
}

/// Kubeconfig issued for a user or the cluster admin.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub content: String,
}

/// Identifies a cluster user and the credential to issue.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserOpt {
    pub role: String,
    pub name: String,
    pub namespace: String,
    pub seconds_exp: u64,
}

/// A Kubernetes role users can be bound to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Role {
    pub name: String,
    pub namespace: String,
    pub cluster_scoped: bool,
    pub description: String,
}
