use reqwest::Method;

use crate::{Client, Cluster, ClusterOpt, ResourceId, Result};

const VERSION_PATH: &str = "version";
const LIST_SUFFIX: &str = "list";
const REPAIR_SUFFIX: &str = "repair";
const HA_SUFFIX: &str = "ha";
const HEALTH_SUFFIX: &str = "health";

/// Cluster operations, scoped to the client's project and region.
#[derive(Clone, Copy, Debug)]
pub struct Clusters<'a> {
    client: &'a Client,
}

impl<'a> Clusters<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Version string reported by the API server.
    pub async fn server_version(&self) -> Result<String> {
        self.client
            .call::<(), _>(Method::GET, VERSION_PATH, None)
            .await
    }

    pub async fn list(&self) -> Result<Vec<Cluster>> {
        let path = format!("{}/{LIST_SUFFIX}", self.client.scope_path());
        self.client.call::<(), _>(Method::GET, &path, None).await
    }

    /// Creates a cluster and returns its identifier.
    pub async fn create(&self, opt: &ClusterOpt) -> Result<ResourceId> {
        let path = self.client.scope_path();
        self.client.call(Method::POST, &path, Some(opt)).await
    }

    pub async fn get(&self, cluster_id: ResourceId) -> Result<Cluster> {
        let path = self.cluster_path(cluster_id);
        self.client.call::<(), _>(Method::GET, &path, None).await
    }

    pub async fn delete(&self, cluster_id: ResourceId) -> Result<()> {
        let path = self.cluster_path(cluster_id);
        self.client
            .call_discard::<()>(Method::DELETE, &path, None)
            .await
    }

    /// Asks the service to repair a degraded cluster.
    pub async fn repair(&self, cluster_id: ResourceId) -> Result<()> {
        let path = format!("{}/{REPAIR_SUFFIX}", self.cluster_path(cluster_id));
        self.client
            .call_discard::<()>(Method::POST, &path, None)
            .await
    }

    /// Promotes the control plane to high availability.
    pub async fn make_ha(&self, cluster_id: ResourceId) -> Result<()> {
        let path = format!("{}/{HA_SUFFIX}", self.cluster_path(cluster_id));
        self.client
            .call_discard::<()>(Method::POST, &path, None)
            .await
    }

    /// Succeeds when the service reports the cluster healthy.
    pub async fn healthy(&self, cluster_id: ResourceId) -> Result<()> {
        let path = format!("{}/{HEALTH_SUFFIX}", self.cluster_path(cluster_id));
        self.client
            .call_discard::<()>(Method::GET, &path, None)
            .await
    }

    fn cluster_path(&self, cluster_id: ResourceId) -> String {
        format!("{}/{cluster_id}", self.client.scope_path())
    }
}
