use reqwest::Method;

use crate::{Client, PoolOpt, ResourceId, Result};

const POOL_SUFFIX: &str = "pool";

/// Node pool operations on a cluster.
#[derive(Clone, Copy, Debug)]
pub struct Pools<'a> {
    client: &'a Client,
}

impl<'a> Pools<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn create(&self, cluster_id: ResourceId, opt: &PoolOpt) -> Result<()> {
        let path = self.pools_path(cluster_id);
        self.client.call_discard(Method::POST, &path, Some(opt)).await
    }

    pub async fn update(
        &self,
        cluster_id: ResourceId,
        pool_id: ResourceId,
        opt: &PoolOpt,
    ) -> Result<()> {
        let path = format!("{}/{pool_id}", self.pools_path(cluster_id));
        self.client.call_discard(Method::PATCH, &path, Some(opt)).await
    }

    pub async fn delete(&self, cluster_id: ResourceId, pool_id: ResourceId) -> Result<()> {
        let path = format!("{}/{pool_id}", self.pools_path(cluster_id));
        self.client
            .call_discard::<()>(Method::DELETE, &path, None)
            .await
    }

    fn pools_path(&self, cluster_id: ResourceId) -> String {
        format!("{}/{cluster_id}/{POOL_SUFFIX}", self.client.scope_path())
    }
}
