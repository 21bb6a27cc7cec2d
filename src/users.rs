use reqwest::Method;

use crate::{request::Destination, Client, ResourceId, Result, UserConfig, UserOpt};

const USER_SUFFIX: &str = "kube/user";
const ADMIN_SUFFIX: &str = "kube/admin";

/// Kubeconfig credentials for cluster users.
#[derive(Clone, Copy, Debug)]
pub struct Users<'a> {
    client: &'a Client,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// Issues an admin kubeconfig valid for `ttl` (e.g. `"24h"`).
    pub async fn admin_config(&self, cluster_id: ResourceId, ttl: &str) -> Result<UserConfig> {
        let path = format!("{}/{ADMIN_SUFFIX}", self.cluster_path(cluster_id));
        let request = self
            .client
            .build_request::<()>(Method::GET, &path, None)?
            .with_query([("ttl", ttl)]);
        let mut config = UserConfig::default();
        self.client
            .execute(request, Destination::DecodeInto(&mut config))
            .await?;
        Ok(config)
    }

    /// Issues a kubeconfig for the user described by `opt`.
    pub async fn user_config(&self, cluster_id: ResourceId, opt: &UserOpt) -> Result<UserConfig> {
        let path = format!("{}/{USER_SUFFIX}", self.cluster_path(cluster_id));
        self.client.call(Method::POST, &path, Some(opt)).await
    }

    pub async fn delete_user(&self, cluster_id: ResourceId, opt: &UserOpt) -> Result<()> {
        let path = format!("{}/{USER_SUFFIX}", self.cluster_path(cluster_id));
        self.client
            .call_discard(Method::DELETE, &path, Some(opt))
            .await
    }

    fn cluster_path(&self, cluster_id: ResourceId) -> String {
        format!("{}/{cluster_id}", self.client.scope_path())
    }
}
