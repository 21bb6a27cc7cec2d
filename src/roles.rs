use reqwest::Method;

use crate::{Client, ResourceId, Result, Role};

const ROLES_SUFFIX: &str = "kube/roles";

/// Roles available for binding cluster users.
#[derive(Clone, Copy, Debug)]
pub struct Roles<'a> {
    client: &'a Client,
}

impl<'a> Roles<'a> {
    pub(crate) fn new(client: &'a Client) -> Self {
        Self { client }
    }

    pub async fn list(&self, cluster_id: ResourceId) -> Result<Vec<Role>> {
        let path = self.roles_path(cluster_id);
        self.client.call::<(), _>(Method::GET, &path, None).await
    }

    pub async fn get(&self, cluster_id: ResourceId, name: &str) -> Result<Role> {
        let path = format!("{}/{name}", self.roles_path(cluster_id));
        self.client.call::<(), _>(Method::GET, &path, None).await
    }

    fn roles_path(&self, cluster_id: ResourceId) -> String {
        format!("{}/{cluster_id}/{ROLES_SUFFIX}", self.client.scope_path())
    }
}
