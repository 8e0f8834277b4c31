//! `LinodeProvider` implementation over the REST client

use crate::client::LinodeClient;
use async_trait::async_trait;
use linode_plugin_cloud::{
    CreateInstanceRequest, InstanceId, LinodeProvider, RemoteInstance, Result,
};

#[async_trait]
impl LinodeProvider for LinodeClient {
    async fn list_instances(&self) -> Result<Vec<RemoteInstance>> {
        Ok(LinodeClient::list_instances(self).await?)
    }

    async fn get_instance(&self, id: InstanceId) -> Result<RemoteInstance> {
        Ok(LinodeClient::get_instance(self, id).await?)
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<RemoteInstance> {
        Ok(LinodeClient::create_instance(self, request).await?)
    }

    async fn boot(&self, id: InstanceId) -> Result<()> {
        Ok(LinodeClient::boot(self, id).await?)
    }

    async fn shutdown(&self, id: InstanceId) -> Result<()> {
        Ok(LinodeClient::shutdown(self, id).await?)
    }

    async fn destroy(&self, id: InstanceId) -> Result<()> {
        Ok(self.delete_instance(id).await?)
    }

    async fn fetch_images(&self) -> Result<Vec<String>> {
        let images = self.list_images().await?;
        Ok(images
            .into_iter()
            .filter(|i| !i.deprecated)
            .map(|i| i.id)
            .collect())
    }

    async fn fetch_regions(&self) -> Result<Vec<String>> {
        let regions = self.list_regions().await?;
        Ok(regions
            .into_iter()
            .filter(|r| r.accepts_linodes())
            .map(|r| r.id)
            .collect())
    }

    async fn fetch_instance_types(&self, region: &str) -> Result<Vec<String>> {
        // The types endpoint is account-wide; every type is offered in every core region.
        tracing::debug!("Listing instance types for {}", region);
        let types = self.list_types().await?;
        Ok(types.into_iter().map(|t| t.id).collect())
    }
}
