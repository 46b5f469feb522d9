//! Hetzner Cloud implementation of [`CloudApi`].
//!
//! Calls go straight to the public REST API with `reqwest`; every request is
//! authenticated with the project's bearer token.

use std::time::Duration;

use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::provider::{
    Action, ApiFuture, Architecture, CloudApi, CreateServerRequest, CreateSshKeyRequest,
    CreateVolumeRequest, Image, Location, ProviderError, ResourceId, Server, ServerCreated,
    ServerType, SshKey, Volume, VolumeCreated,
};

mod wire;

use wire::{
    ActionEnvelope, ErrorEnvelope, ImageList, LocationList, OptionalActionEnvelope, ServerList,
    ServerTypeList, SshKeyEnvelope, SshKeyList, VolumeList,
};

/// Base URL of the Hetzner Cloud API.
pub const HETZNER_API_BASE: &str = "https://api.hetzner.cloud/v1";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const PAGE_SIZE: &str = "50";

/// Client for the Hetzner Cloud API.
#[derive(Clone, Debug)]
pub struct HetznerApi {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HetznerApi {
    /// Creates a client for the public API endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Client`] when the HTTP client cannot be built.
    pub fn new(token: impl Into<String>) -> Result<Self, ProviderError> {
        Self::with_base_url(token, HETZNER_API_BASE)
    }

    /// Creates a client for an alternative endpoint, such as a local proxy.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Client`] when the HTTP client cannot be built.
    pub fn with_base_url(
        token: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let client = build_client(reqwest::Client::builder().timeout(HTTP_TIMEOUT))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ProviderError> {
        let builder = self.client.get(self.url(path)).query(query);
        let body = self.execute(path, builder).await?;
        decode(path, &body)
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        path: &str,
        payload: &B,
    ) -> Result<T, ProviderError> {
        let builder = self.client.post(self.url(path)).json(payload);
        let body = self.execute(path, builder).await?;
        decode(path, &body)
    }

    async fn delete(&self, path: &str) -> Result<Vec<u8>, ProviderError> {
        let builder = self.client.delete(self.url(path));
        self.execute(path, builder).await
    }

    async fn execute(&self, path: &str, builder: RequestBuilder) -> Result<Vec<u8>, ProviderError> {
        debug!(endpoint = path, "calling Hetzner API");
        let response = builder
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|err| ProviderError::Http {
                endpoint: path.to_owned(),
                message: err.to_string(),
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| ProviderError::Http {
                endpoint: path.to_owned(),
                message: err.to_string(),
            })?;

        if status.is_success() {
            return Ok(body.to_vec());
        }

        Err(api_error(path, status, &body))
    }
}

fn build_client(builder: reqwest::ClientBuilder) -> Result<reqwest::Client, ProviderError> {
    builder.build().map_err(|err| ProviderError::Client {
        message: err.to_string(),
    })
}

fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> Result<T, ProviderError> {
    serde_json::from_slice(body).map_err(|err| ProviderError::Decode {
        endpoint: path.to_owned(),
        message: err.to_string(),
    })
}

fn api_error(path: &str, status: StatusCode, body: &[u8]) -> ProviderError {
    let (code, message) = match serde_json::from_slice::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.code, envelope.error.message),
        Err(_) => (
            String::from("unknown"),
            String::from_utf8_lossy(body).into_owned(),
        ),
    };
    ProviderError::Api {
        endpoint: path.to_owned(),
        status: status.as_u16(),
        code,
        message,
    }
}

impl CloudApi for HetznerApi {
    fn location_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<Location>> {
        Box::pin(async move {
            let list: LocationList = self.get_json("/locations", &[("name", name)]).await?;
            Ok(list.locations.into_iter().next())
        })
    }

    fn server_type_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<ServerType>> {
        Box::pin(async move {
            let list: ServerTypeList = self.get_json("/server_types", &[("name", name)]).await?;
            Ok(list.server_types.into_iter().next())
        })
    }

    fn image_by_name_and_architecture<'a>(
        &'a self,
        name: &'a str,
        architecture: Architecture,
    ) -> ApiFuture<'a, Option<Image>> {
        Box::pin(async move {
            let list: ImageList = self
                .get_json(
                    "/images",
                    &[
                        ("name", name),
                        ("architecture", architecture.as_str()),
                        ("include_deprecated", "true"),
                    ],
                )
                .await?;
            Ok(list.images.into_iter().next())
        })
    }

    fn ssh_key_by_fingerprint<'a>(
        &'a self,
        fingerprint: &'a str,
    ) -> ApiFuture<'a, Option<SshKey>> {
        Box::pin(async move {
            let list: SshKeyList = self
                .get_json("/ssh_keys", &[("fingerprint", fingerprint)])
                .await?;
            Ok(list.ssh_keys.into_iter().next())
        })
    }

    fn ssh_keys_by_label<'a>(&'a self, selector: &'a str) -> ApiFuture<'a, Vec<SshKey>> {
        Box::pin(async move {
            let list: SshKeyList = self
                .get_json(
                    "/ssh_keys",
                    &[("label_selector", selector), ("per_page", PAGE_SIZE)],
                )
                .await?;
            Ok(list.ssh_keys)
        })
    }

    fn create_ssh_key<'a>(&'a self, request: &'a CreateSshKeyRequest) -> ApiFuture<'a, SshKey> {
        Box::pin(async move {
            let created: SshKeyEnvelope = self.post_json("/ssh_keys", request).await?;
            Ok(created.ssh_key)
        })
    }

    fn delete_ssh_key(&self, id: ResourceId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.delete(&format!("/ssh_keys/{id}")).await?;
            Ok(())
        })
    }

    fn volumes_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Vec<Volume>> {
        Box::pin(async move {
            let list: VolumeList = self.get_json("/volumes", &[("name", name)]).await?;
            Ok(list.volumes)
        })
    }

    fn create_volume<'a>(
        &'a self,
        request: &'a CreateVolumeRequest,
    ) -> ApiFuture<'a, VolumeCreated> {
        Box::pin(async move { self.post_json("/volumes", request).await })
    }

    fn detach_volume(&self, id: ResourceId) -> ApiFuture<'_, Action> {
        Box::pin(async move {
            let path = format!("/volumes/{id}/actions/detach");
            let envelope: ActionEnvelope = self.post_json(&path, &serde_json::json!({})).await?;
            Ok(envelope.action)
        })
    }

    fn delete_volume(&self, id: ResourceId) -> ApiFuture<'_, ()> {
        Box::pin(async move {
            self.delete(&format!("/volumes/{id}")).await?;
            Ok(())
        })
    }

    fn list_servers(&self, limit: u32) -> ApiFuture<'_, Vec<Server>> {
        Box::pin(async move {
            let per_page = limit.to_string();
            let list: ServerList = self
                .get_json("/servers", &[("per_page", per_page.as_str())])
                .await?;
            Ok(list.servers)
        })
    }

    fn servers_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Vec<Server>> {
        Box::pin(async move {
            let list: ServerList = self.get_json("/servers", &[("name", name)]).await?;
            Ok(list.servers)
        })
    }

    fn create_server<'a>(
        &'a self,
        request: &'a CreateServerRequest,
    ) -> ApiFuture<'a, ServerCreated> {
        Box::pin(async move { self.post_json("/servers", request).await })
    }

    fn delete_server(&self, id: ResourceId) -> ApiFuture<'_, Option<Action>> {
        Box::pin(async move {
            let path = format!("/servers/{id}");
            let body = self.delete(&path).await?;
            let envelope: OptionalActionEnvelope = decode(&path, &body)?;
            Ok(envelope.action)
        })
    }

    fn action_by_id(&self, id: ResourceId) -> ApiFuture<'_, Action> {
        Box::pin(async move {
            let path = format!("/actions/{id}");
            let envelope: ActionEnvelope = self.get_json(&path, &[]).await?;
            Ok(envelope.action)
        })
    }
}

#[cfg(test)]
mod tests;
