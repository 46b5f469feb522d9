//! Workspace deletion and stopping.

use tokio::time::sleep;
use tracing::{debug, info};

use crate::probe::ReadinessProbe;
use crate::provider::CloudApi;
use crate::workspace::WorkspaceName;

use super::{Lifecycle, ProvisionError};

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Deletes every resource belonging to the workspace.
    ///
    /// Keys go first, then the volume once it reports no server, then the
    /// server. Absent resources are skipped, so deleting a workspace that
    /// never existed succeeds.
    ///
    /// The wait for the volume to report itself detached has no deadline.
    ///
    /// # Errors
    ///
    /// Returns lookup, action and provider errors unchanged.
    pub async fn delete(&self, workspace: &WorkspaceName) -> Result<(), ProvisionError> {
        let name = workspace.as_str();

        let keys = self
            .api
            .ssh_keys_by_label(&workspace.key_label_selector())
            .await?;
        for key in keys {
            info!(name = %key.name, "deleting workspace key");
            self.api.delete_ssh_key(key.id).await?;
        }

        if let Some(volume) = self.find_volume_by_name(name).await? {
            if volume.server.is_some() {
                info!(volume = volume.id, "detaching volume");
                let action = self.api.detach_volume(volume.id).await?;
                self.wait_for_action(Some(&action), self.action_timeout)
                    .await?;
            }

            if self.wait_until_volume_detached(name).await? {
                info!(volume = volume.id, "deleting volume");
                self.api.delete_volume(volume.id).await?;
            }
        }

        self.delete_server(name).await
    }

    /// Deletes the workspace server and keeps its volume.
    ///
    /// # Errors
    ///
    /// Returns lookup, action and provider errors unchanged.
    pub async fn stop(&self, workspace: &WorkspaceName) -> Result<(), ProvisionError> {
        self.delete_server(workspace.as_str()).await
    }

    async fn delete_server(&self, name: &str) -> Result<(), ProvisionError> {
        let Some(server) = self.find_server_by_name(name).await? else {
            debug!(name, "no server to delete");
            return Ok(());
        };

        info!(name, server = server.id, "deleting server");
        let action = self.api.delete_server(server.id).await?;
        self.wait_for_action(action.as_ref(), self.action_timeout)
            .await
    }

    /// Polls until the volume reports no server. Returns `false` when the
    /// volume disappeared while waiting.
    async fn wait_until_volume_detached(&self, name: &str) -> Result<bool, ProvisionError> {
        loop {
            sleep(self.poll_interval).await;
            match self.find_volume_by_name(name).await? {
                None => return Ok(false),
                Some(current) if current.server.is_none() => return Ok(true),
                Some(current) => debug!(volume = current.id, "volume still attached"),
            }
        }
    }
}
