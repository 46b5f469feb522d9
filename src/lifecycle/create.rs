//! Workspace creation: request building, volume reuse, server submission
//! and the readiness loop.

use tokio::time::sleep;
use tracing::{debug, info};

use crate::cloud_init;
use crate::keys::{IdentityFile, MachineKeys};
use crate::options::ProviderOptions;
use crate::probe::ReadinessProbe;
use crate::provider::{
    Architecture, CloudApi, CreateServerRequest, CreateVolumeRequest, Server, Volume,
    chain_actions,
};
use crate::workspace::{WorkspaceName, resource_labels};

use super::{Lifecycle, ProvisionError};

/// Filesystem the provider formats new volumes with.
const VOLUME_FORMAT: &str = "ext4";

/// Everything needed to submit a workspace server.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServerPlan {
    /// Server request without volume or user-data; [`Lifecycle::create`]
    /// fills both in.
    pub request: CreateServerRequest,
    /// Public key injected through cloud-init.
    pub public_key: String,
    /// Private key used by the readiness probe.
    pub identity: IdentityFile,
}

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Resolves the configured location, server type and image, and
    /// registers the machine key.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::UnknownRegion`],
    /// [`ProvisionError::UnknownMachineType`] or
    /// [`ProvisionError::UnknownDiskImage`] when a name does not resolve,
    /// [`ProvisionError::BadCredential`] for an unparseable key, and
    /// [`ProvisionError::Provider`] when a call fails.
    pub async fn build_server_request(
        &self,
        workspace: &WorkspaceName,
        options: &ProviderOptions,
        keys: &MachineKeys,
    ) -> Result<ServerPlan, ProvisionError> {
        let location = self
            .api
            .location_by_name(&options.region)
            .await?
            .ok_or_else(|| ProvisionError::UnknownRegion(options.region.clone()))?;

        let server_type = self
            .api
            .server_type_by_name(&options.machine_type)
            .await?
            .ok_or_else(|| ProvisionError::UnknownMachineType(options.machine_type.clone()))?;

        let ssh_key = self.upsert_ssh_key(keys.public_key(), workspace).await?;

        let arch = Architecture::for_server_type(&server_type.name);
        let image = self
            .api
            .image_by_name_and_architecture(&options.disk_image, arch)
            .await?
            .ok_or_else(|| ProvisionError::UnknownDiskImage {
                name: options.disk_image.clone(),
                arch,
            })?;

        debug!(
            location = %location.name,
            server_type = %server_type.name,
            image = image.id,
            %arch,
            "resolved server options"
        );

        Ok(ServerPlan {
            request: CreateServerRequest {
                name: workspace.as_str().to_owned(),
                server_type: server_type.name,
                image: image.id,
                location: location.name,
                ssh_keys: vec![ssh_key.id],
                volumes: Vec::new(),
                automount: false,
                user_data: None,
                labels: resource_labels(),
            },
            public_key: keys.public_key().to_owned(),
            identity: keys.identity().clone(),
        })
    }

    /// Creates the workspace server, reusing the workspace volume if one
    /// exists, and waits until cloud-init has finished.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::ProvisioningExceededAttempts`] when the
    /// server never becomes ready, and any lookup, action or provider error
    /// from the steps before. Nothing is rolled back on failure.
    pub async fn create(
        &self,
        plan: ServerPlan,
        disk_size_gb: u32,
    ) -> Result<Server, ProvisionError> {
        let ServerPlan {
            mut request,
            public_key,
            identity,
        } = plan;

        let volume = self
            .ensure_volume(&request.name, &request.location, disk_size_gb)
            .await?;

        request.user_data = Some(cloud_init::render(&public_key, volume.id)?);
        request.volumes = vec![volume.id];

        info!(name = %request.name, volume = volume.id, "creating server");
        let created = self.api.create_server(&request).await?;
        self.wait_for_actions(
            chain_actions(created.action.as_ref(), &created.next_actions),
            self.server_create_timeout,
        )
        .await?;

        self.wait_until_provisioned(&created.server, &identity)
            .await?;
        info!(name = %created.server.name, "server is ready");
        Ok(created.server)
    }

    async fn ensure_volume(
        &self,
        name: &str,
        location: &str,
        size: u32,
    ) -> Result<Volume, ProvisionError> {
        if let Some(existing) = self.find_volume_by_name(name).await? {
            info!(name, volume = existing.id, "reusing existing volume");
            return Ok(existing);
        }

        let request = CreateVolumeRequest {
            name: name.to_owned(),
            size,
            location: location.to_owned(),
            format: VOLUME_FORMAT.to_owned(),
            automount: false,
            labels: resource_labels(),
        };
        info!(name, size, "creating volume");
        let created = self.api.create_volume(&request).await?;
        self.wait_for_actions(
            chain_actions(created.action.as_ref(), &created.next_actions),
            self.action_timeout,
        )
        .await?;
        Ok(created.volume)
    }

    async fn wait_until_provisioned(
        &self,
        server: &Server,
        identity: &IdentityFile,
    ) -> Result<(), ProvisionError> {
        let mut attempt: u32 = 0;
        loop {
            if attempt >= self.provision_attempts {
                return Err(ProvisionError::ProvisioningExceededAttempts(attempt));
            }
            attempt += 1;
            sleep(self.poll_interval).await;

            match self.probe.probe(server, identity) {
                Some(status) if status.is_done() => return Ok(()),
                Some(status) => debug!(attempt, status = %status.status, "cloud-init still running"),
                None => debug!(attempt, "server not reachable yet"),
            }
        }
    }
}
