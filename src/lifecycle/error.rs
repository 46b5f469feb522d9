//! Error type for workspace lifecycle operations.

use thiserror::Error;

use crate::cloud_init::UserDataError;
use crate::fingerprint::FingerprintError;
use crate::provider::{Architecture, ProviderError, ResourceId};

/// Errors raised while provisioning or tearing down a workspace.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProvisionError {
    /// The configured location does not exist.
    #[error("unknown region: {0}")]
    UnknownRegion(String),
    /// The configured server type does not exist.
    #[error("unknown machine type: {0}")]
    UnknownMachineType(String),
    /// No image with the configured name exists for the architecture.
    #[error("unknown disk image '{name}' for architecture {arch}")]
    UnknownDiskImage {
        /// Configured image name.
        name: String,
        /// Architecture inferred from the server type.
        arch: Architecture,
    },
    /// The machine's public key cannot be parsed.
    #[error("bad ssh key: {0}")]
    BadCredential(#[from] FingerprintError),
    /// The cloud-init user data could not be rendered.
    #[error(transparent)]
    UserData(#[from] UserDataError),
    /// More than one server carries the workspace name.
    #[error("multiple servers with name {0} found")]
    MultipleServersFound(String),
    /// More than one volume carries the workspace name.
    #[error("multiple volumes with name {0} found")]
    MultipleVolumesFound(String),
    /// An action was still running at its deadline.
    #[error("action {id} ({command}) timed out")]
    ActionTimedOut {
        /// Action identifier.
        id: ResourceId,
        /// Command the action performs.
        command: String,
    },
    /// The provider reported an action as failed.
    #[error("{code}: {message}")]
    ActionFailed {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },
    /// A provider call failed.
    #[error(transparent)]
    Provider(#[from] ProviderError),
    /// The server never reported cloud-init as done.
    #[error("exceeded attempts to connect to server: {0}")]
    ProvisioningExceededAttempts(u32),
}
