//! Workspace status projection.

use std::fmt;

use crate::probe::ReadinessProbe;
use crate::provider::{CloudApi, ServerStatus};
use crate::workspace::WorkspaceName;

use super::{Lifecycle, ProvisionError};

/// Coarse workspace state reported to DevPod.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkspaceStatus {
    /// The server exists and is running.
    Running,
    /// The server exists in any other state.
    Busy,
    /// No server, but the volume survives.
    Stopped,
    /// Neither server nor volume exists.
    NotFound,
}

impl WorkspaceStatus {
    /// Returns the text DevPod expects on standard output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Busy => "Busy",
            Self::Stopped => "Stopped",
            Self::NotFound => "NotFound",
        }
    }
}

impl fmt::Display for WorkspaceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Derives the workspace status from its server and volume.
    ///
    /// # Errors
    ///
    /// Returns lookup and provider errors; absent resources are not errors.
    pub async fn status(&self, workspace: &WorkspaceName) -> Result<WorkspaceStatus, ProvisionError> {
        let name = workspace.as_str();
        if let Some(server) = self.find_server_by_name(name).await? {
            return Ok(if server.status == ServerStatus::Running {
                WorkspaceStatus::Running
            } else {
                WorkspaceStatus::Busy
            });
        }

        Ok(if self.find_volume_by_name(name).await?.is_some() {
            WorkspaceStatus::Stopped
        } else {
            WorkspaceStatus::NotFound
        })
    }
}
