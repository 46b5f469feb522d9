//! Workspace lifecycle orchestration.
//!
//! [`Lifecycle`] drives a workspace from absent to running, stopped and
//! absent again using only the [`CloudApi`] capability set. Every operation
//! runs its provider calls strictly in sequence. Mutating calls hand back
//! actions that are polled to completion before the next step starts.
//!
//! "Stopping" a workspace deletes its server and keeps the volume, so the
//! volume alone distinguishes a stopped workspace from an absent one.

use std::time::Duration;

use tracing::info;

use crate::probe::ReadinessProbe;
use crate::provider::CloudApi;

mod create;
mod credential;
mod error;
mod locate;
mod status;
mod teardown;
mod wait;

pub use create::ServerPlan;
pub use error::ProvisionError;
pub use status::WorkspaceStatus;

/// Interval between polls of actions, volumes and readiness.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Deadline for ordinary actions.
pub const DEFAULT_ACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Deadline for the actions of a server creation.
pub const DEFAULT_SERVER_CREATE_TIMEOUT: Duration = Duration::from_secs(300);

/// Number of readiness probes before provisioning is abandoned.
pub const DEFAULT_PROVISION_ATTEMPTS: u32 = 300;

/// Page size of the token check performed by [`Lifecycle::init`].
const INIT_LIST_LIMIT: u32 = 1;

/// Orchestrates workspace operations against a cloud provider.
#[derive(Clone, Debug)]
pub struct Lifecycle<A: CloudApi, P: ReadinessProbe> {
    api: A,
    probe: P,
    poll_interval: Duration,
    action_timeout: Duration,
    server_create_timeout: Duration,
    provision_attempts: u32,
}

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Creates an orchestrator with the default intervals and limits.
    #[must_use]
    pub const fn new(api: A, probe: P) -> Self {
        Self {
            api,
            probe,
            poll_interval: DEFAULT_POLL_INTERVAL,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
            server_create_timeout: DEFAULT_SERVER_CREATE_TIMEOUT,
            provision_attempts: DEFAULT_PROVISION_ATTEMPTS,
        }
    }

    /// Overrides the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Overrides the deadline for ordinary actions.
    #[must_use]
    pub const fn with_action_timeout(mut self, timeout: Duration) -> Self {
        self.action_timeout = timeout;
        self
    }

    /// Overrides the deadline for server creation actions.
    #[must_use]
    pub const fn with_server_create_timeout(mut self, timeout: Duration) -> Self {
        self.server_create_timeout = timeout;
        self
    }

    /// Overrides the readiness attempt cap.
    #[must_use]
    pub const fn with_provision_attempts(mut self, attempts: u32) -> Self {
        self.provision_attempts = attempts;
        self
    }

    /// Returns the provider handle.
    #[must_use]
    pub const fn api(&self) -> &A {
        &self.api
    }

    /// Checks that the provider accepts the configured token.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Provider`] when the list call fails.
    pub async fn init(&self) -> Result<(), ProvisionError> {
        self.api.list_servers(INIT_LIST_LIMIT).await?;
        info!("provider credentials accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests;
