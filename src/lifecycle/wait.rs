//! Polling of asynchronous provider actions.

use std::time::{Duration, Instant};

use tokio::time::sleep;
use tracing::debug;

use crate::probe::ReadinessProbe;
use crate::provider::{Action, ActionStatus, CloudApi};

use super::{Lifecycle, ProvisionError};

impl<A: CloudApi, P: ReadinessProbe> Lifecycle<A, P> {
    /// Polls `action` until it succeeds, fails or passes its deadline.
    ///
    /// Each poll sleeps first, then checks the deadline, then fetches the
    /// action. `None` means the provider had no asynchronous work to do.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::ActionFailed`] as soon as the provider
    /// reports an error, [`ProvisionError::ActionTimedOut`] once the deadline
    /// passes, or [`ProvisionError::Provider`] when polling fails.
    pub async fn wait_for_action(
        &self,
        action: Option<&Action>,
        timeout: Duration,
    ) -> Result<(), ProvisionError> {
        let Some(pending) = action else {
            return Ok(());
        };

        let deadline = Instant::now() + timeout;
        loop {
            sleep(self.poll_interval).await;
            if Instant::now() > deadline {
                return Err(ProvisionError::ActionTimedOut {
                    id: pending.id,
                    command: pending.command.clone(),
                });
            }

            let current = self.api.action_by_id(pending.id).await?;
            match current.status {
                ActionStatus::Success => {
                    debug!(id = current.id, command = %current.command, "action finished");
                    return Ok(());
                }
                ActionStatus::Error => {
                    let (code, message) = current.error.map_or_else(
                        || (String::from("unknown"), String::from("action failed")),
                        |error| (error.code, error.message),
                    );
                    return Err(ProvisionError::ActionFailed { code, message });
                }
                ActionStatus::Running => {
                    debug!(id = current.id, command = %current.command, "action still running");
                }
            }
        }
    }

    /// Waits for each action in turn, each with its own `timeout`.
    ///
    /// # Errors
    ///
    /// Stops at the first action that fails; see
    /// [`Lifecycle::wait_for_action`].
    pub async fn wait_for_actions<'a>(
        &self,
        actions: impl IntoIterator<Item = &'a Action>,
        timeout: Duration,
    ) -> Result<(), ProvisionError> {
        for action in actions {
            self.wait_for_action(Some(action), timeout).await?;
        }
        Ok(())
    }
}
