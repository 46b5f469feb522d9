//! Readiness probing of freshly created servers.
//!
//! A server counts as ready once `cloud-init status` reports `done`. The
//! probe never fails: anything that prevents reading the status means "not
//! ready yet" and the caller simply tries again.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::keys::IdentityFile;
use crate::provider::Server;
use crate::ssh::{CommandRunner, SshClient};

/// Remote command reporting cloud-init progress; always exits zero.
pub const CLOUD_INIT_STATUS_COMMAND: &str = "cloud-init status || true";

const DONE: &str = "done";

/// Parsed output of `cloud-init status`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct BootStatus {
    /// Reported status, for example `running` or `done`.
    pub status: String,
}

impl BootStatus {
    /// Returns `true` once provisioning has finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.status == DONE
    }
}

/// Checks whether a server has finished provisioning.
pub trait ReadinessProbe {
    /// Returns the boot status, or `None` when it cannot be determined.
    fn probe(&self, server: &Server, identity: &IdentityFile) -> Option<BootStatus>;
}

/// Probes readiness by running `cloud-init status` over SSH.
#[derive(Clone, Debug)]
pub struct SshProbe<R: CommandRunner> {
    ssh: SshClient<R>,
}

impl<R: CommandRunner> SshProbe<R> {
    /// Wraps an SSH client.
    #[must_use]
    pub const fn new(ssh: SshClient<R>) -> Self {
        Self { ssh }
    }
}

impl<R: CommandRunner> ReadinessProbe for SshProbe<R> {
    fn probe(&self, server: &Server, identity: &IdentityFile) -> Option<BootStatus> {
        let Some(host) = server.public_ipv4() else {
            debug!(server = %server.name, "server has no public IPv4 address yet");
            return None;
        };

        let output = match self.ssh.run(host, identity, CLOUD_INIT_STATUS_COMMAND) {
            Ok(output) => output,
            Err(err) => {
                warn!(error = %err, "failed to run readiness probe");
                return None;
            }
        };

        if !output.is_success() {
            debug!(
                code = ?output.code,
                stderr = %output.stderr.trim(),
                "readiness probe could not connect"
            );
            return None;
        }

        parse_status(&output.stdout)
    }
}

/// Parses `cloud-init status` output, which is a small YAML document.
#[must_use]
pub fn parse_status(stdout: &str) -> Option<BootStatus> {
    serde_yaml_ng::from_str(stdout)
        .map_err(|err| debug!(error = %err, "unparseable cloud-init status"))
        .ok()
}
