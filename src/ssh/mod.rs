//! SSH transport that shells out to the system `ssh` client.
//!
//! Commands run as the workspace login user with the machine's private key.
//! Host key checking is relaxed by default because every workspace server is
//! freshly provisioned.

use std::ffi::OsString;
use std::net::IpAddr;

use thiserror::Error;
use tracing::debug;

use crate::keys::IdentityFile;

mod config;
mod runner;

pub use config::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_KNOWN_HOSTS_FILE, DEFAULT_SSH_BIN, DEFAULT_SSH_PORT,
    SshConfig, SshConfigLoadError,
};
pub use runner::{
    CommandError, CommandOutput, CommandRunner, ProcessCommandRunner, StreamingCommandRunner,
};

/// Errors surfaced by the SSH transport.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SshError {
    /// A required setting is blank.
    #[error("invalid ssh configuration: `{field}` must not be empty")]
    InvalidConfig {
        /// Name of the blank setting.
        field: String,
    },
    /// The `ssh` process could not be run.
    #[error(transparent)]
    Command(#[from] CommandError),
}

/// Runs commands on a remote host through `ssh`.
#[derive(Clone, Debug)]
pub struct SshClient<R: CommandRunner> {
    config: SshConfig,
    runner: R,
}

impl<R: CommandRunner> SshClient<R> {
    /// Creates a client using `runner` to spawn `ssh`.
    ///
    /// # Errors
    ///
    /// Returns [`SshError::InvalidConfig`] when a required setting is blank.
    pub fn new(config: SshConfig, runner: R) -> Result<Self, SshError> {
        if let Some(field) = config.blank_field() {
            return Err(SshError::InvalidConfig {
                field: field.to_owned(),
            });
        }
        Ok(Self { config, runner })
    }

    /// Returns the active settings.
    #[must_use]
    pub const fn config(&self) -> &SshConfig {
        &self.config
    }

    /// Executes `command` on `host`, returning the remote exit status.
    ///
    /// A non-zero exit is not an error; callers inspect
    /// [`CommandOutput::code`].
    ///
    /// # Errors
    ///
    /// Returns [`SshError::Command`] when `ssh` cannot be spawned.
    pub fn run(
        &self,
        host: IpAddr,
        identity: &IdentityFile,
        command: &str,
    ) -> Result<CommandOutput, SshError> {
        let args = self.build_args(host, identity, command);
        debug!(%host, command, "running remote command");
        Ok(self.runner.run(&self.config.ssh_bin, &args)?)
    }

    fn build_args(&self, host: IpAddr, identity: &IdentityFile, command: &str) -> Vec<OsString> {
        let mut args = vec![
            OsString::from("-p"),
            OsString::from(self.config.port.to_string()),
            OsString::from("-i"),
            OsString::from(identity.path().as_str()),
        ];

        if self.config.batch_mode {
            args.push(OsString::from("-o"));
            args.push(OsString::from("BatchMode=yes"));
        }

        if !self.config.strict_host_key_checking {
            args.push(OsString::from("-o"));
            args.push(OsString::from("StrictHostKeyChecking=no"));
        }

        if !self.config.known_hosts_file.trim().is_empty() {
            args.push(OsString::from("-o"));
            args.push(OsString::from(format!(
                "UserKnownHostsFile={}",
                self.config.known_hosts_file
            )));
        }

        if self.config.connect_timeout_secs > 0 {
            args.push(OsString::from("-o"));
            args.push(OsString::from(format!(
                "ConnectTimeout={}",
                self.config.connect_timeout_secs
            )));
        }

        args.push(OsString::from(format!("{}@{host}", self.config.user)));
        args.push(OsString::from(command));
        args
    }
}
