//! SSH client settings.
//!
//! Settings are layered by `ortho-config`: built-in defaults, then an
//! optional configuration file, then `HETZNER_SSH_*` environment variables.

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::cloud_init::SSH_USERNAME;

/// Default SSH executable.
pub const DEFAULT_SSH_BIN: &str = "ssh";

/// Default SSH port on workspace servers.
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Default known hosts file; workspace hosts are ephemeral.
pub const DEFAULT_KNOWN_HOSTS_FILE: &str = "/dev/null";

/// Default connection timeout passed to `ssh -o ConnectTimeout`.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// SSH settings loaded via `ortho-config`.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "HETZNER_SSH",
    discovery(
        app_name = "devpod-provider-hetzner",
        env_var = "HETZNER_SSH_CONFIG_PATH",
        config_file_name = "ssh.toml",
        dotfile_name = ".devpod-provider-hetzner.toml",
        project_file_name = "devpod-provider-hetzner.toml"
    )
)]
pub struct SshConfig {
    /// Path to the `ssh` executable.
    #[ortho_config(default = DEFAULT_SSH_BIN.to_owned())]
    pub ssh_bin: String,
    /// Remote user to connect as.
    #[ortho_config(default = SSH_USERNAME.to_owned())]
    pub user: String,
    /// Remote SSH port.
    #[ortho_config(default = DEFAULT_SSH_PORT)]
    pub port: u16,
    /// Whether to force batch mode so `ssh` never prompts.
    #[ortho_config(default = true)]
    pub batch_mode: bool,
    /// Whether to enforce host key checking.
    #[ortho_config(default = false)]
    pub strict_host_key_checking: bool,
    /// Known hosts file override.
    #[ortho_config(default = DEFAULT_KNOWN_HOSTS_FILE.to_owned())]
    pub known_hosts_file: String,
    /// Connection timeout in seconds; zero leaves the `ssh` default.
    #[ortho_config(default = DEFAULT_CONNECT_TIMEOUT_SECS)]
    pub connect_timeout_secs: u64,
}

impl Default for SshConfig {
    fn default() -> Self {
        Self {
            ssh_bin: DEFAULT_SSH_BIN.to_owned(),
            user: SSH_USERNAME.to_owned(),
            port: DEFAULT_SSH_PORT,
            batch_mode: true,
            strict_host_key_checking: false,
            known_hosts_file: DEFAULT_KNOWN_HOSTS_FILE.to_owned(),
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// Errors raised when loading SSH settings from layered sources.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SshConfigLoadError {
    /// Parsing or merging configuration layers failed.
    #[error("ssh configuration parsing failed: {0}")]
    Parse(String),
}

impl SshConfig {
    /// Loads settings from defaults, configuration files and the environment
    /// without reading command-line arguments.
    ///
    /// # Errors
    ///
    /// Returns [`SshConfigLoadError::Parse`] when merging sources fails.
    pub fn load_without_cli_args() -> Result<Self, SshConfigLoadError> {
        Self::load_from_iter([std::ffi::OsString::from("devpod-provider-hetzner")])
            .map_err(|err| SshConfigLoadError::Parse(err.to_string()))
    }

    /// Names the first required field that is blank, if any.
    #[must_use]
    pub fn blank_field(&self) -> Option<&'static str> {
        [("ssh_bin", &self.ssh_bin), ("user", &self.user)]
            .into_iter()
            .find(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field)
    }
}
