//! Provider options supplied by DevPod through the environment.
//!
//! DevPod passes every option as an environment variable. [`RawOptions`] is a
//! clap parser that only reads those variables; validation then collects all
//! missing keys before failing so a misconfigured provider reports the whole
//! problem at once.

use std::ffi::OsString;

use camino::Utf8PathBuf;
use clap::Parser;
use thiserror::Error;

/// Key holding the DevPod machine id.
pub const MACHINE_ID: &str = "MACHINE_ID";
/// Key holding the DevPod machine folder.
pub const MACHINE_FOLDER: &str = "MACHINE_FOLDER";
/// Key holding the API token, as named by DevPod.
pub const TOKEN: &str = "TOKEN";
/// Key holding the API token, as named by the Hetzner tooling.
pub const HCLOUD_TOKEN: &str = "HCLOUD_TOKEN";
/// Key holding the volume size in GiB.
pub const DISK_SIZE: &str = "DISK_SIZE";
/// Key holding the boot image name.
pub const DISK_IMAGE: &str = "DISK_IMAGE";
/// Key holding the server type name.
pub const MACHINE_TYPE: &str = "MACHINE_TYPE";
/// Key holding the location name.
pub const REGION: &str = "REGION";

/// Errors raised while loading options.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum OptionsError {
    /// The environment could not be read, for example a value that is not
    /// valid UTF-8.
    #[error("failed to read options: {0}")]
    Parse(String),
    /// One or more required keys are absent or empty.
    #[error("couldn't find option {} in environment, please make sure it is defined", keys.join(", "))]
    Missing {
        /// Every missing key, in lookup order.
        keys: Vec<String>,
    },
    /// `DISK_SIZE` is not a positive whole number of GiB.
    #[error("invalid DISK_SIZE `{value}`: expected a positive number of GiB")]
    InvalidDiskSize {
        /// Value as supplied.
        value: String,
    },
}

/// Options as DevPod hands them over, before validation.
#[derive(Clone, Debug, Default, Eq, Parser, PartialEq)]
#[command(name = "devpod-provider-hetzner", no_binary_name = true)]
pub struct RawOptions {
    /// DevPod machine id.
    #[arg(long, env = MACHINE_ID)]
    pub machine_id: Option<String>,
    /// Folder holding the machine's key pair.
    #[arg(long, env = MACHINE_FOLDER)]
    pub machine_folder: Option<String>,
    /// Deprecated API token key.
    #[arg(long, env = TOKEN, hide_env_values = true)]
    pub token: Option<String>,
    /// Hetzner Cloud API token.
    #[arg(long, env = HCLOUD_TOKEN, hide_env_values = true)]
    pub hcloud_token: Option<String>,
    /// Volume size in GiB.
    #[arg(long, env = DISK_SIZE)]
    pub disk_size: Option<String>,
    /// Image name.
    #[arg(long, env = DISK_IMAGE)]
    pub disk_image: Option<String>,
    /// Server type name.
    #[arg(long, env = MACHINE_TYPE)]
    pub machine_type: Option<String>,
    /// Location name.
    #[arg(long, env = REGION)]
    pub region: Option<String>,
}

impl RawOptions {
    /// Reads every option key from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError::Parse`] when a value cannot be read.
    pub fn from_env() -> Result<Self, OptionsError> {
        Self::try_parse_from(std::iter::empty::<OsString>())
            .map_err(|err| OptionsError::Parse(err.to_string()))
    }
}

/// Options needed for every provider call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProviderOptions {
    /// Hetzner Cloud API token.
    pub token: String,
    /// Whether the token came from the deprecated `TOKEN` key.
    pub token_from_deprecated_key: bool,
    /// Location name, for example `nbg1`.
    pub region: String,
    /// Image name, for example `docker-ce`.
    pub disk_image: String,
    /// Volume size in GiB.
    pub disk_size_gb: u32,
    /// Server type name, for example `cx32`.
    pub machine_type: String,
}

/// Options identifying one DevPod machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MachineOptions {
    /// DevPod machine id.
    pub machine_id: String,
    /// Folder holding the machine's key pair.
    pub machine_folder: Utf8PathBuf,
}

/// Options for commands that act on a specific machine.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WorkspaceOptions {
    /// Provider-wide options.
    pub provider: ProviderOptions,
    /// Machine-specific options.
    pub machine: MachineOptions,
}

impl ProviderOptions {
    /// Validates provider options only, as needed by `init`.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] when keys are missing or invalid.
    pub fn from_raw(raw: &RawOptions) -> Result<Self, OptionsError> {
        let mut validator = Validator::default();
        let provider = validator.provider(raw);
        validator.finish()?;
        provider
    }
}

impl WorkspaceOptions {
    /// Validates machine and provider options.
    ///
    /// # Errors
    ///
    /// Returns [`OptionsError`] when keys are missing or invalid.
    pub fn from_raw(raw: &RawOptions) -> Result<Self, OptionsError> {
        let mut validator = Validator::default();
        let machine_id = validator.require(raw.machine_id.as_deref(), MACHINE_ID);
        let machine_folder = validator.require(raw.machine_folder.as_deref(), MACHINE_FOLDER);
        let provider = validator.provider(raw);
        validator.finish()?;
        Ok(Self {
            provider: provider?,
            machine: MachineOptions {
                machine_id,
                machine_folder: Utf8PathBuf::from(machine_folder),
            },
        })
    }
}

#[derive(Default)]
struct Validator {
    missing: Vec<String>,
}

impl Validator {
    fn require(&mut self, value: Option<&str>, key: &str) -> String {
        present(value).map_or_else(
            || {
                self.missing.push(key.to_owned());
                String::new()
            },
            str::to_owned,
        )
    }

    fn token(&mut self, raw: &RawOptions) -> (String, bool) {
        if let Some(token) = present(raw.token.as_deref()) {
            return (token.to_owned(), true);
        }
        (self.require(raw.hcloud_token.as_deref(), HCLOUD_TOKEN), false)
    }

    /// Checks every provider key; a parse failure is deferred until missing
    /// keys have been reported.
    fn provider(&mut self, raw: &RawOptions) -> Result<ProviderOptions, OptionsError> {
        let (token, token_from_deprecated_key) = self.token(raw);
        let disk_size = present(raw.disk_size.as_deref());
        if disk_size.is_none() {
            self.missing.push(DISK_SIZE.to_owned());
        }
        let disk_image = self.require(raw.disk_image.as_deref(), DISK_IMAGE);
        let machine_type = self.require(raw.machine_type.as_deref(), MACHINE_TYPE);
        let region = self.require(raw.region.as_deref(), REGION);

        Ok(ProviderOptions {
            token,
            token_from_deprecated_key,
            region,
            disk_image,
            disk_size_gb: disk_size.map_or(Ok(0), parse_disk_size)?,
            machine_type,
        })
    }

    fn finish(self) -> Result<(), OptionsError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(OptionsError::Missing { keys: self.missing })
        }
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.trim().is_empty())
}

fn parse_disk_size(value: &str) -> Result<u32, OptionsError> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| OptionsError::InvalidDiskSize {
            value: value.to_owned(),
        })
}
