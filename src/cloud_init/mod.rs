//! Cloud-init user-data for workspace servers.
//!
//! The document is built as typed data and serialised with `serde_yaml_ng`,
//! so key material can never change its structure. It creates the login user
//! with the workspace key, mounts the persistent volume as that user's home,
//! installs Docker when the image lacks it and makes sure it is running.

use serde::Serialize;
use thiserror::Error;

use crate::provider::ResourceId;

/// Login user created on every workspace server.
pub const SSH_USERNAME: &str = "devpod";

const HEADER: &str = "#cloud-config\n";
const DOCKER_GROUP: &str = "docker";
const INSTALL_DOCKER: &str =
    "command -v docker >/dev/null 2>&1 || curl -fsSL https://get.docker.com | sh";

/// Raised when the user-data document cannot be serialised.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("failed to render cloud-init user data: {0}")]
pub struct UserDataError(String);

#[derive(Serialize)]
struct CloudConfig<'a> {
    groups: Vec<&'a str>,
    users: Vec<User<'a>>,
    mounts: Vec<[String; 6]>,
    runcmd: Vec<Vec<String>>,
}

#[derive(Serialize)]
struct User<'a> {
    name: &'a str,
    shell: &'a str,
    groups: Vec<&'a str>,
    sudo: Vec<&'a str>,
    ssh_authorized_keys: Vec<&'a str>,
}

/// Renders the user-data for a server that mounts `volume_id`.
///
/// Surrounding whitespace is trimmed from `public_key`.
///
/// # Errors
///
/// Returns [`UserDataError`] when serialisation fails.
pub fn render(public_key: &str, volume_id: ResourceId) -> Result<String, UserDataError> {
    let home = format!("/home/{SSH_USERNAME}");
    let owner = format!("{SSH_USERNAME}:{SSH_USERNAME}");
    let document = CloudConfig {
        groups: vec![DOCKER_GROUP],
        users: vec![User {
            name: SSH_USERNAME,
            shell: "/bin/bash",
            groups: vec![DOCKER_GROUP],
            sudo: vec!["ALL=(ALL) NOPASSWD:ALL"],
            ssh_authorized_keys: vec![public_key.trim()],
        }],
        mounts: vec![[
            volume_device_path(volume_id),
            home.clone(),
            String::from("ext4"),
            String::from("discard,nofail,defaults"),
            String::from("0"),
            String::from("0"),
        ]],
        runcmd: vec![
            command(&["chown", owner.as_str(), home.as_str()]),
            command(&["sh", "-c", INSTALL_DOCKER]),
            command(&["systemctl", "enable", "--now", "docker"]),
        ],
    };

    let body =
        serde_yaml_ng::to_string(&document).map_err(|err| UserDataError(err.to_string()))?;
    Ok(format!("{HEADER}{body}"))
}

fn command(argv: &[&str]) -> Vec<String> {
    argv.iter().map(|arg| (*arg).to_owned()).collect()
}

/// Device path under which Hetzner exposes an attached volume.
#[must_use]
pub fn volume_device_path(volume_id: ResourceId) -> String {
    format!("/dev/disk/by-id/scsi-0HC_Volume_{volume_id}")
}
