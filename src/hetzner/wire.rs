//! Response envelopes used by the Hetzner Cloud API.

use serde::Deserialize;

use crate::provider::{Action, Image, Location, Server, ServerType, SshKey, Volume};

#[derive(Debug, Deserialize)]
pub(super) struct LocationList {
    pub(super) locations: Vec<Location>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServerTypeList {
    pub(super) server_types: Vec<ServerType>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ImageList {
    pub(super) images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SshKeyList {
    pub(super) ssh_keys: Vec<SshKey>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SshKeyEnvelope {
    pub(super) ssh_key: SshKey,
}

#[derive(Debug, Deserialize)]
pub(super) struct VolumeList {
    pub(super) volumes: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ServerList {
    pub(super) servers: Vec<Server>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ActionEnvelope {
    pub(super) action: Action,
}

#[derive(Debug, Deserialize)]
pub(super) struct OptionalActionEnvelope {
    #[serde(default)]
    pub(super) action: Option<Action>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub(super) error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorBody {
    pub(super) code: String,
    pub(super) message: String,
}
