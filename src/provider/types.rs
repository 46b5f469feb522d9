//! Resource models exchanged with the cloud provider.
//!
//! The shapes follow the Hetzner Cloud API payloads closely so the HTTP client
//! can deserialise responses straight into them, while the lifecycle code and
//! the in-memory test double only ever see these types.

use std::collections::BTreeMap;
use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Provider-assigned numeric identifier.
pub type ResourceId = i64;

/// Resource labels. Ordered so serialised requests are deterministic.
pub type Labels = BTreeMap<String, String>;

/// Prefix of server type names that run on the ARM architecture.
const ARM_SERVER_TYPE_PREFIX: &str = "cax";

/// CPU architecture of a server type or image.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    /// Intel/AMD 64-bit.
    X86,
    /// ARM64 (Ampere).
    Arm,
}

impl Architecture {
    /// Infers the architecture from a server type name; `cax*` types are ARM.
    #[must_use]
    pub fn for_server_type(server_type: &str) -> Self {
        if server_type.starts_with(ARM_SERVER_TYPE_PREFIX) {
            Self::Arm
        } else {
            Self::X86
        }
    }

    /// Returns the API spelling of the architecture.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Arm => "arm",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Datacenter location such as `nbg1`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Location {
    /// Location identifier.
    pub id: ResourceId,
    /// Location name.
    pub name: String,
}

/// Machine size such as `cx32`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ServerType {
    /// Server type identifier.
    pub id: ResourceId,
    /// Server type name.
    pub name: String,
    /// Architecture the type runs on.
    pub architecture: Architecture,
}

/// Boot image.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Image {
    /// Image identifier.
    pub id: ResourceId,
    /// Image name; snapshots and backups have none.
    pub name: Option<String>,
    /// Architecture the image was built for.
    pub architecture: Architecture,
}

/// Public key registered with the provider.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SshKey {
    /// Key identifier.
    pub id: ResourceId,
    /// Key name.
    pub name: String,
    /// Legacy MD5 fingerprint.
    pub fingerprint: String,
    /// Public key in authorized-keys format.
    pub public_key: String,
    /// Labels attached to the key.
    #[serde(default)]
    pub labels: Labels,
}

/// Persistent block volume.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Volume {
    /// Volume identifier.
    pub id: ResourceId,
    /// Volume name.
    pub name: String,
    /// Size in GiB.
    pub size: u32,
    /// Server the volume is attached to, if any.
    pub server: Option<ResourceId>,
    /// Location the volume lives in.
    pub location: Location,
    /// Labels attached to the volume.
    #[serde(default)]
    pub labels: Labels,
}

/// Power state reported for a server.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    /// Booted and running.
    Running,
    /// Being created.
    Initializing,
    /// Powering on.
    Starting,
    /// Powering off.
    Stopping,
    /// Powered off.
    Off,
    /// Being deleted.
    Deleting,
    /// Being migrated to another host.
    Migrating,
    /// Being rebuilt from an image.
    Rebuilding,
    /// Any state this crate does not know about.
    #[serde(other)]
    Unknown,
}

/// Public IPv4 assignment.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Ipv4 {
    /// Dotted-quad address.
    pub ip: String,
}

/// Public networking block of a server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicNet {
    /// Primary IPv4 address, absent for IPv6-only servers.
    pub ipv4: Option<Ipv4>,
}

/// Compute instance.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Server {
    /// Server identifier.
    pub id: ResourceId,
    /// Server name.
    pub name: String,
    /// Current power state.
    pub status: ServerStatus,
    /// Public networking.
    #[serde(default)]
    pub public_net: PublicNet,
    /// Labels attached to the server.
    #[serde(default)]
    pub labels: Labels,
}

impl Server {
    /// Parses the primary public IPv4 address, if one is assigned.
    #[must_use]
    pub fn public_ipv4(&self) -> Option<IpAddr> {
        self.public_net
            .ipv4
            .as_ref()
            .and_then(|ipv4| ipv4.ip.parse().ok())
    }
}

/// Progress state of an asynchronous action.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Still in progress.
    Running,
    /// Finished successfully.
    Success,
    /// Finished with an error.
    Error,
}

/// Error details attached to a failed action.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ActionError {
    /// Provider error code.
    pub code: String,
    /// Provider error message.
    pub message: String,
}

/// Handle for work the provider performs asynchronously.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Action {
    /// Action identifier.
    pub id: ResourceId,
    /// Command the action performs, for example `create_server`.
    pub command: String,
    /// Current progress state.
    pub status: ActionStatus,
    /// Error details when `status` is [`ActionStatus::Error`].
    pub error: Option<ActionError>,
}

/// Result of a volume creation call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct VolumeCreated {
    /// The new volume.
    pub volume: Volume,
    /// Action tracking the creation, if any.
    pub action: Option<Action>,
    /// Follow-on actions that must also complete.
    #[serde(default)]
    pub next_actions: Vec<Action>,
}

/// Result of a server creation call.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
pub struct ServerCreated {
    /// The new server.
    pub server: Server,
    /// Action tracking the creation, if any.
    pub action: Option<Action>,
    /// Follow-on actions that must also complete.
    #[serde(default)]
    pub next_actions: Vec<Action>,
}

/// Chains the primary action with its follow-on actions.
pub(crate) fn chain_actions<'a>(
    action: Option<&'a Action>,
    next_actions: &'a [Action],
) -> impl Iterator<Item = &'a Action> {
    action.into_iter().chain(next_actions)
}

/// Body of a server creation call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CreateServerRequest {
    /// Server name; also the workspace identity.
    pub name: String,
    /// Server type name.
    pub server_type: String,
    /// Image identifier.
    pub image: ResourceId,
    /// Location name.
    pub location: String,
    /// Keys injected for the root user.
    pub ssh_keys: Vec<ResourceId>,
    /// Volumes to attach at creation.
    pub volumes: Vec<ResourceId>,
    /// Whether the provider should mount attached volumes itself.
    pub automount: bool,
    /// Cloud-init user-data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_data: Option<String>,
    /// Labels attached to the server.
    pub labels: Labels,
}

/// Body of a volume creation call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CreateVolumeRequest {
    /// Volume name.
    pub name: String,
    /// Size in GiB.
    pub size: u32,
    /// Location name.
    pub location: String,
    /// Filesystem the provider formats the volume with.
    pub format: String,
    /// Whether the provider should mount the volume itself.
    pub automount: bool,
    /// Labels attached to the volume.
    pub labels: Labels,
}

/// Body of a key registration call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CreateSshKeyRequest {
    /// Key name.
    pub name: String,
    /// Public key in authorized-keys format.
    pub public_key: String,
    /// Labels attached to the key.
    pub labels: Labels,
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("cx32", Architecture::X86)]
    #[case("cpx41", Architecture::X86)]
    #[case("ccx13", Architecture::X86)]
    #[case("cax21", Architecture::Arm)]
    fn infers_architecture_from_server_type(#[case] name: &str, #[case] expected: Architecture) {
        assert_eq!(Architecture::for_server_type(name), expected);
    }

    #[test]
    fn unknown_server_status_is_tolerated() {
        let status: ServerStatus =
            serde_json::from_str("\"teleporting\"").expect("status should parse");
        assert_eq!(status, ServerStatus::Unknown);
    }

    #[test]
    fn server_without_ipv4_has_no_public_address() {
        let server = Server {
            id: 1,
            name: String::from("devpod-abc123"),
            status: ServerStatus::Running,
            public_net: PublicNet { ipv4: None },
            labels: Labels::new(),
        };
        assert!(server.public_ipv4().is_none());
    }

    #[test]
    fn create_server_request_omits_missing_user_data() {
        let request = CreateServerRequest {
            name: String::from("devpod-abc123"),
            server_type: String::from("cx32"),
            image: 42,
            location: String::from("nbg1"),
            ssh_keys: vec![7],
            volumes: vec![],
            automount: false,
            user_data: None,
            labels: Labels::from([(String::from("type"), String::from("devpod"))]),
        };
        let json = serde_json::to_string(&request).expect("serialise");
        assert!(!json.contains("user_data"));
        assert!(json.contains(r#""labels":{"type":"devpod"}"#));
    }
}
