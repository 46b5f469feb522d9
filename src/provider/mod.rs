//! Abstract capability set of the cloud provider.
//!
//! The lifecycle orchestrator only talks to the provider through
//! [`CloudApi`], so it can run against the Hetzner HTTP client in production
//! and against an in-memory double in tests.

use std::future::Future;
use std::pin::Pin;

mod error;
mod types;

pub use error::ProviderError;
pub(crate) use types::chain_actions;
pub use types::{
    Action, ActionError, ActionStatus, Architecture, CreateServerRequest, CreateSshKeyRequest,
    CreateVolumeRequest, Image, Ipv4, Labels, Location, PublicNet, ResourceId, Server,
    ServerCreated, ServerStatus, ServerType, SshKey, Volume, VolumeCreated,
};

/// Future returned by provider operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + Send + 'a>>;

/// Provider operations needed to run a workspace lifecycle.
///
/// Lookups return `Ok(None)` when nothing matches. Mutating calls that the
/// provider completes asynchronously hand back the [`Action`] to poll.
pub trait CloudApi {
    /// Looks up a location by its exact name.
    fn location_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<Location>>;

    /// Looks up a server type by its exact name.
    fn server_type_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<ServerType>>;

    /// Looks up an image by name for a specific architecture.
    fn image_by_name_and_architecture<'a>(
        &'a self,
        name: &'a str,
        architecture: Architecture,
    ) -> ApiFuture<'a, Option<Image>>;

    /// Looks up a registered key by its fingerprint.
    fn ssh_key_by_fingerprint<'a>(&'a self, fingerprint: &'a str)
    -> ApiFuture<'a, Option<SshKey>>;

    /// Lists keys matching a label selector such as `key=value`.
    fn ssh_keys_by_label<'a>(&'a self, selector: &'a str) -> ApiFuture<'a, Vec<SshKey>>;

    /// Registers a public key.
    fn create_ssh_key<'a>(&'a self, request: &'a CreateSshKeyRequest) -> ApiFuture<'a, SshKey>;

    /// Deletes a registered key.
    fn delete_ssh_key(&self, id: ResourceId) -> ApiFuture<'_, ()>;

    /// Lists volumes whose name matches exactly.
    fn volumes_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Vec<Volume>>;

    /// Creates a volume.
    fn create_volume<'a>(&'a self, request: &'a CreateVolumeRequest)
    -> ApiFuture<'a, VolumeCreated>;

    /// Detaches a volume from whichever server holds it.
    fn detach_volume(&self, id: ResourceId) -> ApiFuture<'_, Action>;

    /// Deletes a detached volume.
    fn delete_volume(&self, id: ResourceId) -> ApiFuture<'_, ()>;

    /// Lists at most `limit` servers without filtering.
    fn list_servers(&self, limit: u32) -> ApiFuture<'_, Vec<Server>>;

    /// Lists servers whose name matches exactly.
    fn servers_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Vec<Server>>;

    /// Creates a server.
    fn create_server<'a>(&'a self, request: &'a CreateServerRequest)
    -> ApiFuture<'a, ServerCreated>;

    /// Deletes a server, returning the action tracking the deletion.
    fn delete_server(&self, id: ResourceId) -> ApiFuture<'_, Option<Action>>;

    /// Fetches the current state of an action.
    fn action_by_id(&self, id: ResourceId) -> ApiFuture<'_, Action>;
}
