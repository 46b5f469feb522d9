//! In-memory cloud provider double.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::fingerprint::fingerprint;
use crate::provider::{
    Action, ActionError, ActionStatus, ApiFuture, Architecture, CloudApi, CreateServerRequest,
    CreateSshKeyRequest, CreateVolumeRequest, Image, Ipv4, Labels, Location, ProviderError,
    PublicNet, ResourceId, Server, ServerCreated, ServerStatus, ServerType, SshKey, Volume,
    VolumeCreated,
};

/// Address assigned to servers created through the double.
pub const FAKE_SERVER_IP: &str = "203.0.113.10";

/// How an asynchronous action progresses when polled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ActionBehaviour {
    /// Reports `running` for `after_polls` polls, then `success`.
    Succeed {
        /// Polls answered with `running` before success.
        after_polls: u32,
    },
    /// Reports `error` on the first poll.
    Fail {
        /// Provider error code.
        code: String,
        /// Provider error message.
        message: String,
    },
    /// Reports `running` forever.
    Hang,
}

impl Default for ActionBehaviour {
    fn default() -> Self {
        Self::Succeed { after_polls: 0 }
    }
}

/// Mutating call recorded by [`FakeCloud`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiCall {
    /// A key was registered.
    CreateSshKey {
        /// Key name.
        name: String,
    },
    /// A key was deleted.
    DeleteSshKey(ResourceId),
    /// A volume was created.
    CreateVolume {
        /// Volume name.
        name: String,
        /// Size in GiB.
        size: u32,
    },
    /// A volume detach was requested.
    DetachVolume(ResourceId),
    /// A volume was deleted.
    DeleteVolume(ResourceId),
    /// A server was created.
    CreateServer(Box<CreateServerRequest>),
    /// A server was deleted.
    DeleteServer(ResourceId),
    /// An unfiltered server list was requested.
    ListServers {
        /// Requested page size.
        limit: u32,
    },
}

#[derive(Debug)]
struct TrackedAction {
    action: Action,
    behaviour: ActionBehaviour,
    polls: u32,
}

#[derive(Debug, Default)]
struct CloudState {
    next_id: ResourceId,
    locations: Vec<Location>,
    server_types: Vec<ServerType>,
    images: Vec<Image>,
    ssh_keys: Vec<SshKey>,
    volumes: Vec<Volume>,
    servers: Vec<Server>,
    actions: BTreeMap<ResourceId, TrackedAction>,
    behaviours: BTreeMap<String, ActionBehaviour>,
    failures: BTreeMap<&'static str, ProviderError>,
    detach_lag: u32,
    detaching: BTreeMap<ResourceId, u32>,
    calls: Vec<ApiCall>,
    polled: Vec<ResourceId>,
}

impl CloudState {
    fn allocate_id(&mut self) -> ResourceId {
        self.next_id += 1;
        self.next_id
    }

    fn start_action(&mut self, command: &str) -> Action {
        let id = self.allocate_id();
        let action = Action {
            id,
            command: command.to_owned(),
            status: ActionStatus::Running,
            error: None,
        };
        let behaviour = self.behaviours.get(command).cloned().unwrap_or_default();
        self.actions.insert(
            id,
            TrackedAction {
                action: action.clone(),
                behaviour,
                polls: 0,
            },
        );
        action
    }

    fn check(&mut self, operation: &'static str) -> Result<(), ProviderError> {
        self.failures.remove(operation).map_or(Ok(()), Err)
    }

    fn settle_detaches(&mut self) {
        let volumes = &mut self.volumes;
        self.detaching.retain(|volume_id, remaining| {
            if *remaining > 0 {
                *remaining -= 1;
                return true;
            }
            if let Some(volume) = volumes.iter_mut().find(|volume| volume.id == *volume_id) {
                volume.server = None;
            }
            false
        });
    }
}

/// In-memory implementation of [`CloudApi`].
///
/// Clones share state, so a test can hand one clone to the code under test and
/// inspect the other.
#[derive(Clone, Debug, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<CloudState>>,
}

impl FakeCloud {
    /// Creates an empty cloud with no catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cloud offering `nbg1`, `cx32` (x86), `cax21` (arm) and a
    /// `docker-ce` image for both architectures.
    #[must_use]
    pub fn with_catalog() -> Self {
        let cloud = Self::new();
        {
            let mut state = cloud.lock();
            let nbg1 = state.allocate_id();
            state.locations.push(Location {
                id: nbg1,
                name: String::from("nbg1"),
            });
            for (name, architecture) in [("cx32", Architecture::X86), ("cax21", Architecture::Arm)]
            {
                let id = state.allocate_id();
                state.server_types.push(ServerType {
                    id,
                    name: name.to_owned(),
                    architecture,
                });
            }
            for architecture in [Architecture::X86, Architecture::Arm] {
                let id = state.allocate_id();
                state.images.push(Image {
                    id,
                    name: Some(String::from("docker-ce")),
                    architecture,
                });
            }
        }
        cloud
    }

    /// Sets how actions with the given command progress.
    pub fn set_action_behaviour(&self, command: &str, behaviour: ActionBehaviour) {
        self.lock().behaviours.insert(command.to_owned(), behaviour);
    }

    /// Makes the next call to `operation` fail with `error`.
    ///
    /// Operation names match the [`CloudApi`] method names.
    pub fn fail_next(&self, operation: &'static str, error: ProviderError) {
        self.lock().failures.insert(operation, error);
    }

    /// Number of volume lookups that still report a detached volume as
    /// attached.
    pub fn set_detach_lag(&self, lookups: u32) {
        self.lock().detach_lag = lookups;
    }

    /// Adds a server.
    pub fn insert_server(&self, name: &str, status: ServerStatus) -> Server {
        let mut state = self.lock();
        let id = state.allocate_id();
        let server = Server {
            id,
            name: name.to_owned(),
            status,
            public_net: PublicNet {
                ipv4: Some(Ipv4 {
                    ip: FAKE_SERVER_IP.to_owned(),
                }),
            },
            labels: Labels::new(),
        };
        state.servers.push(server.clone());
        server
    }

    /// Adds a volume, optionally attached to a server.
    pub fn insert_volume(&self, name: &str, size: u32, server: Option<ResourceId>) -> Volume {
        let mut state = self.lock();
        let id = state.allocate_id();
        let volume = Volume {
            id,
            name: name.to_owned(),
            size,
            server,
            location: Location {
                id: 0,
                name: String::from("nbg1"),
            },
            labels: Labels::new(),
        };
        state.volumes.push(volume.clone());
        volume
    }

    /// Registers a key with an explicit fingerprint.
    pub fn insert_ssh_key(&self, name: &str, key_fingerprint: &str, labels: Labels) -> SshKey {
        let mut state = self.lock();
        let id = state.allocate_id();
        let key = SshKey {
            id,
            name: name.to_owned(),
            fingerprint: key_fingerprint.to_owned(),
            public_key: String::new(),
            labels,
        };
        state.ssh_keys.push(key.clone());
        key
    }

    /// Current servers.
    #[must_use]
    pub fn servers(&self) -> Vec<Server> {
        self.lock().servers.clone()
    }

    /// Current volumes.
    #[must_use]
    pub fn volumes(&self) -> Vec<Volume> {
        self.lock().volumes.clone()
    }

    /// Current keys.
    #[must_use]
    pub fn ssh_keys(&self) -> Vec<SshKey> {
        self.lock().ssh_keys.clone()
    }

    /// Mutating calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ApiCall> {
        self.lock().calls.clone()
    }

    /// Action ids polled so far, one entry per poll.
    #[must_use]
    pub fn polled_actions(&self) -> Vec<ResourceId> {
        self.lock().polled.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CloudState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_state<T, F>(&self, operation: &'static str, body: F) -> ApiFuture<'_, T>
    where
        T: Send + 'static,
        F: FnOnce(&mut CloudState) -> Result<T, ProviderError>,
    {
        let result = {
            let mut state = self.lock();
            state.check(operation).and_then(|()| body(&mut *state))
        };
        Box::pin(async move { result })
    }
}

fn not_found(endpoint: String) -> ProviderError {
    ProviderError::Api {
        endpoint,
        status: 404,
        code: String::from("not_found"),
        message: String::from("resource not found"),
    }
}

fn matches_selector(labels: &Labels, selector: &str) -> bool {
    selector.split_once('=').is_some_and(|(key, value)| {
        labels
            .get(key)
            .is_some_and(|candidate| candidate.as_str() == value)
    })
}

impl CloudApi for FakeCloud {
    fn location_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<Location>> {
        self.with_state("location_by_name", |state| {
            Ok(state
                .locations
                .iter()
                .find(|location| location.name == name)
                .cloned())
        })
    }

    fn server_type_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Option<ServerType>> {
        self.with_state("server_type_by_name", |state| {
            Ok(state
                .server_types
                .iter()
                .find(|server_type| server_type.name == name)
                .cloned())
        })
    }

    fn image_by_name_and_architecture<'a>(
        &'a self,
        name: &'a str,
        architecture: Architecture,
    ) -> ApiFuture<'a, Option<Image>> {
        self.with_state("image_by_name_and_architecture", |state| {
            Ok(state
                .images
                .iter()
                .find(|image| {
                    image.name.as_deref() == Some(name) && image.architecture == architecture
                })
                .cloned())
        })
    }

    fn ssh_key_by_fingerprint<'a>(
        &'a self,
        key_fingerprint: &'a str,
    ) -> ApiFuture<'a, Option<SshKey>> {
        self.with_state("ssh_key_by_fingerprint", |state| {
            Ok(state
                .ssh_keys
                .iter()
                .find(|key| key.fingerprint == key_fingerprint)
                .cloned())
        })
    }

    fn ssh_keys_by_label<'a>(&'a self, selector: &'a str) -> ApiFuture<'a, Vec<SshKey>> {
        self.with_state("ssh_keys_by_label", |state| {
            Ok(state
                .ssh_keys
                .iter()
                .filter(|key| matches_selector(&key.labels, selector))
                .cloned()
                .collect())
        })
    }

    fn create_ssh_key<'a>(&'a self, request: &'a CreateSshKeyRequest) -> ApiFuture<'a, SshKey> {
        self.with_state("create_ssh_key", |state| {
            let key_fingerprint =
                fingerprint(&request.public_key).map_err(|err| ProviderError::Api {
                    endpoint: String::from("/ssh_keys"),
                    status: 422,
                    code: String::from("invalid_input"),
                    message: err.to_string(),
                })?;
            let id = state.allocate_id();
            let key = SshKey {
                id,
                name: request.name.clone(),
                fingerprint: key_fingerprint,
                public_key: request.public_key.clone(),
                labels: request.labels.clone(),
            };
            state.ssh_keys.push(key.clone());
            state.calls.push(ApiCall::CreateSshKey {
                name: request.name.clone(),
            });
            Ok(key)
        })
    }

    fn delete_ssh_key(&self, id: ResourceId) -> ApiFuture<'_, ()> {
        self.with_state("delete_ssh_key", move |state| {
            let before = state.ssh_keys.len();
            state.ssh_keys.retain(|key| key.id != id);
            if state.ssh_keys.len() == before {
                return Err(not_found(format!("/ssh_keys/{id}")));
            }
            state.calls.push(ApiCall::DeleteSshKey(id));
            Ok(())
        })
    }

    fn volumes_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Vec<Volume>> {
        self.with_state("volumes_by_name", |state| {
            state.settle_detaches();
            Ok(state
                .volumes
                .iter()
                .filter(|volume| volume.name == name)
                .cloned()
                .collect())
        })
    }

    fn create_volume<'a>(
        &'a self,
        request: &'a CreateVolumeRequest,
    ) -> ApiFuture<'a, VolumeCreated> {
        self.with_state("create_volume", |state| {
            let id = state.allocate_id();
            let volume = Volume {
                id,
                name: request.name.clone(),
                size: request.size,
                server: None,
                location: Location {
                    id: 0,
                    name: request.location.clone(),
                },
                labels: request.labels.clone(),
            };
            state.volumes.push(volume.clone());
            state.calls.push(ApiCall::CreateVolume {
                name: request.name.clone(),
                size: request.size,
            });
            let action = state.start_action("create_volume");
            Ok(VolumeCreated {
                volume,
                action: Some(action),
                next_actions: Vec::new(),
            })
        })
    }

    fn detach_volume(&self, id: ResourceId) -> ApiFuture<'_, Action> {
        self.with_state("detach_volume", move |state| {
            if !state.volumes.iter().any(|volume| volume.id == id) {
                return Err(not_found(format!("/volumes/{id}/actions/detach")));
            }
            let lag = state.detach_lag;
            state.detaching.insert(id, lag);
            if lag == 0 {
                state.settle_detaches();
            }
            state.calls.push(ApiCall::DetachVolume(id));
            Ok(state.start_action("detach_volume"))
        })
    }

    fn delete_volume(&self, id: ResourceId) -> ApiFuture<'_, ()> {
        self.with_state("delete_volume", move |state| {
            let attached = state
                .volumes
                .iter()
                .find(|volume| volume.id == id)
                .ok_or_else(|| not_found(format!("/volumes/{id}")))?
                .server
                .is_some();
            if attached {
                return Err(ProviderError::Api {
                    endpoint: format!("/volumes/{id}"),
                    status: 423,
                    code: String::from("locked"),
                    message: String::from("volume is attached"),
                });
            }
            state.volumes.retain(|volume| volume.id != id);
            state.calls.push(ApiCall::DeleteVolume(id));
            Ok(())
        })
    }

    fn list_servers(&self, limit: u32) -> ApiFuture<'_, Vec<Server>> {
        self.with_state("list_servers", move |state| {
            state.calls.push(ApiCall::ListServers { limit });
            let take = usize::try_from(limit).unwrap_or(usize::MAX);
            Ok(state.servers.iter().take(take).cloned().collect())
        })
    }

    fn servers_by_name<'a>(&'a self, name: &'a str) -> ApiFuture<'a, Vec<Server>> {
        self.with_state("servers_by_name", |state| {
            Ok(state
                .servers
                .iter()
                .filter(|server| server.name == name)
                .cloned()
                .collect())
        })
    }

    fn create_server<'a>(
        &'a self,
        request: &'a CreateServerRequest,
    ) -> ApiFuture<'a, ServerCreated> {
        self.with_state("create_server", |state| {
            if state.servers.iter().any(|server| server.name == request.name) {
                return Err(ProviderError::Api {
                    endpoint: String::from("/servers"),
                    status: 409,
                    code: String::from("uniqueness_error"),
                    message: String::from("server name is already used"),
                });
            }
            let id = state.allocate_id();
            let server = Server {
                id,
                name: request.name.clone(),
                status: ServerStatus::Running,
                public_net: PublicNet {
                    ipv4: Some(Ipv4 {
                        ip: FAKE_SERVER_IP.to_owned(),
                    }),
                },
                labels: request.labels.clone(),
            };
            for volume in &mut state.volumes {
                if request.volumes.contains(&volume.id) {
                    volume.server = Some(id);
                }
            }
            state.servers.push(server.clone());
            state
                .calls
                .push(ApiCall::CreateServer(Box::new(request.clone())));
            let action = state.start_action("create_server");
            let start = state.start_action("start_server");
            Ok(ServerCreated {
                server,
                action: Some(action),
                next_actions: vec![start],
            })
        })
    }

    fn delete_server(&self, id: ResourceId) -> ApiFuture<'_, Option<Action>> {
        self.with_state("delete_server", move |state| {
            let before = state.servers.len();
            state.servers.retain(|server| server.id != id);
            if state.servers.len() == before {
                return Err(not_found(format!("/servers/{id}")));
            }
            for volume in &mut state.volumes {
                if volume.server == Some(id) {
                    volume.server = None;
                }
            }
            state.calls.push(ApiCall::DeleteServer(id));
            Ok(Some(state.start_action("delete_server")))
        })
    }

    fn action_by_id(&self, id: ResourceId) -> ApiFuture<'_, Action> {
        self.with_state("action_by_id", move |state| {
            state.polled.push(id);
            let tracked = state
                .actions
                .get_mut(&id)
                .ok_or_else(|| not_found(format!("/actions/{id}")))?;
            tracked.polls += 1;
            let mut action = tracked.action.clone();
            match &tracked.behaviour {
                ActionBehaviour::Succeed { after_polls } if tracked.polls > *after_polls => {
                    action.status = ActionStatus::Success;
                }
                ActionBehaviour::Fail { code, message } => {
                    action.status = ActionStatus::Error;
                    action.error = Some(ActionError {
                        code: code.clone(),
                        message: message.clone(),
                    });
                }
                ActionBehaviour::Succeed { .. } | ActionBehaviour::Hang => {}
            }
            Ok(action)
        })
    }
}
