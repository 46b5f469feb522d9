//! Core library for the Hetzner Cloud provider of DevPod.
//!
//! A workspace is one server plus one persistent volume, both named after
//! the DevPod machine id. The crate exposes the provider capability set, a
//! Hetzner implementation of it and the lifecycle orchestrator that creates,
//! stops, deletes and inspects workspaces (create → wait for cloud-init →
//! ready).

pub mod cloud_init;
pub mod fingerprint;
pub mod hetzner;
pub mod keys;
pub mod lifecycle;
pub mod logging;
pub mod options;
pub mod probe;
pub mod provider;
pub mod ssh;
pub mod test_support;
pub mod workspace;

pub use fingerprint::{FingerprintError, fingerprint};
pub use hetzner::HetznerApi;
pub use keys::{IdentityFile, KeyStoreError, MachineKeys};
pub use lifecycle::{
    DEFAULT_ACTION_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PROVISION_ATTEMPTS,
    DEFAULT_SERVER_CREATE_TIMEOUT, Lifecycle, ProvisionError, ServerPlan, WorkspaceStatus,
};
pub use options::{MachineOptions, OptionsError, ProviderOptions, RawOptions, WorkspaceOptions};
pub use probe::{BootStatus, ReadinessProbe, SshProbe};
pub use provider::{CloudApi, ProviderError};
pub use ssh::{
    CommandError, CommandOutput, CommandRunner, ProcessCommandRunner, SshClient, SshConfig,
    SshConfigLoadError, SshError, StreamingCommandRunner,
};
pub use workspace::WorkspaceName;
