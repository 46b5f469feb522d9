//! Shared fixtures for lifecycle BDD scenarios.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use camino::Utf8PathBuf;
use devpod_provider_hetzner::keys::{PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
use devpod_provider_hetzner::test_support::{FakeCloud, ScriptedProbe, TEST_PUBLIC_KEY};
use devpod_provider_hetzner::{Lifecycle, ProviderOptions, WorkspaceName};
use rstest::fixture;
use tempfile::TempDir;
use thiserror::Error;

const POLL_INTERVAL: Duration = Duration::from_millis(1);
const ACTION_TIMEOUT: Duration = Duration::from_millis(500);
const PROVISION_ATTEMPTS: u32 = 3;

/// Result of the last lifecycle step, kept as data so steps can inspect it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum LifecycleOutcome {
    Success,
    Failure(String),
}

impl<E: std::fmt::Display> From<Result<(), E>> for LifecycleOutcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}

#[derive(Clone, Debug)]
pub struct LifecycleContext {
    pub cloud: FakeCloud,
    pub probe: ScriptedProbe,
    pub workspace: WorkspaceName,
    pub options: ProviderOptions,
    pub machine_folder: Utf8PathBuf,
    pub outcome: Option<LifecycleOutcome>,
    _tmp: Arc<TempDir>,
}

impl LifecycleContext {
    pub fn lifecycle(&self) -> Lifecycle<FakeCloud, ScriptedProbe> {
        Lifecycle::new(self.cloud.clone(), self.probe.clone())
            .with_poll_interval(POLL_INTERVAL)
            .with_action_timeout(ACTION_TIMEOUT)
            .with_server_create_timeout(ACTION_TIMEOUT)
            .with_provision_attempts(PROVISION_ATTEMPTS)
    }
}

#[derive(Debug, Error)]
pub enum LifecycleTestError {
    #[error("invalid lifecycle fixture: {0}")]
    Fixture(String),
}

pub type LifecycleContextResult = Result<LifecycleContext, LifecycleTestError>;

#[fixture]
pub fn lifecycle_context_result() -> LifecycleContextResult {
    build_lifecycle_context()
}

#[fixture]
pub fn lifecycle_context(lifecycle_context_result: LifecycleContextResult) -> LifecycleContext {
    lifecycle_context_result
        .unwrap_or_else(|err| panic!("lifecycle context fixture should initialise: {err}"))
}

fn build_lifecycle_context() -> LifecycleContextResult {
    let tmp = tempfile::tempdir()
        .map_err(|err| LifecycleTestError::Fixture(format!("tempdir: {err}")))?;
    let machine_folder = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
        .map_err(|path| LifecycleTestError::Fixture(format!("non UTF-8 path {path:?}")))?;
    fs::write(machine_folder.join(PUBLIC_KEY_FILE), TEST_PUBLIC_KEY)
        .map_err(|err| LifecycleTestError::Fixture(format!("public key: {err}")))?;
    fs::write(machine_folder.join(PRIVATE_KEY_FILE), "private")
        .map_err(|err| LifecycleTestError::Fixture(format!("private key: {err}")))?;

    Ok(LifecycleContext {
        cloud: FakeCloud::with_catalog(),
        probe: ScriptedProbe::ready(),
        workspace: WorkspaceName::from_machine_id("abc123"),
        options: ProviderOptions {
            token: String::from("token"),
            token_from_deprecated_key: false,
            region: String::from("nbg1"),
            disk_image: String::from("docker-ce"),
            disk_size_gb: 30,
            machine_type: String::from("cx32"),
        },
        machine_folder,
        outcome: None,
        _tmp: Arc::new(tmp),
    })
}
