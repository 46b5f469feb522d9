//! Unit tests for the lifecycle orchestrator, run against [`FakeCloud`].

use std::fs;
use std::time::Duration;

use camino::Utf8PathBuf;
use rstest::fixture;
use tempfile::TempDir;

use super::Lifecycle;
use crate::keys::{MachineKeys, PRIVATE_KEY_FILE, PUBLIC_KEY_FILE};
use crate::options::ProviderOptions;
use crate::test_support::{FakeCloud, ScriptedProbe, TEST_PUBLIC_KEY};
use crate::workspace::WorkspaceName;

mod status;

const TEST_TIMEOUT: Duration = Duration::from_millis(200);
const TEST_ATTEMPTS: u32 = 5;

type TestLifecycle = Lifecycle<FakeCloud, ScriptedProbe>;

fn lifecycle(cloud: &FakeCloud, probe: &ScriptedProbe) -> TestLifecycle {
    Lifecycle::new(cloud.clone(), probe.clone())
        .with_poll_interval(Duration::from_millis(1))
        .with_action_timeout(TEST_TIMEOUT)
        .with_server_create_timeout(TEST_TIMEOUT)
        .with_provision_attempts(TEST_ATTEMPTS)
}

#[fixture]
fn workspace() -> WorkspaceName {
    WorkspaceName::from_machine_id("abc123")
}

#[fixture]
fn options() -> ProviderOptions {
    ProviderOptions {
        token: String::from("token"),
        token_from_deprecated_key: false,
        region: String::from("nbg1"),
        disk_image: String::from("docker-ce"),
        disk_size_gb: 30,
        machine_type: String::from("cx32"),
    }
}

/// Machine folder holding a valid key pair; keep the `TempDir` alive.
struct MachineFolder {
    _dir: TempDir,
    keys: MachineKeys,
}

#[fixture]
fn machine() -> MachineFolder {
    let dir = tempfile::tempdir().expect("tempdir");
    let folder = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8 tempdir");
    fs::write(folder.join(PUBLIC_KEY_FILE), TEST_PUBLIC_KEY).expect("write public key");
    fs::write(folder.join(PRIVATE_KEY_FILE), "private").expect("write private key");
    let keys = MachineKeys::load(&folder).expect("keys should load");
    MachineFolder { _dir: dir, keys }
}
