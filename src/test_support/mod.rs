//! Test doubles shared across unit and integration tests.
//!
//! [`FakeCloud`] stands in for the provider API, [`ScriptedProbe`] for the
//! SSH readiness check and [`ScriptedRunner`] for spawned processes.

mod cloud;
mod probe;
mod runner;

pub use cloud::{ActionBehaviour, ApiCall, FAKE_SERVER_IP, FakeCloud};
pub use probe::ScriptedProbe;
pub use runner::{CommandInvocation, ScriptedRunner};

/// Authorized-keys line with a known fingerprint, for tests that upload keys.
pub const TEST_PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3NzaC1lZDI1NTE5AAAAIMYMPf45N2zLPaI4SOxE4QJH/f4jhaLt7bSk75RVoIOA vscode@8422b61228f0\n";

/// Fingerprint of [`TEST_PUBLIC_KEY`].
pub const TEST_PUBLIC_KEY_FINGERPRINT: &str = "d4:dd:bf:79:27:15:d2:36:d1:13:60:79:6a:86:d8:7a";
