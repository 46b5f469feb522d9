//! BDD scenarios for the workspace lifecycle.

use rstest_bdd_macros::scenario;

use super::test_helpers::{LifecycleContextResult, lifecycle_context_result};

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Create a workspace from scratch"
)]
fn scenario_create(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Re-creating a stopped workspace reuses its volume"
)]
fn scenario_recreate_reuses_volume(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Stop keeps the workspace volume"
)]
fn scenario_stop(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Delete removes every workspace resource"
)]
fn scenario_delete(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Deleting an absent workspace succeeds"
)]
fn scenario_delete_absent(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Provisioning gives up when cloud-init never finishes"
)]
fn scenario_provisioning_exhausted(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Creating again after a stop reuses the key and the volume"
)]
fn scenario_create_after_stop(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}

#[scenario(
    path = "tests/features/lifecycle.feature",
    name = "Creating a running workspace again is rejected by the provider"
)]
fn scenario_create_twice(lifecycle_context_result: LifecycleContextResult) {
    drop(lifecycle_context_result);
}
