//! BDD step definitions for the workspace lifecycle.

use devpod_provider_hetzner::cloud_init::volume_device_path;
use devpod_provider_hetzner::provider::ServerStatus;
use devpod_provider_hetzner::test_support::{ApiCall, ScriptedProbe};
use devpod_provider_hetzner::{MachineKeys, ProvisionError};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::Runtime;

use super::test_helpers::{LifecycleContext, LifecycleOutcome};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("failed to start runtime: {0}")]
    Runtime(String),
    #[error(transparent)]
    Provision(#[from] ProvisionError),
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn runtime() -> Result<Runtime, StepError> {
    Runtime::new().map_err(|err| StepError::Runtime(err.to_string()))
}

#[given("an empty Hetzner project")]
fn empty_project(lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context
}

#[given("the workspace volume already exists")]
fn volume_exists(lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context
        .cloud
        .insert_volume(lifecycle_context.workspace.as_str(), 30, None);
    lifecycle_context
}

#[given("a running workspace")]
fn running_workspace(lifecycle_context: LifecycleContext) -> LifecycleContext {
    let name = lifecycle_context.workspace.as_str();
    let cloud = &lifecycle_context.cloud;
    cloud.insert_ssh_key(
        "devpod-abc123-1a2b3c4d",
        "d4:dd:bf:79",
        lifecycle_context.workspace.key_labels(),
    );
    let server = cloud.insert_server(name, ServerStatus::Running);
    cloud.insert_volume(name, 30, Some(server.id));
    lifecycle_context
}

#[given("cloud-init never finishes")]
fn cloud_init_never_finishes(mut lifecycle_context: LifecycleContext) -> LifecycleContext {
    lifecycle_context.probe = ScriptedProbe::never_ready();
    lifecycle_context
}

#[when("I create the workspace")]
fn create_workspace(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let keys = MachineKeys::load(&lifecycle_context.machine_folder)
        .map_err(|err| StepError::Assertion(format!("machine keys: {err}")))?;
    let lifecycle = lifecycle_context.lifecycle();
    let workspace = &lifecycle_context.workspace;
    let options = &lifecycle_context.options;

    let result = runtime()?.block_on(async {
        let plan = lifecycle
            .build_server_request(workspace, options, &keys)
            .await?;
        lifecycle.create(plan, options.disk_size_gb).await.map(drop)
    });

    lifecycle_context.outcome = Some(LifecycleOutcome::from(result));
    Ok(lifecycle_context)
}

#[when("I stop the workspace")]
fn stop_workspace(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let lifecycle = lifecycle_context.lifecycle();
    let result = runtime()?.block_on(lifecycle.stop(&lifecycle_context.workspace));
    lifecycle_context.outcome = Some(LifecycleOutcome::from(result));
    Ok(lifecycle_context)
}

#[when("I delete the workspace")]
fn delete_workspace(mut lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let lifecycle = lifecycle_context.lifecycle();
    let result = runtime()?.block_on(lifecycle.delete(&lifecycle_context.workspace));
    lifecycle_context.outcome = Some(LifecycleOutcome::from(result));
    Ok(lifecycle_context)
}

#[then("the lifecycle result is successful")]
fn lifecycle_success(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match &lifecycle_context.outcome {
        Some(LifecycleOutcome::Success) => Ok(()),
        Some(LifecycleOutcome::Failure(message)) => Err(StepError::Assertion(format!(
            "expected success, got failure: {message}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("the lifecycle error mentions \"{snippet}\"")]
fn lifecycle_error_mentions(
    lifecycle_context: &LifecycleContext,
    snippet: String,
) -> Result<(), StepError> {
    let Some(LifecycleOutcome::Failure(message)) = &lifecycle_context.outcome else {
        return Err(StepError::Assertion(String::from(
            "expected failure outcome",
        )));
    };
    if message.contains(&snippet) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected error to mention `{snippet}`, got: {message}"
        )))
    }
}

#[then("the workspace status is \"{expected}\"")]
fn workspace_status(lifecycle_context: &LifecycleContext, expected: String) -> Result<(), StepError> {
    let lifecycle = lifecycle_context.lifecycle();
    let status = runtime()?.block_on(lifecycle.status(&lifecycle_context.workspace))?;
    if status.as_str() == expected {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected status {expected}, got {status}"
        )))
    }
}

#[then("the server user data mounts the workspace volume")]
fn user_data_mounts_volume(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let volume = lifecycle_context
        .cloud
        .volumes()
        .into_iter()
        .next()
        .ok_or_else(|| StepError::Assertion(String::from("missing workspace volume")))?;
    let user_data = lifecycle_context
        .cloud
        .calls()
        .into_iter()
        .find_map(|call| match call {
            ApiCall::CreateServer(request) => request.user_data,
            _ => None,
        })
        .ok_or_else(|| StepError::Assertion(String::from("server created without user data")))?;

    let device = volume_device_path(volume.id);
    if user_data.contains(&device) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected user data to mount {device}"
        )))
    }
}

#[then("exactly {count} workspace volume exists")]
fn volume_count(lifecycle_context: &LifecycleContext, count: usize) -> Result<(), StepError> {
    let volumes = lifecycle_context.cloud.volumes();
    if volumes.len() == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} volumes, found {}",
            volumes.len()
        )))
    }
}

#[then("no workspace keys remain")]
fn no_keys_remain(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let keys = lifecycle_context.cloud.ssh_keys();
    if keys.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("{} keys remain", keys.len())))
    }
}

#[then("no provider calls were made")]
fn no_provider_calls(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let calls = lifecycle_context.cloud.calls();
    if calls.is_empty() {
        Ok(())
    } else {
        Err(StepError::Assertion(format!("unexpected calls: {calls:?}")))
    }
}

fn recorded(lifecycle_context: &LifecycleContext, wanted: fn(&ApiCall) -> bool) -> usize {
    lifecycle_context
        .cloud
        .calls()
        .iter()
        .filter(|call| wanted(call))
        .count()
}

#[then("the provider recorded {count} key upload")]
fn key_uploads(lifecycle_context: &LifecycleContext, count: usize) -> Result<(), StepError> {
    let uploads = recorded(lifecycle_context, |call| {
        matches!(call, ApiCall::CreateSshKey { .. })
    });
    if uploads == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} key uploads, found {uploads}"
        )))
    }
}

#[then("the provider recorded {count} volume creation")]
fn volume_creations(lifecycle_context: &LifecycleContext, count: usize) -> Result<(), StepError> {
    let creations = recorded(lifecycle_context, |call| {
        matches!(call, ApiCall::CreateVolume { .. })
    });
    if creations == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} volume creations, found {creations}"
        )))
    }
}

#[then("the last server request carries the workspace volume and the uploaded key")]
fn server_request_reuses_resources(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let cloud = &lifecycle_context.cloud;
    let key_ids: Vec<_> = cloud.ssh_keys().iter().map(|key| key.id).collect();
    let volume_ids: Vec<_> = cloud.volumes().iter().map(|volume| volume.id).collect();
    let request = cloud
        .calls()
        .into_iter()
        .rev()
        .find_map(|call| match call {
            ApiCall::CreateServer(request) => Some(request),
            _ => None,
        })
        .ok_or_else(|| StepError::Assertion(String::from("no server was requested")))?;

    if key_ids.len() != 1 || request.ssh_keys != key_ids {
        return Err(StepError::Assertion(format!(
            "expected server keys {key_ids:?}, got {:?}",
            request.ssh_keys
        )));
    }
    if volume_ids.len() != 1 || request.volumes != volume_ids {
        return Err(StepError::Assertion(format!(
            "expected server volumes {volume_ids:?}, got {:?}",
            request.volumes
        )));
    }
    Ok(())
}
