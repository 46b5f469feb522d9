//! Tests for the status projection and token check.

use rstest::rstest;

use super::{lifecycle, workspace};
use crate::lifecycle::{ProvisionError, WorkspaceStatus};
use crate::provider::{ProviderError, ServerStatus};
use crate::test_support::{ApiCall, FakeCloud, ScriptedProbe};
use crate::workspace::WorkspaceName;

#[rstest]
#[case::running(Some(ServerStatus::Running), true, WorkspaceStatus::Running)]
#[case::initializing(Some(ServerStatus::Initializing), true, WorkspaceStatus::Busy)]
#[case::off(Some(ServerStatus::Off), false, WorkspaceStatus::Busy)]
#[case::stopped(None, true, WorkspaceStatus::Stopped)]
#[case::absent(None, false, WorkspaceStatus::NotFound)]
#[tokio::test]
async fn projects_server_and_volume_state(
    workspace: WorkspaceName,
    #[case] server: Option<ServerStatus>,
    #[case] volume: bool,
    #[case] expected: WorkspaceStatus,
) {
    let cloud = FakeCloud::new();
    if let Some(status) = server {
        cloud.insert_server("devpod-abc123", status);
    }
    if volume {
        cloud.insert_volume("devpod-abc123", 30, None);
    }

    let status = lifecycle(&cloud, &ScriptedProbe::ready())
        .status(&workspace)
        .await
        .expect("status should resolve");

    assert_eq!(status, expected);
}

#[rstest]
#[case(WorkspaceStatus::Running, "Running")]
#[case(WorkspaceStatus::Busy, "Busy")]
#[case(WorkspaceStatus::Stopped, "Stopped")]
#[case(WorkspaceStatus::NotFound, "NotFound")]
fn prints_devpod_status_names(#[case] status: WorkspaceStatus, #[case] text: &str) {
    assert_eq!(status.to_string(), text);
}

#[rstest]
#[tokio::test]
async fn status_rejects_duplicate_servers(workspace: WorkspaceName) {
    let cloud = FakeCloud::new();
    cloud.insert_server("devpod-abc123", ServerStatus::Running);
    cloud.insert_server("devpod-abc123", ServerStatus::Running);

    let err = lifecycle(&cloud, &ScriptedProbe::ready())
        .status(&workspace)
        .await
        .expect_err("status should fail");

    assert!(matches!(err, ProvisionError::MultipleServersFound(_)));
}

#[tokio::test]
async fn init_lists_a_single_server() {
    let cloud = FakeCloud::new();

    lifecycle(&cloud, &ScriptedProbe::ready())
        .init()
        .await
        .expect("init should succeed");

    assert_eq!(cloud.calls(), vec![ApiCall::ListServers { limit: 1 }]);
}

#[tokio::test]
async fn init_reports_rejected_token() {
    let cloud = FakeCloud::new();
    let rejection = ProviderError::Api {
        endpoint: String::from("/servers"),
        status: 401,
        code: String::from("unauthorized"),
        message: String::from("unable to authenticate"),
    };
    cloud.fail_next("list_servers", rejection.clone());

    let err = lifecycle(&cloud, &ScriptedProbe::ready())
        .init()
        .await
        .expect_err("init should fail");

    assert_eq!(err, ProvisionError::Provider(rejection));
}
