//! Unit tests for the Hetzner Cloud client helpers.

use reqwest::StatusCode;
use rstest::rstest;

use super::wire::{ActionEnvelope, OptionalActionEnvelope, ServerList, VolumeList};
use super::{HetznerApi, api_error, build_client, decode};
use crate::provider::{
    ActionStatus, Architecture, ProviderError, ServerCreated, ServerStatus, VolumeCreated,
};

const SERVER_CREATED: &str = r#"{
    "server": {
        "id": 42,
        "name": "devpod-abc123",
        "status": "initializing",
        "public_net": {
            "ipv4": {"id": 9, "ip": "203.0.113.10", "blocked": false, "dns_ptr": "static"},
            "ipv6": null
        },
        "labels": {"type": "devpod"},
        "server_type": {"id": 22, "name": "cx32"}
    },
    "action": {
        "id": 100,
        "command": "create_server",
        "status": "running",
        "progress": 0,
        "error": null
    },
    "next_actions": [
        {"id": 101, "command": "start_server", "status": "running", "error": null}
    ],
    "root_password": null
}"#;

#[test]
fn decodes_server_creation_response() {
    let created: ServerCreated =
        decode("/servers", SERVER_CREATED.as_bytes()).expect("payload should decode");

    assert_eq!(created.server.id, 42);
    assert_eq!(created.server.status, ServerStatus::Initializing);
    assert_eq!(
        created.server.public_ipv4().map(|ip| ip.to_string()),
        Some(String::from("203.0.113.10"))
    );
    assert_eq!(created.action.map(|action| action.id), Some(100));
    assert_eq!(created.next_actions.len(), 1);
}

#[test]
fn decodes_volume_creation_without_next_actions() {
    let body = r#"{
        "volume": {
            "id": 7,
            "name": "devpod-abc123",
            "size": 30,
            "server": null,
            "location": {"id": 1, "name": "nbg1", "city": "Nuremberg"},
            "linux_device": "/dev/disk/by-id/scsi-0HC_Volume_7",
            "format": "ext4"
        },
        "action": {"id": 5, "command": "create_volume", "status": "success", "error": null}
    }"#;
    let created: VolumeCreated = decode("/volumes", body.as_bytes()).expect("should decode");

    assert_eq!(created.volume.location.name, "nbg1");
    assert!(created.volume.server.is_none());
    assert!(created.volume.labels.is_empty());
    assert!(created.next_actions.is_empty());
}

#[test]
fn decodes_attached_volume_list() {
    let body = r#"{"volumes": [{
        "id": 7, "name": "devpod-abc123", "size": 30, "server": 42,
        "location": {"id": 1, "name": "nbg1"}, "labels": {"type": "devpod"}
    }], "meta": {"pagination": {"page": 1}}}"#;
    let list: VolumeList = decode("/volumes", body.as_bytes()).expect("should decode");

    assert_eq!(list.volumes.first().and_then(|volume| volume.server), Some(42));
}

#[test]
fn decodes_empty_server_list() {
    let list: ServerList =
        decode("/servers", br#"{"servers": [], "meta": {}}"#).expect("should decode");
    assert!(list.servers.is_empty());
}

#[test]
fn decodes_failed_action() {
    let body = r#"{"action": {
        "id": 11, "command": "detach_volume", "status": "error",
        "error": {"code": "action_failed", "message": "volume busy"}
    }}"#;
    let envelope: ActionEnvelope = decode("/actions/11", body.as_bytes()).expect("should decode");

    assert_eq!(envelope.action.status, ActionStatus::Error);
    assert_eq!(
        envelope.action.error.map(|error| error.message),
        Some(String::from("volume busy"))
    );
}

#[rstest]
#[case(b"{}".as_slice(), false)]
#[case(br#"{"action": null}"#.as_slice(), false)]
#[case(br#"{"action": {"id": 3, "command": "delete_server", "status": "running", "error": null}}"#.as_slice(), true)]
fn server_deletion_action_is_optional(#[case] body: &[u8], #[case] has_action: bool) {
    let envelope: OptionalActionEnvelope = decode("/servers/1", body).expect("should decode");
    assert_eq!(envelope.action.is_some(), has_action);
}

#[test]
fn image_architecture_uses_api_spelling() {
    let body = r#"{"images": [{"id": 3, "name": "docker-ce", "architecture": "arm"}]}"#;
    let list: super::wire::ImageList = decode("/images", body.as_bytes()).expect("should decode");
    assert_eq!(
        list.images.first().map(|image| image.architecture),
        Some(Architecture::Arm)
    );
}

#[test]
fn malformed_success_body_is_a_decode_error() {
    let err = decode::<ServerList>("/servers", b"<html>").expect_err("should fail");
    assert!(matches!(err, ProviderError::Decode { ref endpoint, .. } if endpoint == "/servers"));
}

#[test]
fn api_error_uses_error_envelope() {
    let body = br#"{"error": {"code": "unauthorized", "message": "unable to authenticate", "details": {}}}"#;
    let err = api_error("/servers", StatusCode::UNAUTHORIZED, body);

    assert_eq!(
        err,
        ProviderError::Api {
            endpoint: String::from("/servers"),
            status: 401,
            code: String::from("unauthorized"),
            message: String::from("unable to authenticate"),
        }
    );
}

#[test]
fn api_error_falls_back_to_raw_body() {
    let err = api_error("/volumes", StatusCode::BAD_GATEWAY, b"upstream unavailable");

    assert_eq!(
        err.to_string(),
        "provider rejected /volumes with status 502 (unknown): upstream unavailable"
    );
}

#[rstest]
#[case("https://api.hetzner.cloud/v1", "https://api.hetzner.cloud/v1/servers")]
#[case("http://127.0.0.1:8080/v1/", "http://127.0.0.1:8080/v1/servers")]
fn joins_base_url_and_path(#[case] base: &str, #[case] expected: &str) {
    let api = HetznerApi::with_base_url("token", base).expect("client should build");
    assert_eq!(api.url("/servers"), expected);
}

#[test]
fn client_builder_failure_is_reported() {
    let err = build_client(reqwest::Client::builder().user_agent("bad\nagent"))
        .expect_err("invalid user agent should fail");

    assert!(matches!(err, ProviderError::Client { .. }));
}
