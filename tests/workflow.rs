use httpmock::prelude::*;
use m2mapi::{Client, ClientConfig, GeoPoint, SearchCriteria, Stage, StageError, Workflow};
use serde_json::json;
use std::time::Duration;

fn client_for(server: &MockServer) -> Client {
    Client::from_config(ClientConfig {
        url: server.base_url(),
        token: "test-token".to_string(),
        verify: true,
        timeout: Some(Duration::from_secs(10)),
    })
    .unwrap()
    .with_progress(false)
}

fn criteria() -> SearchCriteria {
    SearchCriteria::new("landsat_8_c1", GeoPoint::new(34.0, -118.0))
}

fn mock_status<'a>(server: &'a MockServer, code: u16) -> httpmock::Mock<'a> {
    server.mock(|when, then| {
        when.method(GET).path("/system-status");
        then.status(code).json_body(json!({"data": "ok"}));
    })
}

fn mock_datasets(server: &MockServer) -> httpmock::Mock<'_> {
    server.mock(|when, then| {
        when.method(GET).path("/dataset-search");
        then.status(200).json_body(json!({"data": []}));
    })
}

#[test]
fn full_chain_produces_a_download_handle() {
    let server = MockServer::start();
    let status = mock_status(&server, 200);
    let datasets = mock_datasets(&server);
    let scenes = server.mock(|when, then| {
        when.method(POST).path("/scene-search");
        then.status(200)
            .json_body(json!({"data": {"results": [{"entityId": "X"}]}}));
    });
    let download = server.mock(|when, then| {
        when.method(POST)
            .path("/download-request")
            .json_body(json!({"datasetName": "landsat_8_c1", "entityId": "X"}));
        then.status(200)
            .json_body(json!({"data": {"downloadUrl": "http://example/file.tif"}}));
    });

    let client = client_for(&server);
    let report = Workflow::new(&client, criteria()).run();

    status.assert();
    datasets.assert();
    scenes.assert();
    download.assert();
    assert!(report.is_online());
    assert_eq!(report.halted_at(), None);
    assert_eq!(
        report.download_handle().map(|h| h.url.as_str()),
        Some("http://example/file.tif")
    );
}

#[test]
fn empty_search_never_requests_a_download() {
    let server = MockServer::start();
    mock_status(&server, 200);
    mock_datasets(&server);
    server.mock(|when, then| {
        when.method(POST).path("/scene-search");
        then.status(200).json_body(json!({}));
    });
    let download = server.mock(|when, then| {
        when.method(POST).path("/download-request");
        then.status(200)
            .json_body(json!({"data": {"downloadUrl": "http://example/file.tif"}}));
    });

    let client = client_for(&server);
    let report = Workflow::new(&client, criteria()).run();

    download.assert_hits(0);
    assert!(report.download.is_none());
    assert!(matches!(report.scene, Some(Err(StageError::NoScenes { .. }))));
    assert_eq!(report.halted_at(), Some(Stage::SceneSearch));
}

#[test]
fn failed_scene_search_never_requests_a_download() {
    let server = MockServer::start();
    mock_status(&server, 200);
    mock_datasets(&server);
    server.mock(|when, then| {
        when.method(POST).path("/scene-search");
        then.status(500).body("internal error");
    });
    let download = server.mock(|when, then| {
        when.method(POST).path("/download-request");
        then.status(200);
    });

    let client = client_for(&server);
    let report = Workflow::new(&client, criteria()).run();

    download.assert_hits(0);
    let err = report.scene.unwrap().unwrap_err();
    assert_eq!(err.body(), Some("internal error"));
}

#[test]
fn failed_status_check_is_advisory_by_default() {
    let server = MockServer::start();
    mock_status(&server, 503);
    let datasets = mock_datasets(&server);
    let scenes = server.mock(|when, then| {
        when.method(POST).path("/scene-search");
        then.status(200)
            .json_body(json!({"data": {"results": [{"entityId": "X"}]}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/download-request");
        then.status(200)
            .json_body(json!({"data": {"downloadUrl": "http://example/file.tif"}}));
    });

    let client = client_for(&server);
    let report = Workflow::new(&client, criteria()).run();

    datasets.assert();
    scenes.assert();
    assert!(!report.is_online());
    assert!(report.download_handle().is_some());
}

#[test]
fn failed_status_check_can_be_fatal() {
    let server = MockServer::start();
    mock_status(&server, 401);
    let datasets = mock_datasets(&server);
    let scenes = server.mock(|when, then| {
        when.method(POST).path("/scene-search");
        then.status(200);
    });

    let client = client_for(&server);
    let report = Workflow::new(&client, criteria())
        .halt_on_status_failure(true)
        .run();

    datasets.assert_hits(0);
    scenes.assert_hits(0);
    assert_eq!(report.halted_at(), Some(Stage::Status));
    assert!(report.scene.is_none());
    assert!(report.download.is_none());
}

#[test]
fn failed_download_request_does_not_crash_the_run() {
    let server = MockServer::start();
    mock_status(&server, 200);
    mock_datasets(&server);
    server.mock(|when, then| {
        when.method(POST).path("/scene-search");
        then.status(200)
            .json_body(json!({"data": {"results": [{"entityId": "X"}]}}));
    });
    server.mock(|when, then| {
        when.method(POST).path("/download-request");
        then.status(403).body("{\"errorMessage\":\"no download access\"}");
    });

    let client = client_for(&server);
    let report = Workflow::new(&client, criteria()).run();

    assert_eq!(report.halted_at(), None);
    assert!(report.download_handle().is_none());
    let err = report.download.unwrap().unwrap_err();
    assert_eq!(err.stage(), Stage::DownloadRequest);
    assert!(err.body().unwrap().contains("no download access"));
}
