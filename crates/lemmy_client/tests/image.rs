// Integration tests for pict-rs uploads through `Image`.
// Run with: cargo test -p lemmy-client --test image

use std::path::PathBuf;

use httpmock::prelude::*;
use lemmy_client::{Error, Image, Requestor};
use serde_json::json;

fn mock_nodeinfo(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/nodeinfo/2.0.json");
        then.status(200)
            .json_body(json!({"software": {"name": "lemmy", "version": "0.19.3"}}));
    });
}

fn requestor(server: &MockServer, raise_exceptions: bool) -> Requestor {
    mock_nodeinfo(server);
    let mut requestor = Requestor::new(server.base_url(), raise_exceptions).unwrap();
    requestor.auth_mut().set_token("tok");
    requestor
}

fn write_image(dir: &tempfile::TempDir) -> PathBuf {
    let path = dir.path().join("cat.jpg");
    std::fs::write(&path, b"fake jpeg payload").unwrap();
    path
}

// ── upload ──────────────────────────────────────────────────────────

#[test]
fn upload_builds_public_urls() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/pictrs/image")
            .header("cookie", "jwt=tok")
            .query_param_missing("auth")
            .body_includes("images[]")
            .body_includes("fake jpeg payload");
        then.status(201).json_body(json!({
            "msg": "ok",
            "files": [{
                "file": "a.jpg",
                "delete_token": "t1",
                "details": {"width": 1, "height": 1, "content_type": "image/jpeg"},
            }],
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let requestor = requestor(&server, true);
    let image = Image::new(&requestor);

    let files = image.upload(write_image(&dir)).unwrap().unwrap();
    assert_eq!(files.len(), 1);

    let file = &files[0];
    assert!(file.image_url.ends_with("/pictrs/image/a.jpg"), "{}", file.image_url);
    assert!(
        file.delete_url.ends_with("/pictrs/image/delete/t1/a.jpg"),
        "{}",
        file.delete_url,
    );
    assert_eq!(file.image_url, format!("{}/pictrs/image/a.jpg", server.base_url()));

    let json = serde_json::to_value(file).unwrap();
    assert!(json.get("file").is_none());
    assert!(json.get("delete_token").is_none());
    assert_eq!(json["details"]["content_type"], "image/jpeg");

    upload.assert();
}

#[test]
fn upload_without_token_sends_no_cookie() {
    let server = MockServer::start();
    mock_nodeinfo(&server);
    let upload = server.mock(|when, then| {
        when.method(POST).path("/pictrs/image").header_missing("cookie");
        then.status(201)
            .json_body(json!({"files": [{"file": "b.png", "delete_token": "t2"}]}));
    });

    let dir = tempfile::tempdir().unwrap();
    let requestor = Requestor::new(server.base_url(), true).unwrap();
    let files = Image::new(&requestor)
        .upload(write_image(&dir))
        .unwrap()
        .unwrap();

    assert_eq!(files.len(), 1);
    upload.assert();
}

#[test]
fn upload_response_without_files_returns_none() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/pictrs/image");
        then.status(200).json_body(json!({"msg": "ok"}));
    });

    let dir = tempfile::tempdir().unwrap();
    let requestor = requestor(&server, true);
    assert!(Image::new(&requestor).upload(write_image(&dir)).unwrap().is_none());
}

#[test]
fn upload_failure_follows_policy() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/pictrs/image");
        then.status(413).body("payload too large");
    });

    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir);
    let mut requestor = requestor(&server, false);

    assert!(Image::new(&requestor).upload(&path).unwrap().is_none());

    requestor.set_raise_exceptions(true);
    let err = Image::new(&requestor).upload(&path).unwrap_err();
    match err {
        Error::Status { status, body, .. } => {
            assert_eq!(status, 413);
            assert_eq!(body, "payload too large");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[test]
fn upload_malformed_entry_follows_policy() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/pictrs/image");
        then.status(201).json_body(json!({"files": [{"file": "a.jpg"}]}));
    });

    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir);
    let mut requestor = requestor(&server, false);

    assert!(Image::new(&requestor).upload(&path).unwrap().is_none());

    requestor.set_raise_exceptions(true);
    let err = Image::new(&requestor).upload(&path).unwrap_err();
    assert!(matches!(err, Error::MalformedResponse { .. }), "got {:?}", err);
}

#[test]
fn upload_missing_file_always_errors() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST).path("/pictrs/image");
        then.status(201).json_body(json!({"files": []}));
    });

    let dir = tempfile::tempdir().unwrap();
    let requestor = requestor(&server, false);
    let err = Image::new(&requestor)
        .upload(dir.path().join("missing.jpg"))
        .unwrap_err();

    assert!(matches!(err, Error::Io { .. }), "got {:?}", err);
    upload.assert_calls(0);
}

// ── async_upload ────────────────────────────────────────────────────

#[test]
fn async_upload_returns_upload_id() {
    let server = MockServer::start();
    let upload = server.mock(|when, then| {
        when.method(POST)
            .path("/pictrs/image/backgrounded")
            .header("cookie", "jwt=tok")
            .body_includes("fake jpeg payload");
        then.status(202).json_body(json!({
            "msg": "ok",
            "uploads": [{"upload_id": "6e7b1c9a-5e0f-4c1e-9d3b-0f2a7c8e4b21"}],
        }));
    });

    let dir = tempfile::tempdir().unwrap();
    let requestor = requestor(&server, false);
    let id = Image::new(&requestor).async_upload(write_image(&dir)).unwrap();

    assert_eq!(id, "6e7b1c9a-5e0f-4c1e-9d3b-0f2a7c8e4b21");
    upload.assert();
}

#[test]
fn async_upload_wrong_upload_count_always_errors() {
    let bodies = [
        json!({"uploads": []}),
        json!({"uploads": [{"upload_id": "a"}, {"upload_id": "b"}]}),
        json!({"msg": "ok"}),
    ];

    for body in bodies {
        for raise in [false, true] {
            let server = MockServer::start();
            server.mock(|when, then| {
                when.method(POST).path("/pictrs/image/backgrounded");
                then.status(202).json_body(body.clone());
            });

            let dir = tempfile::tempdir().unwrap();
            let requestor = requestor(&server, raise);
            let err = Image::new(&requestor)
                .async_upload(write_image(&dir))
                .unwrap_err();

            assert!(
                matches!(err, Error::UploadRejected(_)),
                "body {} raise {}: got {:?}",
                body,
                raise,
                err,
            );
        }
    }
}

#[test]
fn async_upload_failed_request_errors_even_when_suppressing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/pictrs/image/backgrounded");
        then.status(500).body("internal error");
    });

    let dir = tempfile::tempdir().unwrap();
    let path = write_image(&dir);
    let mut requestor = requestor(&server, false);

    let err = Image::new(&requestor).async_upload(&path).unwrap_err();
    assert!(matches!(err, Error::UploadRejected("request failed")), "got {:?}", err);

    requestor.set_raise_exceptions(true);
    let err = Image::new(&requestor).async_upload(&path).unwrap_err();
    assert!(matches!(err, Error::Status { status: 500, .. }), "got {:?}", err);
}

#[test]
fn pictrs_base_url_follows_instance() {
    let requestor = Requestor::new("http://127.0.0.1:1", false).unwrap();
    let image = Image::new(&requestor);
    assert_eq!(image.pictrs_base_url(), "http://127.0.0.1:1/pictrs");
    assert!(image.auth_token().is_none());
}
