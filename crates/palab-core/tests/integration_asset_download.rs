//! Integration tests: real libcurl fetcher against a local HTTP server.
//!
//! Covers single-file downloads with and without limits, and a complete
//! bootstrap run where every source is discovered through the hub API.

mod common;

use common::asset_server::{AssetServer, Route};
use palab_core::bootstrap::{
    AssetKind, AssetState, BootstrapManager, JsonFileStore, Phase, StatusStore,
};
use palab_core::checksum::sha256_path;
use palab_core::config::{LabConfig, RetryConfig};
use palab_core::downloader::{download_file, DownloadError, DownloadTask};
use palab_core::fetch::CurlFetcher;
use std::time::Duration;
use tempfile::tempdir;

fn fetcher() -> CurlFetcher {
    CurlFetcher::new().with_connect_timeout(Duration::from_secs(5))
}

fn body(len: usize) -> Vec<u8> {
    (0u8..100).cycle().take(len).collect()
}

#[test]
fn curl_download_writes_exact_body() {
    let server = AssetServer::start();
    let data = body(64 * 1024);
    server.route("/files/corpus.jsonl", Route::ok(data.clone()));

    let dir = tempdir().unwrap();
    let dest = dir.path().join("datasets").join("text").join("corpus.jsonl");
    let mut seen = Vec::new();
    let written = {
        let mut task = DownloadTask::new(server.url("/files/corpus.jsonl"), &dest)
            .with_progress(|p| seen.push(p));
        download_file(&fetcher(), &mut task).expect("download")
    };

    assert_eq!(written, data.len() as u64);
    assert_eq!(std::fs::read(&dest).unwrap(), data);
    assert_eq!(seen.last(), Some(&100));
    assert!(seen.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn curl_declared_size_over_limit_is_rejected_before_writing() {
    let server = AssetServer::start();
    server.route("/big.bin", Route::ok(body(10_000)));

    let dir = tempdir().unwrap();
    let dest = dir.path().join("out").join("big.bin");
    let mut task = DownloadTask::new(server.url("/big.bin"), &dest).with_limit(Some(1_000));
    let err = download_file(&fetcher(), &mut task).unwrap_err();

    assert!(matches!(
        err,
        DownloadError::SizeLimitExceeded {
            limit: 1_000,
            actual: 10_000
        }
    ));
    assert!(!dest.exists());
    assert!(!dest.parent().unwrap().exists());
}

#[test]
fn curl_streamed_size_over_limit_without_length() {
    let server = AssetServer::start();
    server.route("/stream.bin", Route::ok(body(50_000)).without_length());

    let dir = tempdir().unwrap();
    let dest = dir.path().join("stream.bin");
    let mut task = DownloadTask::new(server.url("/stream.bin"), &dest).with_limit(Some(4_096));
    let err = download_file(&fetcher(), &mut task).unwrap_err();

    assert!(matches!(err, DownloadError::SizeLimitExceeded { limit: 4_096, .. }));
    assert!(!dest.exists());
}

#[test]
fn curl_http_error_status() {
    let server = AssetServer::start();
    let dir = tempdir().unwrap();
    let dest = dir.path().join("missing.bin");
    let mut task = DownloadTask::new(server.url("/missing.bin"), &dest);
    let err = download_file(&fetcher(), &mut task).unwrap_err();

    assert!(matches!(err, DownloadError::Http { status: 404, .. }));
    assert!(!dest.exists());
}

#[test]
fn curl_truncated_body_fails_and_keeps_nothing() {
    let server = AssetServer::start();
    server.route("/short.bin", Route::ok(body(1_000)).declaring(5_000));

    let dir = tempdir().unwrap();
    let dest = dir.path().join("short.bin");
    let mut task = DownloadTask::new(server.url("/short.bin"), &dest);
    assert!(download_file(&fetcher(), &mut task).is_err());
    assert!(!dest.exists());
    assert!(!dir.path().join("short.bin.part").exists());
}

#[test]
fn bootstrap_against_local_hub_with_discovery() {
    let server = AssetServer::start();
    server
        .route(
            "/api/datasets?search=persian&limit=5",
            Route::ok(r#"[{"id":"lab/fa-text"}]"#),
        )
        .route(
            "/api/datasets/lab/fa-text",
            Route::ok(r#"{"siblings":[{"rfilename":"README.md"},{"rfilename":"train.jsonl"}]}"#),
        )
        .route(
            "/datasets/lab/fa-text/resolve/main/train.jsonl",
            Route::ok("{\"text\":\"سلام\"}\n"),
        )
        .route(
            "/api/datasets?search=persian+speech&limit=5",
            Route::ok(r#"[{"id":"lab/fa-speech"},{"id":"other/x"}]"#),
        )
        .route(
            "/api/datasets/lab/fa-speech",
            Route::ok(
                r#"{"siblings":[{"rfilename":"a.tar"},{"rfilename":"b.tar"},{"rfilename":"c.tar"}]}"#,
            ),
        )
        .route(
            "/datasets/lab/fa-speech/resolve/main/a.tar",
            Route::ok(body(3_000)),
        )
        .route(
            "/datasets/lab/fa-speech/resolve/main/b.tar",
            Route::ok(body(2_000)).without_length(),
        )
        .route(
            "/api/models?search=persian+tts&limit=5",
            Route::ok(r#"[{"id":"lab/fa-vits"}]"#),
        )
        .route(
            "/api/models/lab/fa-vits",
            Route::ok(r#"{"siblings":[{"rfilename":"fa.onnx"}]}"#),
        )
        .route("/lab/fa-vits/resolve/main/fa.onnx", Route::ok(body(8_192)));

    let root = tempdir().unwrap();
    let mut cfg = LabConfig::default();
    cfg.hub_url = server.base_url().to_string();
    cfg.max_asr_files = 2;
    cfg.retry = Some(RetryConfig {
        max_attempts: 1,
        base_delay_secs: 0.0,
        max_delay_secs: 0,
    });
    let store = JsonFileStore::new(root.path());

    let mut mgr = BootstrapManager::new(cfg.clone(), root.path(), fetcher(), store.clone());
    let state = mgr.start().clone();

    assert_eq!(state.phase, Phase::Done, "state: {state:?}");
    let asr = state.asset(AssetKind::Asr).unwrap();
    assert_eq!(asr.selected_source_id.as_deref(), Some("lab/fa-speech"));
    assert_eq!(asr.files.len(), 2);
    assert_eq!(asr.bytes_downloaded, Some(5_000));
    let onnx = root.path().join("models/tts/fa.onnx");
    assert_eq!(
        state.asset(AssetKind::Tts).unwrap().checksums["models/tts/fa.onnx"],
        sha256_path(&onnx).unwrap()
    );
    assert_eq!(store.load_provenance().unwrap().len(), 3);

    // Second run: everything on disk, no connections.
    let hits = server.hits();
    let mut again = BootstrapManager::new(cfg, root.path(), fetcher(), store);
    let state = again.start();
    assert_eq!(state.phase, Phase::Done);
    assert!(state
        .assets
        .values()
        .all(|a| a.status == AssetState::Installed));
    assert_eq!(server.hits(), hits);
}
