//! Shared fixtures: a local release feed served by axum, packages built with
//! the system `tar`, and an `AppConfig` rooted in a scratch directory.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use axum::{Json, Router, http::StatusCode, routing::get};
use serde_json::{Value, json};
use testapp_types::AppConfig;

pub const FEED_PATH: &str = "/releases/latest";
pub const ASSET_PATH: &str = "/assets/simple-test-app.tar.gz";
pub const LIVE_DB: &[u8] = b"SQLite format 3\0live user rows";

/// Serves `feed` (built from the server's base URL) at [`FEED_PATH`] with
/// `status`, and `archive` at [`ASSET_PATH`] (404 when `None`).
pub async fn serve_feed<F>(status: StatusCode, feed: F, archive: Option<Vec<u8>>) -> String
where
    F: FnOnce(&str) -> Value,
{
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let body = feed(&base_url);

    let app = Router::new()
        .route(
            FEED_PATH,
            get(move || {
                let body = body.clone();
                async move { (status, Json(body)) }
            }),
        )
        .route(
            ASSET_PATH,
            get(move || {
                let archive = archive.clone();
                async move {
                    match archive {
                        Some(bytes) => (StatusCode::OK, bytes),
                        None => (StatusCode::NOT_FOUND, Vec::new()),
                    }
                }
            }),
        );

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    base_url
}

/// Release payload in the feed's shape with a single `.tar.gz` asset.
pub fn release_json(base_url: &str, tag: &str) -> Value {
    json!({
        "tag_name": tag,
        "name": format!("Release {}", tag),
        "assets": [
            { "name": "notes.txt", "browser_download_url": format!("{}/assets/notes.txt", base_url) },
            { "name": "simple-test-app.tar.gz", "browser_download_url": format!("{}{}", base_url, ASSET_PATH) }
        ]
    })
}

/// Builds a `.tar.gz` holding `files` (relative path, contents).
pub fn build_archive(files: &[(&str, &str)]) -> Vec<u8> {
    let dir = tempfile::tempdir().unwrap();
    let src = dir.path().join("src");
    std::fs::create_dir_all(&src).unwrap();

    for (rel, contents) in files {
        let path = src.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    let out = dir.path().join("package.tar.gz");
    let status = Command::new("tar")
        .arg("-czf")
        .arg(&out)
        .arg("-C")
        .arg(&src)
        .arg(".")
        .status()
        .unwrap();
    assert!(status.success());

    std::fs::read(out).unwrap()
}

/// Config rooted in `root` that installs with plain `sh` and does not pause
/// before restoring.
pub fn test_config(root: &Path, base_url: &str) -> AppConfig {
    let mut config = AppConfig::new(root.join("data"), root.join("scratch"));
    config.releases_url = format!("{}{}", base_url, FEED_PATH);
    config.install_command = vec!["sh".to_string()];
    config.restore_delay = Duration::ZERO;
    config.current_version = "1.0.0".to_string();
    config
}

pub fn write_live_db(config: &AppConfig) {
    std::fs::create_dir_all(&config.data_dir).unwrap();
    std::fs::write(config.db_path(), LIVE_DB).unwrap();
}

/// Shell script that overwrites the live database, as a real installer
/// replacing the app's files would, then exits with `code`.
pub fn clobbering_script(config: &AppConfig, code: i32) -> String {
    format!(
        "printf 'clobbered' > '{}'\nexit {}\n",
        config.db_path().display(),
        code
    )
}
