// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::api::ApiResource;
use crate::backends::register_builtin;
use crate::config::consts::DEFAULT_MANIFEST;
use crate::config::{apply_manifest, load_manifest, validate_manifest};
use crate::engine::Manager;
use crate::errors::{Error, ManifestError};

fn manager_for(manifest: &crate::config::Manifest) -> Arc<Manager> {
    let manager = Arc::new(Manager::new(manifest.provider()));
    register_builtin(&manager).unwrap();
    manager.register_resource(ApiResource::new(&manager)).unwrap();
    manager
}

async fn get(endpoint: &str, path: &str) -> String {
    let addr = endpoint.trim_start_matches("http://");
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", path, addr);
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    raw
}

#[test]
fn test_shipped_manifest_is_valid() {
    let manifest = load_manifest(DEFAULT_MANIFEST).unwrap();
    let manager = manager_for(&manifest);

    assert_eq!(manifest.provider().name, "rigging");
    assert_eq!(manifest.instances.len(), 5);
    assert!(validate_manifest(&manifest, &manager).is_ok());
}

#[tokio::test]
async fn test_apply_serves_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    let site = dir.path().join("site");
    std::fs::create_dir(&site).unwrap();
    std::fs::write(site.join("hello.txt"), "hello from disk").unwrap();

    let path = dir.path().join("rig.yaml");
    std::fs::write(
        &path,
        format!(
            r#"
name: test-rig
instances:
  - resource: server
    label: main
    attributes:
      listen: 127.0.0.1:0
      router: router-main
  - resource: router
    label: main
    attributes:
      title: Test
      version: 1.0.0
      middleware: [logger-access]
      handlers: [static-docs, api-main]
  - resource: static
    label: docs
    attributes:
      path: /docs
      dir: {}
  - resource: logger
    label: access
  - resource: api
    label: main
"#,
            site.display()
        ),
    )
    .unwrap();

    let manifest = load_manifest(&path).unwrap();
    let manager = manager_for(&manifest);
    let applied = apply_manifest(&manager, &manifest).await.unwrap();

    let names: Vec<&str> = applied.iter().map(|m| m.name.as_str()).collect();
    let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
    assert_eq!(names.len(), 5);
    assert!(position("router-main") < position("server-main"));
    assert!(position("static-docs") < position("router-main"));
    assert!(position("logger-access") < position("router-main"));
    assert!(applied.iter().all(|m| m.readonly));

    let endpoint = manager.get_instance("server-main").await.unwrap().state.get("endpoint").and_then(|v| v.as_str()).unwrap().to_string();

    let file = get(&endpoint, "/docs/hello.txt").await;
    assert!(file.starts_with("HTTP/1.1 200"), "response: {}", file);
    assert!(file.ends_with("hello from disk"));

    let listing = get(&endpoint, "/api/resource?type=static").await;
    assert!(listing.starts_with("HTTP/1.1 200"), "response: {}", listing);
    assert!(listing.contains("\"provider\":\"test-rig\""));
    assert!(listing.contains("static-docs"));

    let docs = manager.get_instance("static-docs").await.unwrap().state;
    assert_eq!(docs.get("endpoints"), Some(&serde_json::json!([format!("{}/docs", endpoint)])));

    manager.close().await.unwrap();
    assert!(manager.instance_names().is_empty());
    assert!(TcpStream::connect(endpoint.trim_start_matches("http://")).await.is_err());
}

#[tokio::test]
async fn test_invalid_manifest_applies_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rig.json");
    std::fs::write(
        &path,
        r#"{
            "instances": [
                {"resource": "server", "label": "main", "attributes": {"listen": "127.0.0.1:0", "router": "router-gone"}},
                {"resource": "logger", "label": "access"},
                {"resource": "logger", "label": "access"}
            ]
        }"#,
    )
    .unwrap();

    let manifest = load_manifest(&path).unwrap();
    let manager = manager_for(&manifest);
    let err = apply_manifest(&manager, &manifest).await.unwrap_err();

    match err {
        Error::Manifest(errors) => assert_eq!(
            errors,
            vec![
                ManifestError::DuplicateInstance {
                    name: "logger-access".to_string()
                },
                ManifestError::UnresolvedReference {
                    instance: "server-main".to_string(),
                    reference: "router-gone".to_string()
                },
            ]
        ),
        other => panic!("unexpected error: {}", other),
    }
    assert!(manager.instance_names().is_empty());
}

#[tokio::test]
async fn test_failed_instance_stops_apply() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let taken = occupied.local_addr().unwrap().to_string();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rig.toml");
    std::fs::write(
        &path,
        format!(
            r#"
[[instances]]
resource = "router"
label = "main"
[instances.attributes]
title = "T"
version = "1.0.0"

[[instances]]
resource = "server"
label = "main"
[instances.attributes]
listen = "{}"
router = "router-main"
"#,
            taken
        ),
    )
    .unwrap();

    let manifest = load_manifest(&path).unwrap();
    let manager = manager_for(&manifest);
    let err = apply_manifest(&manager, &manifest).await.unwrap_err();

    assert!(err.to_string().starts_with("server-main: "));
    assert_eq!(manager.instance_names(), vec!["router-main".to_string()]);
    manager.close().await.unwrap();
    assert!(manager.instance_names().is_empty());
}
