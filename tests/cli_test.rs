//! Integration tests for the hubreg binary.
// The cargo_bin function is marked deprecated in favor of cargo_bin! macro,
// but both work correctly. Suppressing until assert_cmd stabilizes the new API.
#![allow(deprecated)]

use assert_cmd::cargo::cargo_bin;
use assert_cmd::Command;
use base64::Engine;
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

const SHA: &str = "40f7b2a0c1d4e6f8a9b0c1d2e3f4a5b6c7d8e9f0";
const URI: &str = "github.com/ksonnet/parts/tree/master/incubator";

const INVENTORY: &str = r#"apiVersion: "0.1.0"
kind: ksonnet.io/registry
libraries:
  redis:
    path: redis
    version: master
"#;

const PARTS: &str = "name: redis\ndescription: Redis is an open source key-value store.\n";

/// A command isolated from the caller's config, cache and token.
fn hubreg(temp: &TempDir) -> Command {
    let mut cmd = Command::new(cargo_bin("hubreg"));
    cmd.current_dir(temp.path())
        .env("XDG_CONFIG_HOME", temp.path().join("xdg-config"))
        .env("XDG_CACHE_HOME", temp.path().join("xdg-cache"))
        .env_remove("GITHUB_TOKEN")
        .env_remove("RUST_LOG");
    cmd
}

fn file_body(path: &str, content: &str) -> serde_json::Value {
    json!({
        "type": "file",
        "path": path,
        "encoding": "base64",
        "content": base64::engine::general_purpose::STANDARD.encode(content),
    })
}

fn mock_commit(server: &MockServer) {
    server.mock(|when, then| {
        when.method(GET).path("/repos/ksonnet/parts/commits/master");
        then.status(200).body(SHA);
    });
}

fn mock_file(server: &MockServer, path: &str, content: &str) {
    let body = file_body(path, content);
    let route = format!("/repos/ksonnet/parts/contents/{}", path);
    server.mock(move |when, then| {
        when.method(GET).path(route).query_param("ref", SHA);
        then.status(200).json_body(body);
    });
}

fn mock_dir(server: &MockServer, path: &str, entries: serde_json::Value) {
    let route = format!("/repos/ksonnet/parts/contents/{}", path);
    server.mock(move |when, then| {
        when.method(GET).path(route).query_param("ref", SHA);
        then.status(200).json_body(entries);
    });
}

#[test]
fn cli_shows_help() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: hubreg"))
        .stdout(predicate::str::contains("inventory"));
    Ok(())
}

#[test]
fn cli_shows_version() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    Ok(())
}

#[test]
fn parse_prints_coordinates() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .args(["parse", "github.com/ksonnet/parts/tree/release/long/path/incubator"])
        .assert()
        .success()
        .stdout(predicate::str::contains("organization: ksonnet"))
        .stdout(predicate::str::contains("revision_ref: release"))
        .stdout(predicate::str::contains(
            "registry_spec_relative_path: long/path/incubator/registry.yaml",
        ));
    Ok(())
}

#[test]
fn parse_rejects_bare_host() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .args(["parse", "github.com/ksonnet"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("must point at a repository"));
    Ok(())
}

#[test]
fn validate_offline_skips_probe() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .args(["validate", URI, "--offline"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Valid registry URI"));
    Ok(())
}

#[test]
fn list_shows_configured_registries() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    fs::write(
        temp.path().join("hubreg.yml"),
        format!("registries:\n  - name: incubator\n    uri: {}\n", URI),
    )?;

    hubreg(&temp)
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("incubator"))
        .stdout(predicate::str::contains(URI));
    Ok(())
}

#[test]
fn unknown_registry_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .args(["inventory", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown registry: nowhere"));
    Ok(())
}

#[test]
fn inventory_fetches_and_caches() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = temp.path().join("cache");
    let server = MockServer::start();
    mock_commit(&server);
    mock_file(&server, "incubator/registry.yaml", INVENTORY);

    hubreg(&temp)
        .args(["inventory", "incubator", "--uri", URI])
        .arg("--api-root")
        .arg(server.url("/"))
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("revision: {}", SHA)))
        .stdout(predicate::str::contains(format!("redis  {}", SHA)));

    let cached = fs::read_to_string(cache.join("incubator").join("registry.yaml"))?;
    assert!(cached.contains(SHA));
    Ok(())
}

#[test]
fn inventory_falls_back_to_cache_when_remote_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = temp.path().join("cache");
    fs::create_dir_all(cache.join("incubator"))?;
    fs::write(
        cache.join("incubator").join("registry.yaml"),
        "version: 0ld5ha\nlibraries:\n  redis:\n    path: redis\n    version: 0ld5ha\n",
    )?;

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/ksonnet/parts/commits/master");
        then.status(500);
    });

    hubreg(&temp)
        .args(["inventory", "incubator", "--uri", URI])
        .arg("--api-root")
        .arg(server.url("/"))
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("revision: 0ld5ha"))
        .stdout(predicate::str::contains("redis  master"))
        .stderr(predicate::str::contains("falling back"));
    Ok(())
}

#[test]
fn inventory_without_cache_fails_when_remote_fails() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = temp.path().join("cache");
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/ksonnet/parts/commits/master");
        then.status(404);
    });

    hubreg(&temp)
        .args(["inventory", "incubator", "--uri", URI])
        .arg("--api-root")
        .arg(server.url("/"))
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unable to resolve commit"));

    assert!(!cache.join("incubator").exists());
    Ok(())
}

#[test]
fn resolve_writes_library_under_alias() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let dest = temp.path().join("vendor");
    let server = MockServer::start();
    mock_commit(&server);
    mock_dir(
        &server,
        "incubator/redis",
        json!([
            { "type": "file", "path": "incubator/redis/parts.yaml" },
            { "type": "dir", "path": "incubator/redis/prototypes" },
        ]),
    );
    mock_dir(
        &server,
        "incubator/redis/prototypes",
        json!([{ "type": "file", "path": "incubator/redis/prototypes/redis.jsonnet" }]),
    );
    mock_file(&server, "incubator/redis/parts.yaml", PARTS);
    mock_file(&server, "incubator/redis/prototypes/redis.jsonnet", "{}\n");

    hubreg(&temp)
        .args(["resolve", "incubator", "redis", "--as", "cache", "--uri", URI])
        .arg("--api-root")
        .arg(server.url("/"))
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .arg("--dest")
        .arg(&dest)
        .assert()
        .success()
        .stdout(predicate::str::contains("name: cache"))
        .stdout(predicate::str::contains("registry: incubator"))
        .stdout(predicate::str::contains(format!("version: {}", SHA)));

    let target = dest.join("incubator").join("cache");
    assert_eq!(fs::read_to_string(target.join("parts.yaml"))?, PARTS);
    assert_eq!(
        fs::read_to_string(target.join("prototypes").join("redis.jsonnet"))?,
        "{}\n"
    );

    // Only the final directory remains.
    let leftovers: Vec<_> = fs::read_dir(&dest)?
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(leftovers, vec!["incubator"]);
    Ok(())
}

#[test]
fn resolve_with_submodule_leaves_nothing_behind() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let dest = temp.path().join("vendor");
    let server = MockServer::start();
    mock_commit(&server);
    mock_dir(
        &server,
        "incubator/redis",
        json!([{ "type": "submodule", "path": "incubator/redis/vendor" }]),
    );

    hubreg(&temp)
        .args(["resolve", "incubator", "redis", "--uri", URI])
        .arg("--api-root")
        .arg(server.url("/"))
        .arg("--cache-dir")
        .arg(temp.path().join("cache"))
        .arg("--dest")
        .arg(&dest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("submodule"));

    assert!(!dest.join("incubator").join("redis").exists());
    Ok(())
}

#[test]
fn cache_list_and_clear() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = temp.path().join("cache");
    fs::create_dir_all(cache.join("incubator"))?;
    fs::write(
        cache.join("incubator").join("registry.yaml"),
        format!("version: {}\nlibraries:\n  redis:\n    path: redis\n", SHA),
    )?;

    hubreg(&temp)
        .args(["cache", "list"])
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .success()
        .stdout(predicate::str::contains("incubator"))
        .stdout(predicate::str::contains(SHA));

    hubreg(&temp)
        .args(["cache", "clear"])
        .arg("--cache-dir")
        .arg(&cache)
        .assert()
        .success()
        .stderr(predicate::str::contains("Cleared 1 cached registries"));

    assert!(!cache.join("incubator").exists());
    Ok(())
}

#[test]
fn cache_clear_rejects_names_outside_cache() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    let cache = temp.path().join("cache");
    fs::create_dir_all(&cache)?;
    let outside = TempDir::new()?;

    for name in ["..".to_string(), outside.path().to_string_lossy().into_owned()] {
        hubreg(&temp)
            .args(["cache", "clear", &name])
            .arg("--cache-dir")
            .arg(&cache)
            .assert()
            .failure()
            .stderr(predicate::str::contains("must be a single path component"));
    }

    assert!(cache.exists());
    assert!(outside.path().exists());
    Ok(())
}

#[test]
fn completions_bash() -> Result<(), Box<dyn std::error::Error>> {
    let temp = TempDir::new()?;
    hubreg(&temp)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hubreg"));
    Ok(())
}
