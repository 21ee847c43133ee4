// SPDX-License-Identifier: MIT

use super::*;
use std::path::Path;
use tempfile::tempdir;

async fn write_blueprint(dir: &Path, id: &str, content: &str) {
    tokio::fs::write(dir.join(format!("{id}.md")), content).await.unwrap();
}

#[tokio::test]
async fn loads_and_caches_a_blueprint() {
    let dir = tempdir().unwrap();
    write_blueprint(dir.path(), "senior-coder", "---\nagent_id: senior-coder\n---\nYou write code.\n").await;

    let loader = BlueprintLoader::new(dir.path(), "anthropic:default");
    let bp = loader.load("senior-coder").await.unwrap();
    assert_eq!(bp.agent_id, "senior-coder");

    // Remove the file; a cached load must still succeed.
    tokio::fs::remove_file(dir.path().join("senior-coder.md")).await.unwrap();
    let bp2 = loader.load("senior-coder").await.unwrap();
    assert_eq!(bp2.agent_id, "senior-coder");
}

#[tokio::test]
async fn invalidate_forces_reload_from_disk() {
    let dir = tempdir().unwrap();
    write_blueprint(dir.path(), "senior-coder", "---\nagent_id: senior-coder\n---\nOld prompt.\n").await;

    let loader = BlueprintLoader::new(dir.path(), "anthropic:default");
    let first = loader.load("senior-coder").await.unwrap();
    assert_eq!(first.system_prompt, "Old prompt.");

    write_blueprint(dir.path(), "senior-coder", "---\nagent_id: senior-coder\n---\nNew prompt.\n").await;
    loader.invalidate("senior-coder");
    let second = loader.load("senior-coder").await.unwrap();
    assert_eq!(second.system_prompt, "New prompt.");
}

#[tokio::test]
async fn clear_cache_drops_all_entries() {
    let dir = tempdir().unwrap();
    write_blueprint(dir.path(), "a", "---\nagent_id: a\n---\nPrompt A.\n").await;
    write_blueprint(dir.path(), "b", "---\nagent_id: b\n---\nPrompt B.\n").await;

    let loader = BlueprintLoader::new(dir.path(), "anthropic:default");
    loader.load("a").await.unwrap();
    loader.load("b").await.unwrap();
    loader.clear_cache();

    tokio::fs::remove_file(dir.path().join("a.md")).await.unwrap();
    assert!(matches!(loader.load("a").await, Err(LoadError::NotFound(_, _))));
}

#[tokio::test]
async fn missing_blueprint_is_not_found() {
    let dir = tempdir().unwrap();
    let loader = BlueprintLoader::new(dir.path(), "anthropic:default");
    assert!(matches!(loader.load("ghost").await, Err(LoadError::NotFound(_, _))));
}

#[tokio::test]
async fn invalid_blueprint_surfaces_parse_error() {
    let dir = tempdir().unwrap();
    write_blueprint(dir.path(), "bad", "---\nagent_id: Not Valid\n---\nprompt\n").await;
    let loader = BlueprintLoader::new(dir.path(), "anthropic:default");
    assert!(matches!(loader.load("bad").await, Err(LoadError::Parse(_, _))));
}
