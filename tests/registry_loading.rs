//! Registry lookup and directory loading tests

use aitool::registry::{RegistryIndex, INDEX_FILE_NAME};
use aitool::{Tool, ToolQuery, ToolRegistry};
use serde_json::{json, Value};
use std::path::Path;

fn doc(id: &str, category: &str, tags: &[&str], trigger: &str) -> Value {
    json!({
        "manifest": {
            "id": id,
            "name": id.replace('.', "_"),
            "version": "1.0.0",
            "description": format!("{} tool", id),
            "category": category,
            "tags": tags
        },
        "capabilities": {"primary_function": "x"},
        "execution": {
            "protocol": "function_call",
            "endpoint": {"type": "python_function", "module": "m", "function": "f"}
        },
        "usage_guidance": {
            "when_to_use": [{"trigger": trigger, "examples": []}]
        }
    })
}

fn write(dir: &Path, rel: &str, value: &Value) {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, serde_json::to_string_pretty(value).unwrap()).unwrap();
}

fn sample_registry() -> ToolRegistry {
    let mut reg = ToolRegistry::new();
    for (id, cat, tags, trigger) in [
        ("a", "data_retrieval", vec!["db", "sql"], "query database"),
        ("b", "data_retrieval", vec!["db"], "lookup records"),
        ("c", "data_retrieval", vec!["sql", "db", "fast"], "fetch rows"),
        ("d", "communication", vec!["email"], "send email"),
    ] {
        reg.register(Tool::from_value(doc(id, cat, &tags, trigger)).unwrap());
    }
    reg
}

fn ids(tools: Vec<&Tool>) -> Vec<String> {
    tools.into_iter().map(|t| t.id().to_string()).collect()
}

#[test]
fn test_find_by_category() {
    let reg = sample_registry();
    assert_eq!(
        ids(reg.find(&ToolQuery::new().category("data_retrieval"))),
        vec!["a", "b", "c"]
    );
    assert_eq!(reg.categories().get("data_retrieval"), Some(&3));
}

#[test]
fn test_find_by_tags_requires_superset() {
    let reg = sample_registry();
    assert_eq!(ids(reg.find(&ToolQuery::new().tags(["db", "sql"]))), vec!["a", "c"]);
    assert!(reg.find(&ToolQuery::new().tag("nope")).is_empty());
}

#[test]
fn test_find_combines_filters() {
    let reg = sample_registry();
    let query = ToolQuery::new()
        .category("data_retrieval")
        .tag("db")
        .text("please fetch the latest rows");
    assert_eq!(ids(reg.find(&query)), vec!["c"]);
    assert_eq!(reg.find(&ToolQuery::new()).len(), 4);
}

#[test]
fn test_lookup_by_id_and_name() {
    let reg = sample_registry();
    assert_eq!(reg.get("d").map(Tool::name), Some("d"));
    assert!(reg.get("zzz").is_none());
    assert_eq!(reg.get_by_name("b").map(Tool::id), Some("b"));

    let list = reg.list();
    assert_eq!(list.len(), 4);
    assert_eq!(list[3].description, "d tool");
}

#[tokio::test]
async fn test_directory_scan_skips_bad_files() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "one.aitool.json", &doc("one", "automation", &[], "run"));
    write(dir.path(), "nested/two.aitool.json", &doc("two", "security", &[], "scan"));
    std::fs::write(dir.path().join("broken.aitool.json"), "{ not json").unwrap();
    write(dir.path(), "missing.aitool.json", &json!({"manifest": {}}));

    let reg = aitool::load_registry(dir.path()).await.unwrap();
    assert_eq!(reg.len(), 2);
    assert!(reg.get("one").is_some());
    assert!(reg.get("two").is_some());
}

#[tokio::test]
async fn test_registry_index_loads_only_active() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "tools/live.aitool.json", &doc("live", "monitoring", &[], "watch"));
    write(dir.path(), "tools/old.aitool.json", &doc("old", "monitoring", &[], "watch"));
    write(dir.path(), "stray.aitool.json", &doc("stray", "monitoring", &[], "watch"));
    write(
        dir.path(),
        INDEX_FILE_NAME,
        &json!({
            "registry_version": "1.0.0",
            "tools": [
                {"id": "live", "name": "live", "version": "1.0.0", "category": "monitoring",
                 "aitool_file": "./tools/live.aitool.json", "status": "active"},
                {"id": "old", "name": "old", "version": "1.0.0", "category": "monitoring",
                 "aitool_file": "./tools/old.aitool.json", "status": "deprecated"},
                {"id": "gone", "name": "gone", "version": "1.0.0", "category": "monitoring",
                 "aitool_file": "./tools/gone.aitool.json", "status": "active"}
            ],
            "categories": {"monitoring": 3}
        }),
    );

    let reg = ToolRegistry::from_directory(dir.path()).await.unwrap();
    let loaded: Vec<_> = reg.iter().map(|t| t.id().to_string()).collect();
    assert_eq!(loaded, vec!["live"]);
    assert_eq!(reg.categories().get("monitoring"), Some(&1));
}

#[tokio::test]
async fn test_rebuild_index_from_directory() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "a.aitool.json", &doc("a", "automation", &[], "run"));
    write(dir.path(), "b.aitool.json", &doc("b", "automation", &[], "run"));
    write(dir.path(), "deep/c.aitool.json", &doc("c", "security", &[], "scan"));
    std::fs::write(dir.path().join("bad.aitool.json"), "[]").unwrap();

    let mut index = RegistryIndex::new();
    let count = index.rebuild_from_directory(dir.path()).await.unwrap();
    assert_eq!(count, 2);
    assert_eq!(index.categories.get("automation"), Some(&json!(2)));

    let path = dir.path().join(INDEX_FILE_NAME);
    index.save(&path).await.unwrap();
    let reloaded = RegistryIndex::load(&path).await.unwrap();
    assert_eq!(reloaded.tools, index.tools);

    let reg = ToolRegistry::load_index(&path).await.unwrap();
    assert_eq!(reg.len(), 2);
}

#[tokio::test]
async fn test_missing_directory_is_error() {
    assert!(ToolRegistry::from_directory("/definitely/not/a/dir").await.is_err());
}

#[tokio::test]
async fn test_directory_with_glob_characters_in_name() {
    let root = tempfile::tempdir().unwrap();
    let dir = root.path().join("tools[v2]");
    write(&dir, "a.aitool.json", &doc("a", "automation", &[], "run"));

    let reg = ToolRegistry::from_directory(&dir).await.unwrap();
    assert_eq!(reg.len(), 1);
}

#[tokio::test]
async fn test_index_tolerates_unknown_status_and_sparse_entries() {
    let dir = tempfile::tempdir().unwrap();
    write(dir.path(), "live.aitool.json", &doc("live", "monitoring", &[], "watch"));
    write(dir.path(), "beta.aitool.json", &doc("beta", "monitoring", &[], "watch"));
    write(
        dir.path(),
        INDEX_FILE_NAME,
        &json!({
            "registry_version": "1.0.0",
            "tools": [
                {"name": "beta", "aitool_file": "./beta.aitool.json", "status": "beta"},
                {"name": "live", "aitool_file": "./live.aitool.json", "status": "active"},
                {"status": "active"}
            ]
        }),
    );

    let reg = ToolRegistry::from_directory(dir.path()).await.unwrap();
    let loaded: Vec<_> = reg.iter().map(|t| t.id().to_string()).collect();
    assert_eq!(loaded, vec!["live"]);
}
