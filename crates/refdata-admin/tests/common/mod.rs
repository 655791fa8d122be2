#![allow(dead_code)]

use anyhow::Result;
use refdata_admin::config::AdminConfig;
use refdata_storage::ReferenceStore;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestContext {
    pub temp_dir: TempDir,
    pub config: AdminConfig,
    pub store: ReferenceStore,
}

/// Writes a config pointing at a fresh data dir, loads it back and opens the store.
pub async fn build_test_context() -> Result<TestContext> {
    let temp_dir = tempfile::tempdir()?;
    let data_dir = temp_dir.path().join("data");
    let config_path = write_file(
        &temp_dir,
        "refdata.toml",
        &format!(
            "[database]\ndata_dir = \"{}\"\n\n[id]\nmachine_id = 1\nnode_id = 1\n",
            data_dir.display()
        ),
    )?;

    let config = AdminConfig::load(&config_path.display().to_string())?;
    let store = refdata_admin::open_store(&config).await?;
    Ok(TestContext {
        temp_dir,
        config,
        store,
    })
}

pub fn write_file(dir: &TempDir, name: &str, contents: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}
