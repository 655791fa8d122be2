use refdata_common::types::Status;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub id: IdConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// 完整连接 URL；设置后忽略 `data_dir` / `sqlite_file`
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_sqlite_file")]
    pub sqlite_file: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            data_dir: default_data_dir(),
            sqlite_file: default_sqlite_file(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_url(&self) -> String {
        match self.url {
            Some(ref url) => url.clone(),
            None => {
                let path = Path::new(&self.data_dir).join(&self.sqlite_file);
                format!("sqlite://{}?mode=rwc", path.display())
            }
        }
    }

    /// Creates `data_dir` when the store lives in a local SQLite file.
    pub fn ensure_data_dir(&self) -> anyhow::Result<()> {
        if self.url.is_none() {
            std::fs::create_dir_all(&self.data_dir).map_err(|e| {
                anyhow::anyhow!("Failed to create data dir '{}': {}", self.data_dir, e)
            })?;
        }
        Ok(())
    }
}

/// Snowflake worker identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdConfig {
    #[serde(default = "default_worker_id")]
    pub machine_id: i32,
    #[serde(default = "default_worker_id")]
    pub node_id: i32,
}

impl Default for IdConfig {
    fn default() -> Self {
        Self {
            machine_id: default_worker_id(),
            node_id: default_worker_id(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl LogConfig {
    /// Default `EnvFilter` directive for this workspace's crates.
    pub fn directive(&self) -> String {
        format!("refdata={}", self.level)
    }
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_sqlite_file() -> String {
    "refdata.db".to_string()
}

fn default_worker_id() -> i32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AdminConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config '{}': {}", path, e))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config '{}': {}", path, e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let max = refdata_common::id::MAX_WORKER_ID;
        for (field, value) in [
            ("id.machine_id", self.id.machine_id),
            ("id.node_id", self.id.node_id),
        ] {
            if !(0..=max).contains(&value) {
                anyhow::bail!("{field} must be within 0..={max}, got {value}");
            }
        }
        if self.database.url.is_none() && self.database.sqlite_file.trim().is_empty() {
            anyhow::bail!("database.sqlite_file must not be empty");
        }
        if self.log.level.trim().is_empty() {
            anyhow::bail!("log.level must not be empty");
        }
        Ok(())
    }
}

// ---- Dictionary seed file types (used by `init-dictionaries` CLI subcommand) ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DictionariesSeedFile {
    #[serde(default)]
    pub dict_types: Vec<SeedDictType>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDictType {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub remark: Option<String>,
    #[serde(default)]
    pub items: Vec<SeedDictItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedDictItem {
    pub label: String,
    pub value: String,
    /// Defaults to the item's 1-based position in the seed file.
    #[serde(default)]
    pub sort_order: Option<i32>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub status: Status,
    #[serde(default)]
    pub remark: Option<String>,
}

// ---- Config seed file types (used by `init-configs` CLI subcommand) ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigsSeedFile {
    #[serde(default)]
    pub configs: Vec<SeedConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Strings are stored verbatim, any other JSON value as its JSON text.
    pub value: serde_json::Value,
    pub config_type: String,
    #[serde(default)]
    pub frontend_visible: bool,
    #[serde(default)]
    pub remark: Option<String>,
}
