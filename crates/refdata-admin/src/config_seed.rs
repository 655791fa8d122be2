use refdata_common::types::{ConfigType, UpsertConfigRequest};
use refdata_storage::{ErrorKind, ReferenceStore};
use serde_json::Value;

use crate::config::{ConfigsSeedFile, SeedConfig};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigSeedReport {
    pub created: usize,
    pub updated: usize,
    pub invalid: usize,
}

/// Upserts every config of a JSON seed file.
pub async fn init_from_seed_file(
    store: &ReferenceStore,
    seed_path: &str,
) -> anyhow::Result<ConfigSeedReport> {
    let seed_content = std::fs::read_to_string(seed_path)
        .map_err(|e| anyhow::anyhow!("Failed to read seed file '{}': {}", seed_path, e))?;
    let seed: ConfigsSeedFile = serde_json::from_str(&seed_content)
        .map_err(|e| anyhow::anyhow!("Failed to parse seed file '{}': {}", seed_path, e))?;

    let report = apply_seed(store, &seed.configs).await?;
    tracing::info!(
        created = report.created,
        updated = report.updated,
        invalid = report.invalid,
        "init-configs completed"
    );
    Ok(report)
}

/// Upserts each seed entry. Entries the store rejects (unknown type, value
/// not matching its type, empty key) are logged and counted; store failures
/// abort the run.
pub async fn apply_seed(
    store: &ReferenceStore,
    configs: &[SeedConfig],
) -> anyhow::Result<ConfigSeedReport> {
    let mut report = ConfigSeedReport::default();

    for sc in configs {
        let config_type: ConfigType = match sc.config_type.parse() {
            Ok(t) => t,
            Err(e) => {
                tracing::error!(key = %sc.key, error = %e, "Skipping config with unknown type");
                report.invalid += 1;
                continue;
            }
        };

        let existed = store.get_config(&sc.key).await?.is_some();
        let req = UpsertConfigRequest {
            key: sc.key.clone(),
            value: value_text(&sc.value),
            config_type,
            is_frontend_visible: sc.frontend_visible,
            remark: sc.remark.clone(),
            name: sc.name.clone(),
        };

        match store.upsert_config(&req).await {
            Ok(_) if existed => report.updated += 1,
            Ok(_) => report.created += 1,
            Err(e) if e.kind() == ErrorKind::Validation => {
                tracing::error!(key = %sc.key, error = %e, "Skipping invalid config");
                report.invalid += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(report)
}

/// Text stored for a seed value: strings verbatim, everything else as JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
