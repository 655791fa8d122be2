pub mod config;
pub mod config_seed;
pub mod dictionary_seed;

use refdata_storage::ReferenceStore;

use crate::config::AdminConfig;

/// Opens the store described by `config`, running migrations.
pub async fn open_store(config: &AdminConfig) -> anyhow::Result<ReferenceStore> {
    config.database.ensure_data_dir()?;
    refdata_common::id::init(config.id.machine_id, config.id.node_id);
    let store = ReferenceStore::new(&config.database.connection_url()).await?;
    Ok(store)
}
