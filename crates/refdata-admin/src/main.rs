use anyhow::Result;
use tracing_subscriber::EnvFilter;

use refdata_admin::config::AdminConfig;
use refdata_admin::{config_seed, dictionary_seed, open_store};

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  refdata-admin migrate <config.toml>                           Create or upgrade the schema");
    eprintln!("  refdata-admin init-dictionaries <config.toml> [seed.json]     Initialize dictionaries (built-in defaults when seed omitted)");
    eprintln!("  refdata-admin init-configs <config.toml> <seed.json>          Initialize/update configs from seed file");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("migrate") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("migrate requires <config.toml> argument")
            })?;
            run_migrate(config_path).await
        }
        Some("init-dictionaries") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-dictionaries requires <config.toml> argument")
            })?;
            run_init_dictionaries(config_path, args.get(3).map(String::as_str)).await
        }
        Some("init-configs") => {
            let config_path = args.get(2).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-configs requires <config.toml> and <seed.json> arguments")
            })?;
            let seed_path = args.get(3).ok_or_else(|| {
                print_usage();
                anyhow::anyhow!("init-configs requires <seed.json> argument")
            })?;
            run_init_configs(config_path, seed_path).await
        }
        Some("-h") | Some("--help") | None => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            Err(anyhow::anyhow!("unknown command '{other}'"))
        }
    }
}

/// Loads the config and installs the global subscriber. `RUST_LOG` directives
/// are combined with the config's `log.level`.
fn load_config(config_path: &str) -> Result<AdminConfig> {
    let config = AdminConfig::load(config_path)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(config.log.directive().parse()?))
        .init();
    Ok(config)
}

async fn run_migrate(config_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    store.close().await?;
    tracing::info!("migrate completed");
    Ok(())
}

/// Initialize dictionaries.
/// - With `seed_path`: import dictionaries from JSON seed file
/// - Without `seed_path`: install built-in dictionaries
async fn run_init_dictionaries(config_path: &str, seed_path: Option<&str>) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    if let Some(path) = seed_path {
        dictionary_seed::init_from_seed_file(&store, path).await?;
    } else {
        dictionary_seed::init_default_dictionaries(&store).await?;
    }
    Ok(())
}

/// Initialize configs from a JSON seed file. Existing keys are overwritten.
async fn run_init_configs(config_path: &str, seed_path: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let store = open_store(&config).await?;
    config_seed::init_from_seed_file(&store, seed_path).await?;
    Ok(())
}
