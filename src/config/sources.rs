use super::models::Settings;
use config::{ConfigError, Environment, File};
use std::env;
use std::path::PathBuf;

const CONFIG_ENV_VAR: &str = "FILEFETCH_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/filefetch.toml";
const ENV_PREFIX: &str = "FILEFETCH";
const ENV_SEPARATOR: &str = "__";

/// Load settings, later layers winning: struct defaults, the TOML file at
/// `FILEFETCH_CONFIG` (or `config/filefetch.toml`), then `FILEFETCH__*`
/// variables from `.env` or the process environment.
pub fn load() -> Result<Settings, ConfigError> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let config_path = env::var(CONFIG_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_from_sources(config_path)
}

/// Load settings from a specific path and the environment
pub fn load_from_sources(config_path: PathBuf) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder();

    if config_path.exists() {
        tracing::info!("Loading settings from: {}", config_path.display());
        builder = builder.add_source(File::from(config_path).required(false));
    } else {
        tracing::debug!(
            "Settings file not found at {}, using defaults and environment overrides",
            config_path.display()
        );
    }

    // FILEFETCH__TRANSFER__CHUNK_SIZE -> transfer.chunk_size
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator(ENV_SEPARATOR)
            .try_parsing(true),
    );

    let config = builder.build()?;
    config.try_deserialize()
}
