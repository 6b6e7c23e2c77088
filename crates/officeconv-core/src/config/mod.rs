//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every section falls back to its defaults when absent.

pub mod bridge;
pub mod conversion;
pub mod logging;

use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::bridge::BridgeConfig;
use self::conversion::ConversionConfig;
use self::logging::LoggingConfig;

use crate::error::AppError;
use crate::result::AppResult;

/// Prefix for environment variable overrides (`OFFICECONV__BRIDGE__PORT=2003`).
pub const ENV_PREFIX: &str = "OFFICECONV";

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// (default.toml + environment overlay + `OFFICECONV__*` variables).
#[derive(Debug, Clone, Default, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Remote office engine connection settings.
    #[validate(nested)]
    pub bridge: BridgeConfig,
    /// Conversion pipeline settings.
    #[validate(nested)]
    pub conversion: ConversionConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the `config/` directory.
    pub fn load(env: &str) -> AppResult<Self> {
        Self::load_from(Path::new("config"), env)
    }

    /// Load configuration from TOML files in `dir`.
    ///
    /// Merges `<dir>/default` with the `<dir>/<env>` overlay and environment
    /// variables prefixed with `OFFICECONV__`. Missing files are not an error.
    pub fn load_from(dir: &Path, env: &str) -> AppResult<Self> {
        let default_path = dir.join("default");
        let env_path = dir.join(env);

        let config = config::Config::builder()
            .add_source(config::File::from(default_path).required(false))
            .add_source(config::File::from(env_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        parsed.validate()?;
        Ok(parsed)
    }
}
