//! Remote office engine connection settings.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Where the office engine's remote bridge is listening.
#[derive(Debug, Clone, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Interface (host) the engine accepts bridge connections on.
    #[validate(length(min = 1))]
    pub interface: String,
    /// Port of the engine's socket acceptor.
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            interface: default_interface(),
            port: default_port(),
        }
    }
}

fn default_interface() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2002
}
