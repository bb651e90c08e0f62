//! Dashboard server endpoint configuration.

use serde::{Deserialize, Serialize};

/// Server endpoint configuration for the realtime connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// WebSocket base URL of the parking server (e.g. `ws://localhost:8080`).
    #[serde(default = "default_ws_base_url")]
    pub ws_base_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ws_base_url: default_ws_base_url(),
        }
    }
}

fn default_ws_base_url() -> String {
    "ws://localhost:8080".to_string()
}
