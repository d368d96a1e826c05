//! Broker configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    pub host: String,
    /// TCP port for the framed broker protocol.
    pub port: u16,
    /// HTTP port for the liveness and metrics scrape endpoint.
    pub http_port: u16,
    /// Accept-time cap on concurrent client connections.
    pub max_connections: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7070,
            http_port: 8080,
            max_connections: 1000,
        }
    }
}

impl BrokerConfig {
    /// Validate configuration bounds before the server starts.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.max_connections == 0 {
            return Err("max_connections must be > 0".to_string());
        }
        Ok(())
    }
}
