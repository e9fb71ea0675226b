use crate::relay::{Relay, RoomRegistry};
use crate::ws::connections::ConnectionManager;
use serde::Deserialize;
use std::sync::Arc;

pub const DEFAULT_FRONTEND_ORIGIN: &str = "http://localhost:5173";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_host: String,
    pub port: u16,
    /// Origin allowed to open the signaling WebSocket; `*` accepts any
    pub frontend_origin: String,
    /// Drop a room once nobody is joined, registered or sharing in it
    pub evict_empty_rooms: bool,
}

impl Config {
    /// Built-in defaults overridden by environment variables (`PORT`,
    /// `FRONTEND_ORIGIN`, ...). A `.env` file is picked up by `main` beforehand.
    pub fn load() -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .set_default("bind_host", "0.0.0.0")?
            .set_default("port", 4000)?
            .set_default("frontend_origin", DEFAULT_FRONTEND_ORIGIN)?
            .set_default("evict_empty_rooms", true)?
            .add_source(config::Environment::default())
            .build()?;

        let config: Config = settings.try_deserialize()?;
        if config.frontend_origin == "*" {
            tracing::warn!("FRONTEND_ORIGIN is *, accepting signaling connections from any origin");
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_host, self.port)
    }

    pub fn allows_origin(&self, origin: &str) -> bool {
        self.frontend_origin == "*" || self.frontend_origin.trim_end_matches('/') == origin
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: 4000,
            frontend_origin: DEFAULT_FRONTEND_ORIGIN.to_string(),
            evict_empty_rooms: true,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub connections: Arc<ConnectionManager>,
    pub relay: Arc<Relay>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let connections = Arc::new(ConnectionManager::new());
        let registry = RoomRegistry::new(config.evict_empty_rooms);
        let relay = Arc::new(Relay::new(registry, connections.clone()));

        Self {
            config,
            connections,
            relay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.bind_address(), "0.0.0.0:4000");
        assert!(config.evict_empty_rooms);
    }

    #[test]
    fn test_origin_check() {
        let mut config = Config::default();
        assert!(config.allows_origin("http://localhost:5173"));
        assert!(!config.allows_origin("http://evil.example"));

        config.frontend_origin = "https://kids.example/".to_string();
        assert!(config.allows_origin("https://kids.example"));

        config.frontend_origin = "*".to_string();
        assert!(config.allows_origin("http://evil.example"));
    }
}
