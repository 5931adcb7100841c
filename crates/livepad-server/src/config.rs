//! Configuration loaded from environment variables
//!
//! Every field maps to the upper-cased variable of the same name
//! (`port` reads `PORT`). A `.env` file in the working directory is
//! loaded first; variables already set in the environment win.
//!
//! ```text
//! PORT=3000
//! HOST=0.0.0.0
//! PUBLIC_DIR=public
//! HEARTBEAT_INTERVAL_SECS=25
//! HEARTBEAT_TIMEOUT_SECS=20
//! BROADCAST_CAPACITY=1024
//! ```

use crate::error::ServerError;
use livepad_ws::WsHeartbeatConfig;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served as static assets
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    /// Seconds between WebSocket pings; `0` disables the heartbeat
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_secs: u64,
    /// Seconds a client may stay silent past a ping
    #[serde(default = "default_heartbeat_timeout")]
    pub heartbeat_timeout_secs: u64,
    /// Messages buffered per client before it starts missing broadcasts
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_heartbeat_interval() -> u64 {
    25
}

fn default_heartbeat_timeout() -> u64 {
    20
}

fn default_broadcast_capacity() -> usize {
    1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
            heartbeat_interval_secs: default_heartbeat_interval(),
            heartbeat_timeout_secs: default_heartbeat_timeout(),
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

impl ServerConfig {
    /// Load `.env`, then read the configuration from the environment
    pub fn from_env() -> Result<Self, ServerError> {
        load_dotenv();
        envy::from_env::<Self>().map_err(ServerError::from)
    }

    /// Read the configuration from explicit key/value pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        envy::from_iter::<_, Self>(vars).map_err(ServerError::from)
    }

    /// Set the bind host
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the port
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set the static asset directory
    pub fn public_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.public_dir = dir.into();
        self
    }

    /// Socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|_| ServerError::InvalidHost(self.host.clone()))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Heartbeat settings, or `None` when disabled
    pub fn heartbeat(&self) -> Option<WsHeartbeatConfig> {
        (self.heartbeat_interval_secs > 0).then(|| {
            WsHeartbeatConfig::new()
                .interval(Duration::from_secs(self.heartbeat_interval_secs))
                .timeout(Duration::from_secs(self.heartbeat_timeout_secs))
        })
    }
}

/// Load environment variables from a `.env` file, if there is one
///
/// Existing environment variables take precedence over `.env` values.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = ServerConfig::from_vars(Vec::new()).unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.public_dir, PathBuf::from("public"));
        assert_eq!(
            config.socket_addr().unwrap(),
            "0.0.0.0:3000".parse::<SocketAddr>().unwrap()
        );
    }

    #[test]
    fn test_port_and_dir_from_vars() {
        let config = ServerConfig::from_vars(vars(&[
            ("PORT", "8080"),
            ("HOST", "127.0.0.1"),
            ("PUBLIC_DIR", "/srv/livepad"),
        ]))
        .unwrap();

        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(config.public_dir, PathBuf::from("/srv/livepad"));
    }

    #[test]
    fn test_invalid_port_is_a_config_error() {
        let err = ServerConfig::from_vars(vars(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn test_invalid_host() {
        let config = ServerConfig::default().host("localhost:3000");
        assert!(matches!(
            config.socket_addr(),
            Err(ServerError::InvalidHost(_))
        ));
    }

    #[test]
    fn test_zero_interval_disables_heartbeat() {
        let config = ServerConfig::from_vars(vars(&[("HEARTBEAT_INTERVAL_SECS", "0")])).unwrap();
        assert!(config.heartbeat().is_none());

        let heartbeat = ServerConfig::default().heartbeat().unwrap();
        assert_eq!(heartbeat.deadline(), Duration::from_secs(45));
    }
}
