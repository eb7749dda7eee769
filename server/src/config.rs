//! Server configuration: bind address and log filter, overridable by
//! environment variables or CLI flags. Scaled-down analogue of the
//! layered env/file config a larger trading system would carry.

use std::net::SocketAddr;

const DEFAULT_BIND: &str = "0.0.0.0:12345";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub log_filter: String,
}

impl ServerConfig {
    /// Reads `EXCHANGE_BIND`/`EXCHANGE_LOG` from the environment, falling
    /// back to sane defaults. CLI flags (see `main.rs`) take precedence
    /// over both.
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = std::env::var("EXCHANGE_BIND").unwrap_or_else(|_| DEFAULT_BIND.to_string());
        let log_filter = std::env::var("EXCHANGE_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());
        Ok(Self {
            bind_addr: bind_addr.parse()?,
            log_filter,
        })
    }
}
