//! HTTP server configuration from TOML (`[server]` section)

use crate::config::issue::{ConfigIssue, ConfigIssueCode};
use mplp_domain::core::validation::Severity;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// Raw server configuration from TOML
///
/// ```toml
/// [server]
/// bind = "0.0.0.0:8080"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileServerConfig {
    pub bind: String,
}

impl Default for FileServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

impl FileServerConfig {
    pub fn parse_bind(&self) -> (SocketAddr, Vec<ConfigIssue>) {
        match self.bind.parse::<SocketAddr>() {
            Ok(addr) => (addr, vec![]),
            Err(_) => {
                let fallback = default_bind();
                let issue = ConfigIssue {
                    severity: Severity::Error,
                    code: ConfigIssueCode::InvalidAddress {
                        field: "server.bind".to_string(),
                        value: self.bind.clone(),
                    },
                    message: format!(
                        "server.bind: '{}' is not a socket address, using '{}'",
                        self.bind, fallback
                    ),
                };
                (fallback, vec![issue])
            }
        }
    }
}

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}
