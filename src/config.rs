//! Bridge configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! is a valid configuration. CLI flags override file values.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bitmap::ImageCrateDecoder;
use crate::discovery::{DiscoveryManager, LanDiscovery, RfcommDiscovery};
use crate::printer::PrinterConfig;
use crate::service::PrinterService;
use crate::transport::StarPrntConnector;
use crate::transport::lan::DEFAULT_PORT;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address the HTTP server binds to
    pub listen_addr: String,
    /// Raw print port for LAN printers
    pub lan_port: u16,
    /// Hosts probed by LAN discovery
    pub lan_hosts: Vec<String>,
    pub probe_timeout_ms: u64,
    pub connect_timeout_ms: u64,
    /// Bound on each device step of print, status and drawer calls
    pub operation_timeout_ms: Option<u64>,
    /// Search timeout used by the CLI `search` command
    pub default_search_timeout_ms: u64,
    pub printer_width_dots: u16,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            lan_port: DEFAULT_PORT,
            lan_hosts: Vec::new(),
            probe_timeout_ms: 500,
            connect_timeout_ms: 5000,
            operation_timeout_ms: None,
            default_search_timeout_ms: 10_000,
            printer_width_dots: PrinterConfig::RECEIPT_80MM.width_dots,
        }
    }
}

impl BridgeConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn default_search_timeout(&self) -> Duration {
        Duration::from_millis(self.default_search_timeout_ms)
    }

    /// Wire up the reference transports and discovery providers.
    pub fn service(&self) -> PrinterService {
        let connector = StarPrntConnector {
            lan_port: self.lan_port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            printer: PrinterConfig::with_width_dots(self.printer_width_dots),
        };
        let discovery = DiscoveryManager::new()
            .with_provider(Arc::new(LanDiscovery::new(
                self.lan_hosts.clone(),
                self.lan_port,
                Duration::from_millis(self.probe_timeout_ms),
            )))
            .with_provider(Arc::new(RfcommDiscovery::new()));

        PrinterService::new(
            Arc::new(connector),
            Arc::new(ImageCrateDecoder),
            Arc::new(discovery),
        )
        .with_operation_timeout(self.operation_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_object_is_default() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.lan_port, 9100);
        assert_eq!(config.printer_width_dots, 576);
        assert_eq!(config.operation_timeout(), None);
    }

    #[test]
    fn test_partial_override() {
        let config: BridgeConfig = serde_json::from_str(
            r#"{"lan_hosts": ["192.168.1.50"], "operation_timeout_ms": 15000}"#,
        )
        .unwrap();
        assert_eq!(config.lan_hosts, vec!["192.168.1.50".to_string()]);
        assert_eq!(config.operation_timeout(), Some(Duration::from_secs(15)));
        assert_eq!(config.probe_timeout_ms, 500);
    }

    #[test]
    fn test_from_file_errors() {
        let missing = BridgeConfig::from_file("/nonexistent/starbridge.json").unwrap_err();
        assert!(matches!(missing, ConfigError::Io(_)));

        let path = std::env::temp_dir().join(format!("starbridge-config-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let bad = BridgeConfig::from_file(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(bad, ConfigError::Parse(_)));
    }
}
