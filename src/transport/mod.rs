//! # Printer Transport Layer
//!
//! The session layer talks to printers only through the [`Transport`] trait;
//! a [`Connector`] picks a transport for a [`ConnectionDescriptor`].
//!
//! ## Reference Transports
//!
//! - [`lan`]: raw TCP (port 9100)
//! - [`bluetooth`]: Bluetooth RFCOMM TTY (Linux)
//! - [`connector`]: [`StarPrntConnector`], which picks one of the above and
//!   encodes documents as StarPRNT

pub mod bluetooth;
pub mod connector;
pub mod lan;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::error::TransportError;
use crate::status::RawStatus;

pub use bluetooth::BluetoothTransport;
pub use connector::StarPrntConnector;
pub use lan::LanTransport;

/// Physical medium a printer is reached over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportClass {
    Lan,
    Bluetooth,
    BluetoothLe,
    Usb,
}

impl TransportClass {
    /// Parse a class name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "lan" => Some(Self::Lan),
            "bluetooth" => Some(Self::Bluetooth),
            "bluetoothle" => Some(Self::BluetoothLe),
            "usb" => Some(Self::Usb),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lan => "lan",
            Self::Bluetooth => "bluetooth",
            Self::BluetoothLe => "bluetoothle",
            Self::Usb => "usb",
        }
    }
}

impl std::fmt::Display for TransportClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where to find a printer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionDescriptor {
    transport_class: TransportClass,
    identifier: String,
}

impl ConnectionDescriptor {
    /// Returns `None` for an empty identifier.
    pub fn new(transport_class: TransportClass, identifier: impl Into<String>) -> Option<Self> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return None;
        }
        Some(Self {
            transport_class,
            identifier,
        })
    }

    pub fn transport_class(&self) -> TransportClass {
        self.transport_class
    }

    /// IP address / host name, Bluetooth MAC address or device path.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

impl std::fmt::Display for ConnectionDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transport_class, self.identifier)
    }
}

/// A printer found by discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterDescriptor {
    pub model: String,
    pub identifier: String,
    #[serde(rename = "interfaceType")]
    pub transport_class: TransportClass,
    pub emulation: String,
}

impl PrinterDescriptor {
    /// Descriptor to open a session on this printer.
    pub fn connection(&self) -> Option<ConnectionDescriptor> {
        ConnectionDescriptor::new(self.transport_class, self.identifier.clone())
    }
}

/// One open device connection.
///
/// A session calls `open` once, then any number of `print`/`status`, then
/// `close`. `close` may also be called after a failed step.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send {
    async fn open(&mut self) -> Result<(), TransportError>;

    async fn print(&mut self, document: &Document) -> Result<(), TransportError>;

    async fn status(&mut self) -> Result<RawStatus, TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Creates transports for connection descriptors.
#[cfg_attr(test, mockall::automock)]
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Transport>, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_class_names() {
        assert_eq!(TransportClass::from_name("LAN"), Some(TransportClass::Lan));
        assert_eq!(
            TransportClass::from_name("bluetoothLE"),
            Some(TransportClass::BluetoothLe)
        );
        assert_eq!(TransportClass::from_name("serial"), None);
    }

    #[test]
    fn test_descriptor_rejects_empty_identifier() {
        assert!(ConnectionDescriptor::new(TransportClass::Lan, "").is_none());
        assert!(ConnectionDescriptor::new(TransportClass::Lan, "  ").is_none());
        let d = ConnectionDescriptor::new(TransportClass::Lan, "10.0.0.5").unwrap();
        assert_eq!(d.to_string(), "lan:10.0.0.5");
    }

    #[test]
    fn test_printer_descriptor_json() {
        let printer = PrinterDescriptor {
            model: "Unknown".into(),
            identifier: "10.0.0.5".into(),
            transport_class: TransportClass::Lan,
            emulation: "StarPRNT".into(),
        };
        assert_eq!(
            serde_json::to_value(&printer).unwrap(),
            serde_json::json!({
                "model": "Unknown",
                "identifier": "10.0.0.5",
                "interfaceType": "lan",
                "emulation": "StarPRNT"
            })
        );
    }
}
