//! Picks a reference transport for a connection descriptor.

use std::time::Duration;

use super::{BluetoothTransport, ConnectionDescriptor, Connector, LanTransport, Transport, TransportClass};
use crate::error::TransportError;
use crate::printer::PrinterConfig;

/// Connector for StarPRNT printers over LAN and Bluetooth RFCOMM.
#[derive(Debug, Clone)]
pub struct StarPrntConnector {
    pub lan_port: u16,
    pub connect_timeout: Duration,
    pub printer: PrinterConfig,
}

impl Default for StarPrntConnector {
    fn default() -> Self {
        Self {
            lan_port: super::lan::DEFAULT_PORT,
            connect_timeout: Duration::from_secs(5),
            printer: PrinterConfig::default(),
        }
    }
}

impl Connector for StarPrntConnector {
    fn connect(
        &self,
        descriptor: &ConnectionDescriptor,
    ) -> Result<Box<dyn Transport>, TransportError> {
        match descriptor.transport_class() {
            TransportClass::Lan => Ok(Box::new(
                LanTransport::new(descriptor.identifier(), self.lan_port, self.printer)
                    .with_connect_timeout(self.connect_timeout),
            )),
            TransportClass::Bluetooth => Ok(Box::new(BluetoothTransport::new(
                descriptor.identifier(),
                self.printer,
            ))),
            class @ (TransportClass::BluetoothLe | TransportClass::Usb) => Err(
                TransportError::Unsupported(format!("no {} transport available", class)),
            ),
        }
    }
}
