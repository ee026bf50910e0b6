//! Bluetooth discovery from the host's RFCOMM bindings.
//!
//! Only printers that are already paired and bound (`rfcomm bind`) are
//! found; there is no radio inquiry.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use super::{DiscoveryEvent, DiscoveryProvider};
use crate::error::TransportError;
use crate::transport::bluetooth::{RfcommBinding, list_rfcomm_bindings};
use crate::transport::{PrinterDescriptor, TransportClass};

#[derive(Default)]
pub struct RfcommDiscovery {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl RfcommDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    fn replace_task(&self, task: Option<JoinHandle<()>>) {
        let previous = match self.task.lock() {
            Ok(mut guard) => std::mem::replace(&mut *guard, task),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), task),
        };
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

fn descriptor(binding: RfcommBinding) -> PrinterDescriptor {
    PrinterDescriptor {
        model: "Unknown".into(),
        identifier: binding.mac,
        transport_class: TransportClass::Bluetooth,
        emulation: "StarPRNT".into(),
    }
}

#[async_trait]
impl DiscoveryProvider for RfcommDiscovery {
    fn transport_class(&self) -> TransportClass {
        TransportClass::Bluetooth
    }

    async fn start_discovery(
        &self,
        events: mpsc::Sender<DiscoveryEvent>,
    ) -> Result<(), TransportError> {
        let bindings = tokio::task::spawn_blocking(list_rfcomm_bindings).await??;
        info!(bound = bindings.len(), "RFCOMM discovery started");

        let task = tokio::spawn(async move {
            for binding in bindings {
                if events
                    .send(DiscoveryEvent::Found(descriptor(binding)))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            let _ = events
                .send(DiscoveryEvent::Finished(TransportClass::Bluetooth))
                .await;
        });
        self.replace_task(Some(task));
        Ok(())
    }

    async fn stop_discovery(&self) -> Result<(), TransportError> {
        self.replace_task(None);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_from_binding() {
        let printer = descriptor(RfcommBinding {
            device: "/dev/rfcomm0".into(),
            mac: "00:11:62:AA:BB:CC".into(),
        });
        assert_eq!(printer.identifier, "00:11:62:AA:BB:CC");
        assert_eq!(printer.transport_class, TransportClass::Bluetooth);
        assert_eq!(printer.emulation, "StarPRNT");
    }
}
