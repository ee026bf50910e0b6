//! LAN discovery by probing a configured list of hosts on the raw print port.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, instrument};

use super::{DiscoveryEvent, DiscoveryProvider};
use crate::error::TransportError;
use crate::transport::lan::socket_addr;
use crate::transport::{PrinterDescriptor, TransportClass};

/// Probes each configured host with a TCP connect. Every host that accepts
/// the connection is reported as a StarPRNT printer.
pub struct LanDiscovery {
    hosts: Vec<String>,
    port: u16,
    probe_timeout: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl LanDiscovery {
    pub fn new(hosts: Vec<String>, port: u16, probe_timeout: Duration) -> Self {
        Self {
            hosts,
            port,
            probe_timeout,
            task: Mutex::new(None),
        }
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

/// Whether `addr` accepts a TCP connection within `timeout`.
#[instrument(skip(timeout))]
pub async fn probe(addr: &str, timeout: Duration) -> bool {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!(error = %e, "host refused");
            false
        }
        Err(_) => {
            debug!("probe timeout");
            false
        }
    }
}

#[async_trait]
impl DiscoveryProvider for LanDiscovery {
    fn transport_class(&self) -> TransportClass {
        TransportClass::Lan
    }

    async fn start_discovery(
        &self,
        events: mpsc::Sender<DiscoveryEvent>,
    ) -> Result<(), TransportError> {
        let hosts = self.hosts.clone();
        let port = self.port;
        let probe_timeout = self.probe_timeout;
        info!(hosts = hosts.len(), port, "LAN discovery started");

        let task = tokio::spawn(async move {
            let mut probes = JoinSet::new();
            for host in hosts {
                let addr = socket_addr(&host, port);
                probes.spawn(async move { (host, probe(&addr, probe_timeout).await) });
            }
            while let Some(result) = probes.join_next().await {
                if let Ok((host, true)) = result {
                    let printer = PrinterDescriptor {
                        model: "Unknown".into(),
                        identifier: host,
                        transport_class: TransportClass::Lan,
                        emulation: "StarPRNT".into(),
                    };
                    if events.send(DiscoveryEvent::Found(printer)).await.is_err() {
                        return;
                    }
                }
            }
            let _ = events.send(DiscoveryEvent::Finished(TransportClass::Lan)).await;
        });
        self.replace_task(Some(task));
        Ok(())
    }

    async fn stop_discovery(&self) -> Result<(), TransportError> {
        self.replace_task(None);
        Ok(())
    }
}
