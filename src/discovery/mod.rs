//! # Printer Discovery
//!
//! [`DiscoveryManager::discover`] runs every registered
//! [`DiscoveryProvider`] for the requested transport classes at once, merges
//! their reports into one de-duplicated list and returns it when the timeout
//! elapses or every provider has finished, whichever comes first.
//!
//! Providers report through a channel:
//!
//! ```text
//! provider ──Found(printer)──┐
//! provider ──Found(printer)──┼──► manager (dedupe by identifier + class)
//! provider ──Finished(class)─┘
//! ```
//!
//! ## Reference Providers
//!
//! - [`lan::LanDiscovery`]: probes configured hosts on the raw print port
//! - [`rfcomm::RfcommDiscovery`]: lists bound Bluetooth RFCOMM devices

pub mod lan;
pub mod rfcomm;

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::error::{StarbridgeError, TransportError};
use crate::transport::{PrinterDescriptor, TransportClass};

pub use lan::LanDiscovery;
pub use rfcomm::RfcommDiscovery;

/// Capacity of the shared event channel.
const EVENT_BUFFER: usize = 64;

/// A report from a running provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEvent {
    Found(PrinterDescriptor),
    /// The provider has nothing more to report.
    Finished(TransportClass),
}

/// Finds printers on one transport class.
///
/// `start_discovery` should return once the scan is running and report
/// results through `events` in the background. `stop_discovery` ends the
/// scan early; it may be called after the provider finished on its own.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DiscoveryProvider: Send + Sync {
    fn transport_class(&self) -> TransportClass;

    async fn start_discovery(
        &self,
        events: mpsc::Sender<DiscoveryEvent>,
    ) -> Result<(), TransportError>;

    async fn stop_discovery(&self) -> Result<(), TransportError>;
}

/// Runs discovery providers and collects their results.
#[derive(Default, Clone)]
pub struct DiscoveryManager {
    providers: Vec<Arc<dyn DiscoveryProvider>>,
}

impl DiscoveryManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn DiscoveryProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Scan the requested classes for up to `timeout`.
    ///
    /// Providers are started concurrently and the timeout covers their
    /// start-up too. A class is done at its first `Finished` report.
    ///
    /// Results are in first-seen order; a printer reported twice (same
    /// identifier and class) appears once.
    #[instrument(skip(self), fields(providers = self.providers.len()))]
    pub async fn discover(
        &self,
        classes: &[TransportClass],
        timeout: Duration,
    ) -> Result<Vec<PrinterDescriptor>, StarbridgeError> {
        if classes.is_empty() {
            return Err(StarbridgeError::InvalidArgument(
                "no transport classes requested".into(),
            ));
        }
        if timeout.is_zero() {
            return Ok(Vec::new());
        }

        let mut selected: Vec<Arc<dyn DiscoveryProvider>> = Vec::new();
        for class in unique(classes) {
            let matching: Vec<_> = self
                .providers
                .iter()
                .filter(|p| p.transport_class() == class)
                .cloned()
                .collect();
            if matching.is_empty() {
                warn!(class = %class, "no discovery provider for transport class, skipping");
            }
            selected.extend(matching);
        }
        if selected.is_empty() {
            return Err(StarbridgeError::DiscoveryFailed(format!(
                "no discovery provider for {}",
                classes
                    .iter()
                    .map(|c| c.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        let deadline = Instant::now() + timeout;
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);
        let mut starts = JoinSet::new();
        for (index, provider) in selected.iter().enumerate() {
            let provider = Arc::clone(provider);
            let tx = tx.clone();
            starts.spawn(async move { (index, provider.start_discovery(tx).await) });
        }
        drop(tx);

        let mut pending: HashSet<TransportClass> =
            selected.iter().map(|p| p.transport_class()).collect();
        let mut seen = HashSet::new();
        let mut printers = Vec::new();
        let mut failed: Option<usize> = None;

        let collect = async {
            let mut starting = true;
            loop {
                tokio::select! {
                    joined = starts.join_next(), if starting => match joined {
                        None => starting = false,
                        Some(Ok((_, Ok(())))) => {}
                        Some(Ok((index, Err(e)))) => {
                            failed = Some(index);
                            let class = selected[index].transport_class();
                            return Err(format!("{} discovery failed to start: {}", class, e));
                        }
                        Some(Err(e)) => return Err(format!("discovery failed to start: {}", e)),
                    },
                    event = rx.recv() => match event {
                        Some(DiscoveryEvent::Found(printer)) => {
                            if seen.insert((printer.identifier.clone(), printer.transport_class)) {
                                debug!(identifier = %printer.identifier, class = %printer.transport_class, "printer found");
                                printers.push(printer);
                            }
                        }
                        Some(DiscoveryEvent::Finished(class)) => {
                            if pending.remove(&class) {
                                debug!(class = %class, "provider finished");
                            }
                            if pending.is_empty() {
                                return Ok(());
                            }
                        }
                        None => return Ok(()),
                    },
                }
            }
        };
        let outcome = tokio::time::timeout_at(deadline, collect).await;

        starts.abort_all();
        let to_stop: Vec<_> = selected
            .iter()
            .enumerate()
            .filter(|(index, _)| Some(*index) != failed)
            .map(|(_, provider)| Arc::clone(provider))
            .collect();
        stop_all(&to_stop).await;

        match outcome {
            Ok(Err(message)) => return Err(StarbridgeError::DiscoveryFailed(message)),
            Ok(Ok(())) => {}
            Err(_) => debug!("discovery timeout elapsed"),
        }
        info!(found = printers.len(), "discovery complete");
        Ok(printers)
    }
}

fn unique(classes: &[TransportClass]) -> Vec<TransportClass> {
    let mut out = Vec::with_capacity(classes.len());
    for &class in classes {
        if !out.contains(&class) {
            out.push(class);
        }
    }
    out
}

async fn stop_all(providers: &[Arc<dyn DiscoveryProvider>]) {
    for provider in providers {
        if let Err(e) = provider.stop_discovery().await {
            warn!(class = %provider.transport_class(), error = %e, "failed to stop discovery");
        }
    }
}
