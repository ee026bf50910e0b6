//! Server state shared across handlers.

use std::sync::Arc;

use crate::service::PrinterService;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<PrinterService>,
}

impl AppState {
    pub fn new(service: Arc<PrinterService>) -> Self {
        Self { service }
    }
}
