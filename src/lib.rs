//! # starbridge - Star Receipt Printer Bridge
//!
//! starbridge drives Star Micronics receipt printers: it discovers devices,
//! turns loosely-typed JSON print commands into a styled document, and runs
//! that document through a single-use session over LAN or Bluetooth.
//!
//! ## Quick Start
//!
//! ```no_run
//! use serde_json::json;
//! use starbridge::{config::BridgeConfig, transport::{ConnectionDescriptor, TransportClass}};
//!
//! # async fn example() -> Result<(), starbridge::StarbridgeError> {
//! let service = BridgeConfig::default().service();
//! let printer = ConnectionDescriptor::new(TransportClass::Lan, "192.168.1.50").unwrap();
//!
//! service
//!     .print_commands(&printer, &[
//!         json!({"setAlignment": "center"}),
//!         json!({"appendTextMagnified": "THANK YOU\n", "width": 2, "height": 2}),
//!         json!({"appendQrCode": "https://example.com"}),
//!         json!({"appendCutPaper": "partialCut"}),
//!     ])
//!     .await?;
//!
//! println!("{:?}", service.get_status(&printer).await?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`command`] | Print commands and JSON command parsing |
//! | [`document`] | Commands → styled render instructions |
//! | [`protocol`] | StarPRNT byte encoder |
//! | [`session`] | Open → execute → close state machine |
//! | [`transport`] | LAN and Bluetooth transports |
//! | [`discovery`] | Printer discovery |
//! | [`service`] | Public operations and RPC dispatch |
//! | [`server`] | HTTP RPC surface |
//! | [`error`] | Error types |

pub mod bitmap;
pub mod command;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod printer;
pub mod protocol;
pub mod server;
pub mod service;
pub mod session;
pub mod status;
pub mod transport;

// Re-exports for convenience
pub use error::StarbridgeError;
pub use printer::PrinterConfig;
pub use service::PrinterService;
