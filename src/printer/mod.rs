//! # Printer Module
//!
//! Hardware geometry shared by the encoder and the reference transports.

pub mod config;

pub use config::PrinterConfig;
