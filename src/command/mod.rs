//! # Command Model
//!
//! The closed set of print primitives ([`Command`]) and the validating parse
//! step that turns the loosely-typed JSON command maps of the RPC surface into
//! them.

pub mod parse;
pub mod types;

pub use parse::{ParseOutcome, SkipReason, parse_command, parse_commands};
pub use types::*;
