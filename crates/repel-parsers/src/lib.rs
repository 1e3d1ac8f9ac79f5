//! Bundled [`repel_core::Parser`] implementations.
//!
//! [`ModbusTcpParser`] is the protocol-aware implementation this crate
//! exists for; [`FakeParser`] and [`SplitParser`] are test fixtures used to
//! exercise the connection engine and MAC modules without a real protocol's
//! framing rules.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod fake;
mod modbus;
mod split;

pub use fake::FakeParser;
pub use modbus::{ModbusTcpConfig, ModbusTcpParser};
pub use split::{SplitAlignment, SplitParser};
