//! Core engine for retrofitting integrity and replay protection onto
//! protocols that were never designed to carry either.
//!
//! The crate is deliberately sans-I/O: a [`connection::Connection`] only
//! ever sees byte buffers the caller already owns. It does not open
//! sockets, does not run an async runtime, and does not know what carries
//! its packets; callers wire it to whatever transport they have. Three
//! pieces compose a connection:
//!
//! - [`bitcursor`] — an unaligned, bit-granularity cursor used by every
//!   parser to read and write carrier regions that rarely land on byte
//!   boundaries.
//! - [`modules`] — the [`modules::Parser`] and [`modules::MacModule`]
//!   traits a connection is generic over. Parsers understand one wire
//!   format's framing; MAC modules understand one signature scheme. Neither
//!   knows about the other.
//! - [`connection`] — the engine itself: parses a packet, canonicalizes it,
//!   signs or verifies it, and manages the nonce window that detects lost
//!   or replayed packets.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod bitcursor;
pub mod connection;
pub mod error;
pub mod modules;
pub mod types;

pub use bitcursor::{BitCursor, BitCursorRef};
pub use connection::{AuthResult, AuthVerdict, Connection, ConnectionConfig};
pub use error::ConnectionError;
pub use modules::{MacModule, MacVerdict, Parser};
pub use types::{bitcount, ceil_bits_to_bytes, nonce_mask, Mode, ParseOutcome, ParseResult};
