//! MAC module implementations for `repel-core`.
//!
//! [`HmacSha256Mac`] is the module meant for real connections: a truncated
//! HMAC-SHA256 with directional keys. [`NullMac`] provides no protection at
//! all and exists purely as a test/measurement fixture.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod hmac;
mod null;

pub use hmac::{HmacKeys, HmacSha256Mac, KEY_SIZE};
pub use null::NullMac;
