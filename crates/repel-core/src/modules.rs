//! Parser and MAC module contracts.
//!
//! These traits are the Rust rendering of the pluggable function-pointer
//! tables the protocol is built around: a [`Parser`] knows how to locate a
//! protocol's carrier bits inside a packet, and a [`MacModule`] knows how to
//! sign and verify arbitrary byte strings. The connection engine in
//! [`crate::connection`] is generic over both and contains no protocol- or
//! cryptography-specific code itself.

use crate::bitcursor::{BitCursor, BitCursorRef};
use crate::types::{Mode, ParseResult};

/// A signature produced by a [`MacModule`], sized to the request.
///
/// Implementations are free to compute a longer digest internally and
/// truncate, but the returned buffer is always exactly
/// `ceil_bits_to_bytes(macbits + extrabits)` bytes.
pub type MacBuffer = Vec<u8>;

/// Verification outcome reported by [`MacModule::verify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacVerdict {
    /// The MAC checked out; carries the protection level in bits, which is
    /// usually just the number of MAC bits that were compared but may be
    /// lower when trailing odd bits had to be masked out.
    Valid {
        /// Effective protection level in bits.
        protection_bits: u16,
    },
    /// The MAC did not match. Carries the protection level that was
    /// attempted, which callers still report alongside the failure.
    Invalid {
        /// Protection level that was attempted.
        attempted_bits: u16,
    },
}

/// Pluggable authentication primitive.
///
/// A connection holds exactly one `MacModule` and calls `sign` when
/// embedding and `verify` when authenticating. Key material is opaque to the
/// connection engine; its shape (single key, send/receive pair, ...) is a
/// contract between the application and the chosen module.
pub trait MacModule {
    /// Opaque key material, e.g. a fixed-size byte array or a send/receive
    /// key pair.
    type Keys;

    /// Installs key material for this connection.
    fn set_keys(&mut self, keys: Self::Keys);

    /// Signs `packet` (and, if present, `nonce`), returning a buffer of
    /// `ceil_bits_to_bytes(macbits + extrabits)` bytes: the first `macbits`
    /// bits are the signature, anything past that is implementation-defined
    /// padding the caller may embed alongside it.
    ///
    /// `nonce`, when present, is already in network byte order; the
    /// connection engine performs the conversion so modules never need to
    /// think about host endianness.
    fn sign(&self, packet: &[u8], macbits: u16, extrabits: u16, nonce: Option<[u8; 8]>) -> MacBuffer;

    /// Verifies a MAC of `bits` bits extracted from a packet against a
    /// freshly computed signature of the restored packet.
    fn verify(&self, packet: &[u8], mac: &[u8], bits: u16, nonce: Option<[u8; 8]>) -> MacVerdict;
}

/// Pluggable packet-framing primitive.
///
/// A connection holds exactly one `Parser` and uses it to locate carrier
/// bits inside a wire packet. Implementations must treat `parse` as a pure
/// function of the packet bytes: it has to return the same result whether or
/// not a MAC is currently embedded, since the connection calls it before it
/// knows which case it is in.
pub trait Parser {
    /// Upper bound on the number of bits this parser can ever report from
    /// [`Parser::parse`], used to size MAC and scratch buffers up front.
    fn max_embed_bits(&self) -> u16;

    /// Determines the packet's length and embeddable carrier capacity.
    ///
    /// Must not mutate `packet` through any side channel and must ignore
    /// carrier regions when computing framing fields (length, checksums)
    /// so the result is identical whether or not a MAC is present.
    fn parse(&self, packet: &[u8], mode: Mode) -> ParseResult;

    /// Writes `mac` into the carrier region of `packet` identified by the
    /// preceding `parse` call.
    fn embed(&mut self, packet: &mut [u8], pktlen: usize, mac: &[u8]);

    /// Reads the carrier region of `packet` into `mac`. `mac` is at least
    /// `ceil_bits_to_bytes(max_embed_bits())` bytes.
    fn extract(&mut self, packet: &[u8], pktlen: usize, mac: &mut [u8]);

    /// Canonicalizes `packet` in place: erases embedded MAC bits and any
    /// other state that must not influence the signature, so the result
    /// does not depend on whether a MAC was embedded previously. Called
    /// before computing a MAC for comparison, on both the embed and
    /// authenticate side.
    fn restore(&mut self, packet: &mut [u8], pktlen: usize, mode: Mode);

    /// Runs once, only on the authenticate side, only after the MAC module
    /// has confirmed the packet is genuine. Complements `restore` for
    /// parsers that need post-verification state changes they could not
    /// safely make before verification (for example, undoing a
    /// transaction-id remap that the peer never applied).
    ///
    /// The default implementation does nothing, matching the optional
    /// (nullable) `verified` entry in the original module table.
    fn verified(&mut self, _packet: &mut [u8], _pktlen: usize) {}
}

/// Convenience constructor for a read-write cursor over a packet buffer,
/// used throughout parser implementations.
#[must_use]
pub fn packet_cursor(packet: &mut [u8]) -> BitCursor<'_> {
    BitCursor::new(packet)
}

/// Convenience constructor for a read-only cursor over a packet buffer.
#[must_use]
pub fn packet_cursor_ref(packet: &[u8]) -> BitCursorRef<'_> {
    BitCursorRef::new(packet)
}
