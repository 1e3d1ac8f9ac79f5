//! Small value types shared by module contracts and the connection engine.

/// Which direction a connection (and therefore a parser/MAC invocation) is
/// operating in.
///
/// Mirrors the two roles a retrofit library must play in a store-and-forward
/// link: the sender embeds a MAC into an outgoing packet, the receiver
/// authenticates an incoming one. A single parser or MAC implementation must
/// behave consistently in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Signing/embedding side of a connection.
    Embed,
    /// Verifying/extracting side of a connection.
    Authenticate,
}

/// Outcome of parsing a candidate packet.
///
/// A parser never rejects packets outright; it reports how much of the
/// buffer it could use (`Parsed`), how much more it needs (`Incomplete`), or
/// that it does not recognize the framing at all (`Malformed`). The
/// connection engine decides what to do with each case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The packet is `pktlen` bytes long and `embed_bits` bits of carrier
    /// capacity are available in it. `packet_has_nonce` is set when the
    /// parser itself already tracks replay protection, which disables the
    /// connection's built-in nonce scheme for this packet.
    Parsed {
        /// Length of the parsed packet in bytes.
        pktlen: usize,
        /// Number of bits that can be embedded in the parsed packet.
        embed_bits: u16,
        /// Whether the packet format carries its own nonce/sequence number.
        packet_has_nonce: bool,
    },
    /// At least `missing` more bytes are needed before the packet can be
    /// parsed.
    Incomplete {
        /// Minimum number of additional bytes required.
        missing: usize,
    },
    /// The buffer does not match the expected framing at all.
    Malformed,
}

/// Result of a single `ParseResult` evaluation as produced by a `Parser`.
///
/// This is the Rust-idiomatic reading of the C `ParseResult` struct: a
/// signed `pktlen` that doubles as an error/incompleteness signal collapses
/// into the three-way [`ParseOutcome`] above.
pub type ParseResult = ParseOutcome;

/// A nonce (number used once), carried as a plain integer.
///
/// Only the low `noncebits` bits (see [`crate::connection::ConnectionConfig`])
/// are ever transmitted; the full value is reconstructed on the receive side
/// from a sliding window centered on the last accepted nonce.
pub type Nonce = u64;

/// Masks `nonce` down to its low `bits` bits, matching the wire
/// representation carried in a packet.
#[must_use]
pub fn nonce_mask(nonce: Nonce, bits: u8) -> Nonce {
    if bits >= 64 {
        nonce
    } else {
        nonce & ((1u64 << bits) - 1)
    }
}

/// Number of bytes needed to hold `bits` bits, rounding up.
#[must_use]
pub fn ceil_bits_to_bytes(bits: u16) -> usize {
    (usize::from(bits) + 7) / 8
}

/// Minimum number of bits needed to represent `value` (0 for `value == 0`,
/// otherwise one more than the index of its highest set bit). Used to size
/// a carrier that must fit a value outright rather than a fixed MAC length.
#[must_use]
pub fn bitcount(value: u16) -> u8 {
    16 - value.leading_zeros() as u8
}
