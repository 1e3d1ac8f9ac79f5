//! Per-link connection state and the embed/authenticate engine.
//!
//! A [`Connection`] owns exactly one [`Parser`] and one [`MacModule`] and
//! the small amount of session state the protocol needs on top of them: the
//! send/receive nonce counters and a scratch buffer for extracted MAC bits.
//! It contains no protocol- or cryptography-specific logic; all of that
//! lives behind the two traits.

use tracing::{debug, trace, warn};

use crate::bitcursor::{BitCursor, BitCursorRef};
use crate::error::ConnectionError;
use crate::modules::{MacModule, MacVerdict, Parser};
use crate::types::{ceil_bits_to_bytes, Mode, ParseOutcome};

/// Per-call outcome of [`Connection::authenticate`] when the packet was
/// fully parsed (the only case that reaches MAC verification).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthResult {
    /// Bit count of the integrity protection information that was embedded
    /// or extracted.
    pub protection_level: u16,
    /// Estimated number of packets lost between this one and the last
    /// verified packet, saturating at `u16::MAX`.
    pub packet_loss: u16,
    /// Whether the connection's built-in nonce scheme embedded a nonce in
    /// this packet (false when the parser's own framing already carries
    /// replay protection).
    pub nonce_embedded: bool,
}

/// Verdict of a completed authentication attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    /// The MAC matched.
    Success(AuthResult),
    /// The MAC did not match an otherwise parseable packet.
    Failed(AuthResult),
}

/// Configuration fixed for the lifetime of a [`Connection`].
#[derive(Debug, Clone, Copy)]
pub struct ConnectionConfig {
    /// Number of nonce bits embedded alongside each MAC for nonce
    /// synchronization. Ignored for packets whose parser already reports
    /// `packet_has_nonce`.
    pub embed_nonce_bits: u8,
}

impl ConnectionConfig {
    /// Validates that `embed_nonce_bits` leaves room for shifting a full
    /// `u64` nonce mask, which the reconstruction algorithm relies on.
    ///
    /// # Panics
    ///
    /// Panics if `embed_nonce_bits` is 64 or greater.
    #[must_use]
    pub fn new(embed_nonce_bits: u8) -> Self {
        assert!(embed_nonce_bits < 64, "embed_nonce_bits must be < 64");
        Self { embed_nonce_bits }
    }
}

/// A single protected link, parameterized over its parser and MAC
/// implementations.
pub struct Connection<P, M>
where
    P: Parser,
    M: MacModule,
{
    parser: P,
    mac: M,
    config: ConnectionConfig,
    nonce_send: u64,
    nonce_recv: u64,
    extract_buf: Vec<u8>,
}

impl<P, M> Connection<P, M>
where
    P: Parser,
    M: MacModule,
{
    /// Creates a new connection with fresh (zeroed) nonce counters.
    pub fn new(parser: P, mac: M, config: ConnectionConfig) -> Self {
        let extract_buf = vec![0u8; ceil_bits_to_bytes(parser.max_embed_bits())];
        Self {
            parser,
            mac,
            config,
            nonce_send: 0,
            nonce_recv: 0,
            extract_buf,
        }
    }

    /// Installs key material for the underlying MAC module.
    pub fn set_keys(&mut self, keys: M::Keys) {
        self.mac.set_keys(keys);
    }

    /// Reports the parsed length of `packet` without embedding or
    /// authenticating anything.
    ///
    /// Exists for callers that receive packets off a byte stream and need
    /// to know how many bytes to buffer before the framing can be
    /// determined, without committing to a direction yet. Mirrors parsing
    /// in [`Mode::Embed`], since a parser's framing decisions must not
    /// depend on whether a MAC is currently present.
    #[must_use]
    pub fn peek_frame_len(&self, packet: &[u8]) -> ParseOutcome {
        self.parser.parse(packet, Mode::Embed)
    }

    /// Computes and embeds a MAC (and, unless the parser already carries
    /// one, a nonce) into `packet` in place.
    ///
    /// `packet` must be exactly the bytes of one well-formed packet; use
    /// [`Connection::peek_frame_len`] first if the boundary is not already
    /// known. Returns the number of MAC bits actually embedded.
    pub fn embed(&mut self, packet: &mut [u8]) -> Result<u16, ConnectionError> {
        let (pktlen, embed_bits, packet_has_nonce) = match self.parser.parse(packet, Mode::Embed) {
            ParseOutcome::Parsed { pktlen, embed_bits, packet_has_nonce } => {
                (pktlen, embed_bits, packet_has_nonce)
            }
            ParseOutcome::Incomplete { missing } => {
                return Err(ConnectionError::Incomplete { missing })
            }
            ParseOutcome::Malformed => return Err(ConnectionError::Malformed),
        };

        if pktlen != packet.len() {
            warn!(pktlen, buffer = packet.len(), "embed: parsed length does not match buffer");
            return Err(ConnectionError::LengthMismatch { parsed: pktlen, buffer: packet.len() });
        }
        if embed_bits == 0 {
            return Err(ConnectionError::NoCapacity);
        }

        self.parser.restore(packet, pktlen, Mode::Embed);

        let mut macbits = embed_bits;
        let mac = if packet_has_nonce {
            self.mac.sign(packet, macbits, 0, None)
        } else {
            let noncebits = u16::from(self.config.embed_nonce_bits);
            if embed_bits <= noncebits {
                return Err(ConnectionError::NoCapacity);
            }
            macbits -= noncebits;

            let netnonce = self.nonce_send.to_be_bytes();
            let mut mac = self.mac.sign(packet, macbits, noncebits, Some(netnonce));

            if noncebits > 0 {
                let mut cursor = BitCursor::new(&mut mac);
                cursor.skip(usize::from(macbits));
                cursor.push_u64(self.nonce_send, self.config.embed_nonce_bits);
            }
            trace!(nonce = self.nonce_send, "embed: nonce assigned");
            self.nonce_send = self.nonce_send.wrapping_add(1);
            mac
        };

        self.parser.embed(packet, pktlen, &mac);
        debug!(pktlen, macbits, "embed: done");
        Ok(macbits)
    }

    /// Extracts and verifies a MAC from `packet`, restoring it to its
    /// canonical protocol-conformant form in place.
    ///
    /// Returns the parsed packet length together with the verdict. On
    /// success, the parser's `verified` hook (if any) has already run and
    /// the connection's receive nonce has advanced.
    pub fn authenticate(&mut self, packet: &mut [u8]) -> Result<(usize, AuthVerdict), ConnectionError> {
        let (pktlen, mut macbits, packet_has_nonce) = match self.parser.parse(packet, Mode::Authenticate) {
            ParseOutcome::Parsed { pktlen, embed_bits, packet_has_nonce } => {
                (pktlen, embed_bits, packet_has_nonce)
            }
            ParseOutcome::Incomplete { missing } => {
                return Err(ConnectionError::Incomplete { missing })
            }
            ParseOutcome::Malformed => return Err(ConnectionError::Malformed),
        };

        self.parser.extract(packet, pktlen, &mut self.extract_buf);
        self.parser.restore(packet, pktlen, Mode::Authenticate);

        let nonce_embedded = !packet_has_nonce;
        let mut packet_loss = 0u16;
        let mut nonce = self.nonce_recv;
        let netnonce = if nonce_embedded {
            let noncebits = u16::from(self.config.embed_nonce_bits);
            if macbits <= noncebits {
                return Err(ConnectionError::NoCapacity);
            }

            if noncebits > 0 {
                macbits -= noncebits;

                let mut cursor = BitCursorRef::new(&self.extract_buf);
                cursor.skip(usize::from(macbits));
                let recvbits = cursor.pop_u64(self.config.embed_nonce_bits);

                let recv = self.nonce_recv;
                let upper = recv & (u64::MAX << self.config.embed_nonce_bits);
                nonce = recvbits | upper;
                if nonce < recv {
                    nonce = nonce.wrapping_add(1u64 << self.config.embed_nonce_bits);
                }

                let diff = nonce.wrapping_sub(recv);
                packet_loss = if diff < u64::from(u16::MAX) { diff as u16 } else { u16::MAX };
            }

            Some(nonce.to_be_bytes())
        } else {
            None
        };

        let verdict = self.mac.verify(packet, &self.extract_buf, macbits, netnonce);

        let result = match verdict {
            MacVerdict::Valid { protection_bits } => {
                if nonce_embedded {
                    self.nonce_recv = nonce.wrapping_add(1);
                }
                self.parser.verified(packet, pktlen);
                debug!(pktlen, protection_bits, packet_loss, "authenticate: verified");
                AuthVerdict::Success(AuthResult {
                    protection_level: protection_bits,
                    packet_loss,
                    nonce_embedded,
                })
            }
            MacVerdict::Invalid { attempted_bits } => {
                warn!(pktlen, attempted_bits, "authenticate: verification failed");
                AuthVerdict::Failed(AuthResult {
                    protection_level: attempted_bits,
                    packet_loss,
                    nonce_embedded,
                })
            }
        };

        Ok((pktlen, result))
    }

    /// Convenience wrapper over [`Connection::authenticate`] taking the two
    /// success/failure callbacks the original API exposed directly, for
    /// callers that prefer a dispatch style over matching on
    /// [`AuthVerdict`].
    pub fn authenticate_with<S, F>(
        &mut self,
        packet: &mut [u8],
        on_success: S,
        on_failed: F,
    ) -> Result<usize, ConnectionError>
    where
        S: FnOnce(&mut [u8], usize, AuthResult),
        F: FnOnce(&mut [u8], usize, AuthResult),
    {
        let (pktlen, verdict) = self.authenticate(packet)?;
        match verdict {
            AuthVerdict::Success(result) => on_success(packet, pktlen, result),
            AuthVerdict::Failed(result) => on_failed(packet, pktlen, result),
        }
        Ok(pktlen)
    }
}
