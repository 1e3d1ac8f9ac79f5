//! Test parser that treats the entire buffer as carrier.
//!
//! Overwrites the leading bytes of any buffer with up to 256 MAC bits. Used
//! to exercise the connection engine and MAC modules without needing a real
//! protocol's framing rules; never appropriate for a live link since it
//! does not preserve any application payload.

use repel_core::{ceil_bits_to_bytes, BitCursor, BitCursorRef, Mode, Parser, ParseResult, ParseOutcome};

/// Upper bound on embeddable bits, matching the widest MAC the bundled MAC
/// modules are ever asked to produce.
const MAX_MAC_BITS: u16 = 256;

/// Parser that claims the first `min(buflen * 8, 256)` bits of any buffer
/// as carrier.
#[derive(Debug, Default, Clone, Copy)]
pub struct FakeParser;

impl FakeParser {
    fn carrier_bits(buflen: usize) -> u16 {
        let bits = (buflen as u64) * 8;
        if bits < u64::from(MAX_MAC_BITS) {
            bits as u16
        } else {
            MAX_MAC_BITS
        }
    }
}

impl Parser for FakeParser {
    fn max_embed_bits(&self) -> u16 {
        MAX_MAC_BITS
    }

    fn parse(&self, packet: &[u8], _mode: Mode) -> ParseResult {
        ParseOutcome::Parsed {
            pktlen: packet.len(),
            embed_bits: Self::carrier_bits(packet.len()),
            packet_has_nonce: false,
        }
    }

    fn embed(&mut self, packet: &mut [u8], pktlen: usize, mac: &[u8]) {
        let bits = Self::carrier_bits(pktlen);
        let mut dst = BitCursor::new(packet);
        let mut src = BitCursorRef::new(mac);
        dst.copy_wide(&mut src, bits);
    }

    fn extract(&mut self, packet: &[u8], pktlen: usize, mac: &mut [u8]) {
        let bits = Self::carrier_bits(pktlen);
        let mut dst = BitCursor::new(mac);
        let mut src = BitCursorRef::new(packet);
        dst.copy_wide(&mut src, bits);
    }

    fn restore(&mut self, packet: &mut [u8], pktlen: usize, _mode: Mode) {
        let n = pktlen.min(ceil_bits_to_bytes(MAX_MAC_BITS));
        packet[..n].fill(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_extract_round_trips() {
        let mut parser = FakeParser;
        let mut packet = vec![0u8; 40];
        let mac = vec![0xabu8; ceil_bits_to_bytes(MAX_MAC_BITS)];

        parser.embed(&mut packet, packet.len(), &mac);

        let mut extracted = vec![0u8; ceil_bits_to_bytes(MAX_MAC_BITS)];
        parser.extract(&packet, packet.len(), &mut extracted);
        assert_eq!(extracted, mac);
    }

    #[test]
    fn short_packet_caps_carrier_at_buffer_size() {
        let parser = FakeParser;
        let ParseOutcome::Parsed { embed_bits, .. } = parser.parse(&[0u8; 4], Mode::Embed) else {
            panic!("expected Parsed");
        };
        assert_eq!(embed_bits, 32);
    }

    #[test]
    fn long_packet_caps_carrier_at_max_mac_bits() {
        let parser = FakeParser;
        let ParseOutcome::Parsed { embed_bits, .. } = parser.parse(&[0u8; 64], Mode::Embed) else {
            panic!("expected Parsed");
        };
        assert_eq!(embed_bits, MAX_MAC_BITS);
    }
}
