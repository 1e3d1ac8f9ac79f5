//! Test parser that splits a 256-bit MAC across a configurable number of
//! segments, each preceded by an alignment gap.
//!
//! Exists to measure how different carrier-alignment strategies affect a
//! protocol's usable throughput; never appropriate for a live link, since
//! it overwrites packet bytes with no regard for any underlying format.

use repel_core::{BitCursor, BitCursorRef, Mode, Parser, ParseResult, ParseOutcome};

const MAX_MAC_BITS: u16 = 256;
const OFFSET_BITS: usize = 1;

/// How the parser aligns itself before writing each MAC segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAlignment {
    /// Skip a single bit in the packet before each segment (the default).
    OneBitGap,
    /// Round the packet cursor up to the next byte boundary before each
    /// segment.
    PacketByteAlign,
    /// Round the MAC buffer's cursor up to the next byte boundary before
    /// each segment, leaving the packet cursor untouched.
    MacByteAlign,
}

/// Splits a fixed 256-bit MAC into `mac_splits + 1` segments, aligning
/// before each one according to `alignment`.
#[derive(Debug, Clone, Copy)]
pub struct SplitParser {
    /// Number of extra cut points; the MAC is divided into `mac_splits + 1`
    /// segments.
    pub mac_splits: u16,
    /// Alignment strategy applied before each segment.
    pub alignment: SplitAlignment,
}

impl SplitParser {
    /// Creates a parser with the given split count and alignment strategy.
    #[must_use]
    pub fn new(mac_splits: u16, alignment: SplitAlignment) -> Self {
        Self { mac_splits, alignment }
    }

    fn segment_len(&self) -> u16 {
        MAX_MAC_BITS / (self.mac_splits + 1)
    }

    fn min_packet_len(&self) -> usize {
        match self.alignment {
            SplitAlignment::PacketByteAlign => usize::from(MAX_MAC_BITS),
            SplitAlignment::OneBitGap | SplitAlignment::MacByteAlign => {
                repel_core::ceil_bits_to_bytes(MAX_MAC_BITS * (OFFSET_BITS as u16 + 1))
            }
        }
    }

    fn align_embed_extract(&self, pkt: &mut BitCursor<'_>, mac: &mut BitCursorRef<'_>) {
        match self.alignment {
            SplitAlignment::OneBitGap => pkt.skip(OFFSET_BITS),
            SplitAlignment::PacketByteAlign => pkt.byte_align(),
            SplitAlignment::MacByteAlign => mac.byte_align(),
        }
    }

    fn align_restore(&self, pkt: &mut BitCursor<'_>) {
        match self.alignment {
            SplitAlignment::PacketByteAlign => pkt.byte_align(),
            SplitAlignment::OneBitGap => pkt.skip(OFFSET_BITS),
            // MacByteAlign never gaps the packet cursor in embed/extract
            // (only the MAC-side cursor byte-aligns there), so restore must
            // not introduce a gap either, or it zeroes the wrong bits.
            SplitAlignment::MacByteAlign => {}
        }
    }
}

impl Parser for SplitParser {
    fn max_embed_bits(&self) -> u16 {
        MAX_MAC_BITS
    }

    fn parse(&self, packet: &[u8], _mode: Mode) -> ParseResult {
        let minlen = self.min_packet_len();
        if packet.len() < minlen {
            return ParseOutcome::Incomplete { missing: minlen - packet.len() };
        }
        ParseOutcome::Parsed {
            pktlen: packet.len(),
            embed_bits: MAX_MAC_BITS,
            packet_has_nonce: false,
        }
    }

    fn embed(&mut self, packet: &mut [u8], _pktlen: usize, mac: &[u8]) {
        let segment_len = self.segment_len();
        let mut bits_left = MAX_MAC_BITS;
        let mut pkt = BitCursor::new(packet);
        let mut mac = BitCursorRef::new(mac);

        for _ in 0..self.mac_splits {
            self.align_embed_extract(&mut pkt, &mut mac);
            pkt.copy_wide(&mut mac, segment_len);
            bits_left -= segment_len;
        }
        self.align_embed_extract(&mut pkt, &mut mac);
        pkt.copy_wide(&mut mac, bits_left);
    }

    fn extract(&mut self, packet: &[u8], _pktlen: usize, mac: &mut [u8]) {
        let segment_len = self.segment_len();
        let mut bits_left = MAX_MAC_BITS;
        let mut pkt_ref = BitCursorRef::new(packet);
        let mut mac_cur = BitCursor::new(mac);

        for _ in 0..self.mac_splits {
            self.align_embed_extract_reverse(&mut pkt_ref, &mut mac_cur);
            mac_cur.copy_wide(&mut pkt_ref, segment_len);
            bits_left -= segment_len;
        }
        self.align_embed_extract_reverse(&mut pkt_ref, &mut mac_cur);
        mac_cur.copy_wide(&mut pkt_ref, bits_left);
    }

    fn restore(&mut self, packet: &mut [u8], _pktlen: usize, _mode: Mode) {
        let segment_len = self.segment_len();
        let mut bits_left = MAX_MAC_BITS;
        let mut pkt = BitCursor::new(packet);

        for _ in 0..self.mac_splits {
            self.align_restore(&mut pkt);
            pkt.zero_wide(segment_len);
            bits_left -= segment_len;
        }
        self.align_restore(&mut pkt);
        pkt.zero_wide(bits_left);
    }
}

impl SplitParser {
    /// Mirror of [`SplitParser::align_embed_extract`] for `extract`, where
    /// the packet is the read-only side and the MAC buffer is the
    /// read-write side.
    fn align_embed_extract_reverse(&self, pkt: &mut BitCursorRef<'_>, mac: &mut BitCursor<'_>) {
        match self.alignment {
            SplitAlignment::OneBitGap => pkt.skip(OFFSET_BITS),
            SplitAlignment::PacketByteAlign => pkt.byte_align(),
            SplitAlignment::MacByteAlign => mac.byte_align(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_extract_round_trips_one_bit_gap() {
        let mut parser = SplitParser::new(3, SplitAlignment::OneBitGap);
        let mut packet = vec![0u8; 64];
        let mac = (0..32u8).map(|i| i.wrapping_mul(7)).collect::<Vec<_>>();

        parser.embed(&mut packet, packet.len(), &mac);

        let mut extracted = vec![0u8; 32];
        parser.extract(&packet, packet.len(), &mut extracted);
        assert_eq!(extracted, mac);
    }

    #[test]
    fn embed_extract_round_trips_packet_byte_align() {
        let mut parser = SplitParser::new(5, SplitAlignment::PacketByteAlign);
        let mut packet = vec![0u8; 256];
        let mac = (0..32u8).map(|i| i ^ 0x5a).collect::<Vec<_>>();

        parser.embed(&mut packet, packet.len(), &mac);

        let mut extracted = vec![0u8; 32];
        parser.extract(&packet, packet.len(), &mut extracted);
        assert_eq!(extracted, mac);
    }

    #[test]
    fn embed_extract_round_trips_mac_byte_align() {
        let mut parser = SplitParser::new(2, SplitAlignment::MacByteAlign);
        let mut packet = vec![0u8; 64];
        let mac = (0..32u8).map(|i| i.wrapping_mul(13)).collect::<Vec<_>>();

        parser.embed(&mut packet, packet.len(), &mac);

        let mut extracted = vec![0u8; 32];
        parser.extract(&packet, packet.len(), &mut extracted);
        assert_eq!(extracted, mac);
    }

    #[test]
    fn restore_zeroes_the_mac_region_but_not_the_gap_bit() {
        let mut parser = SplitParser::new(0, SplitAlignment::OneBitGap);
        let mut packet = vec![0xffu8; 64];
        parser.restore(&mut packet, packet.len(), Mode::Authenticate);
        // One gap bit is skipped (left untouched), then 256 MAC bits are
        // zeroed: byte 0 keeps its leading 1 bit, byte 1 is fully cleared.
        assert_eq!(packet[0], 0x80);
        assert_eq!(packet[1], 0x00);
    }

    #[test]
    fn short_packet_reports_incomplete() {
        let parser = SplitParser::new(0, SplitAlignment::OneBitGap);
        let outcome = parser.parse(&[0u8; 4], Mode::Embed);
        assert!(matches!(outcome, ParseOutcome::Incomplete { .. }));
    }
}
