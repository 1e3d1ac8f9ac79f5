//! Modbus/TCP parser: embeds integrity information in the Transaction
//! Identifier, Protocol Identifier, and (optionally) Unit Identifier fields
//! of the MBAP header.
//!
//! Modbus/TCP frames only use the Transaction Identifier to pair a
//! response with its request; any value round-trips through a compliant
//! server unchanged. This parser reuses its low bits as carrier, replacing
//! them with a small remapped index so a client with many concurrent
//! requests in flight does not run out of carrier bits for any single one.
//! The Protocol Identifier field is always zero on the wire and is fully
//! reusable; the Unit Identifier can optionally be reused as well for
//! links that do not route to multiple downstream units.

use repel_core::{BitCursor, BitCursorRef, Mode, Parser, ParseResult, ParseOutcome};
use tracing::error;

/// Configuration for [`ModbusTcpParser`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModbusTcpConfig {
    /// Number of low Transaction Identifier bits reused as carrier.
    /// Must be less than 16; the remaining high bits index a remap table
    /// sized `2^(16 - reuse_tid_bits)` entries.
    pub reuse_tid_bits: u8,
    /// Whether this side performs transaction-id remapping. Only the
    /// client side remaps; a server must echo the Transaction Identifier
    /// it received unchanged, so it never remaps and never unmaps.
    pub is_client: bool,
    /// Whether the Unit Identifier field is also reused as carrier.
    pub reuse_unit_id: bool,
}

impl ModbusTcpConfig {
    /// Creates a validated configuration.
    ///
    /// # Panics
    ///
    /// Panics if `reuse_tid_bits >= 16` (a Transaction Identifier is only
    /// 16 bits wide, so reusing all of them leaves no room for a remap
    /// table index).
    #[must_use]
    pub fn new(reuse_tid_bits: u8, is_client: bool, reuse_unit_id: bool) -> Self {
        assert!(reuse_tid_bits < 16, "reuse_tid_bits must be < 16");
        Self { reuse_tid_bits, is_client, reuse_unit_id }
    }
}

impl Default for ModbusTcpConfig {
    /// Twelve reused Transaction Identifier bits (a 16-entry remap table,
    /// enough for the 16 concurrent transactions the Modbus specification
    /// allows), client role, and Unit Identifier reuse enabled.
    fn default() -> Self {
        Self::new(12, true, true)
    }
}

/// Modbus/TCP parser and Transaction Identifier remapper.
pub struct ModbusTcpParser {
    config: ModbusTcpConfig,
    /// Indexed by remapped id; holds the original Transaction Identifier,
    /// or 0 for an unused slot. A Transaction Identifier of exactly 0 is
    /// tracked separately in `tid0_index` since 0 is also the sentinel for
    /// "unused".
    transaction_map: Vec<u16>,
    /// Remap-table index currently holding a Transaction Identifier of 0,
    /// or `transaction_map.len()` (out of range) when none is held.
    tid0_index: u16,
}

impl ModbusTcpParser {
    /// Creates a parser with an empty remap table.
    #[must_use]
    pub fn new(config: ModbusTcpConfig) -> Self {
        let tid_map_len = Self::tid_map_len(config.reuse_tid_bits);
        Self {
            config,
            transaction_map: vec![0u16; usize::from(tid_map_len)],
            tid0_index: tid_map_len,
        }
    }

    fn tid_map_len(reuse_tid_bits: u8) -> u16 {
        if reuse_tid_bits > 0 {
            1u16 << (16 - reuse_tid_bits)
        } else {
            1
        }
    }

    fn max_embed_bits_for(config: ModbusTcpConfig) -> u16 {
        16 + u16::from(config.reuse_tid_bits) + if config.reuse_unit_id { 8 } else { 0 }
    }

    /// Maps a full Transaction Identifier to a small remap-table index,
    /// allocating a fresh slot on first use. Once a slot is reserved for a
    /// Transaction Identifier of 0, it is returned for every call until
    /// freed by [`ModbusTcpParser::unmap_tid`] (only `tid == 0` frees it);
    /// this mirrors the reference allocator exactly.
    fn map_tid(&mut self, tid: u16) -> u16 {
        let tid_map_len = self.transaction_map.len() as u16;
        let reserved = self.tid0_index;
        if reserved < tid_map_len {
            return reserved;
        }

        for i in 0..tid_map_len {
            if i != reserved && self.transaction_map[usize::from(i)] == 0 {
                if tid == 0 {
                    self.tid0_index = i;
                } else {
                    self.transaction_map[usize::from(i)] = tid;
                }
                return i;
            }
        }

        error!(tid, "modbus tcp: transaction id map is full");
        tid % tid_map_len
    }

    /// Reverses [`ModbusTcpParser::map_tid`], freeing the slot.
    fn unmap_tid(&mut self, mapid: u16) -> u16 {
        let idx = usize::from(mapid);
        let tid = self.transaction_map[idx];
        if tid == 0 {
            if mapid == self.tid0_index {
                self.tid0_index = self.transaction_map.len() as u16;
                0
            } else {
                error!(mapid, "modbus tcp: unknown map id, treating as transaction id");
                mapid
            }
        } else {
            self.transaction_map[idx] = 0;
            tid
        }
    }
}

impl Parser for ModbusTcpParser {
    fn max_embed_bits(&self) -> u16 {
        Self::max_embed_bits_for(self.config)
    }

    fn parse(&self, packet: &[u8], _mode: Mode) -> ParseResult {
        const MBAP_HEADER_PREFIX: usize = 6; // Transaction Id, Protocol Id, Length

        if packet.len() < MBAP_HEADER_PREFIX {
            return ParseOutcome::Incomplete { missing: MBAP_HEADER_PREFIX - packet.len() };
        }

        let cursor = BitCursorRef::new(packet);
        let length_field = cursor.peek_u16(4 * 8, 16);
        // TID, PID, and Length itself do not count toward the MBAP length field.
        let pktlen = usize::from(length_field) + MBAP_HEADER_PREFIX;

        if packet.len() < pktlen {
            return ParseOutcome::Incomplete { missing: pktlen - packet.len() };
        }

        ParseOutcome::Parsed {
            pktlen,
            embed_bits: self.max_embed_bits(),
            packet_has_nonce: false,
        }
    }

    fn embed(&mut self, packet: &mut [u8], _pktlen: usize, mac: &[u8]) {
        let mut pkt = BitCursor::new(packet);
        let mut mac = BitCursorRef::new(mac);

        if self.config.reuse_tid_bits > 0 {
            pkt.copy_u16(&mut mac, self.config.reuse_tid_bits);
            pkt.skip(usize::from(16 - self.config.reuse_tid_bits));
        } else {
            pkt.skip(16);
        }

        pkt.copy_u16(&mut mac, 16); // Protocol Identifier
        pkt.skip(16); // Length

        if self.config.reuse_unit_id {
            pkt.copy_u8(&mut mac, 8); // Unit Identifier
        }
    }

    fn extract(&mut self, packet: &[u8], _pktlen: usize, mac: &mut [u8]) {
        let mut pkt = BitCursorRef::new(packet);
        let mut mac = BitCursor::new(mac);

        if self.config.reuse_tid_bits > 0 {
            mac.copy_u16(&mut pkt, self.config.reuse_tid_bits);
            pkt.skip(usize::from(16 - self.config.reuse_tid_bits));
        } else {
            pkt.skip(16);
        }

        mac.copy_u16(&mut pkt, 16); // Protocol Identifier
        pkt.skip(16); // Length

        if self.config.reuse_unit_id {
            mac.copy_u8(&mut pkt, 8); // Unit Identifier
        }
    }

    fn restore(&mut self, packet: &mut [u8], _pktlen: usize, mode: Mode) {
        let mut pkt = BitCursor::new(packet);

        if self.config.reuse_tid_bits > 0 {
            if self.config.is_client {
                // Calculate the MAC with the mapped TID on the way out;
                // unmapping only happens after verification on the way in,
                // in `verified`, since the peer computes its MAC over the
                // mapped value too.
                if matches!(mode, Mode::Embed) {
                    let tid = pkt.peek_u16(0, 16);
                    let mapid = self.map_tid(tid);
                    pkt.push_u16(0, self.config.reuse_tid_bits);
                    pkt.push_u16(mapid, 16 - self.config.reuse_tid_bits);
                } else {
                    pkt.push_u16(0, self.config.reuse_tid_bits);
                    pkt.skip(usize::from(16 - self.config.reuse_tid_bits));
                }
            } else {
                // Servers never remap; just erase any reused bits before
                // computing the comparison MAC.
                pkt.push_u16(0, self.config.reuse_tid_bits);
                pkt.skip(usize::from(16 - self.config.reuse_tid_bits));
            }
        } else {
            pkt.skip(16);
        }

        pkt.push_u16(0, 16); // Protocol Identifier
        pkt.skip(16); // Length

        if self.config.reuse_unit_id {
            pkt.push_u8(255, 8); // Unit Identifier
        }
    }

    fn verified(&mut self, packet: &mut [u8], _pktlen: usize) {
        if self.config.reuse_tid_bits > 0 && self.config.is_client {
            let mut pkt = BitCursor::new(packet);
            let mapid = pkt.peek_u16(usize::from(self.config.reuse_tid_bits), 16 - self.config.reuse_tid_bits);
            let tid = self.unmap_tid(mapid);
            pkt.push_u16(tid, 16);
        }
    }
}
