//! Fixtures shared by the scenario and property tests under `tests/`.
//!
//! Wires up matched client/server connection pairs over the bundled parser
//! and MAC modules so the integration tests can focus on the behavior being
//! checked rather than connection setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use repel_core::{Connection, ConnectionConfig};
use repel_mac::{HmacKeys, HmacSha256Mac, NullMac, KEY_SIZE};
use repel_parsers::{FakeParser, ModbusTcpConfig, ModbusTcpParser, SplitAlignment, SplitParser};

/// A Modbus/TCP connection paired with HMAC-SHA256, as a client or a server.
pub type ModbusConnection = Connection<ModbusTcpParser, HmacSha256Mac>;

/// Builds a symmetric client/server pair of Modbus/TCP connections sharing
/// one key pair (the client's send key is the server's receive key and vice
/// versa) and `embed_nonce_bits` of nonce window.
#[must_use]
pub fn modbus_pair(embed_nonce_bits: u8) -> (ModbusConnection, ModbusConnection) {
    modbus_pair_with_config(embed_nonce_bits, ModbusTcpConfig::default())
}

/// Like [`modbus_pair`], but with an explicit client-side parser
/// configuration; the server is derived from it with `is_client` cleared.
#[must_use]
pub fn modbus_pair_with_config(embed_nonce_bits: u8, client_config: ModbusTcpConfig) -> (ModbusConnection, ModbusConnection) {
    let server_config = ModbusTcpConfig::new(client_config.reuse_tid_bits, false, client_config.reuse_unit_id);

    let mut client = Connection::new(
        ModbusTcpParser::new(client_config),
        HmacSha256Mac::new(),
        ConnectionConfig::new(embed_nonce_bits),
    );
    let mut server = Connection::new(
        ModbusTcpParser::new(server_config),
        HmacSha256Mac::new(),
        ConnectionConfig::new(embed_nonce_bits),
    );

    let (a_to_b, b_to_a) = symmetric_keys();
    client.set_keys(a_to_b);
    server.set_keys(b_to_a);

    (client, server)
}

/// A fixed demonstration key pair: `a_to_b` signs with key `0x11` and
/// verifies with key `0x22`; `b_to_a` is the mirror image, so each side's
/// send key is the other's receive key.
fn symmetric_keys() -> (HmacKeys, HmacKeys) {
    let a_to_b = HmacKeys { send: [0x11u8; KEY_SIZE], recv: [0x22u8; KEY_SIZE] };
    let b_to_a = HmacKeys { send: a_to_b.recv, recv: a_to_b.send };
    (a_to_b, b_to_a)
}

/// A literal 12-byte Modbus/TCP "read holding registers" request: TID
/// `0x0007`, PID `0x0000`, length `6`, unit id `0x11`, function code `0x03`
/// reading 3 registers starting at address `0x006B`.
#[must_use]
pub fn sample_modbus_frame() -> Vec<u8> {
    vec![0x00, 0x07, 0x00, 0x00, 0x00, 0x06, 0x11, 0x03, 0x00, 0x6B, 0x00, 0x03]
}

/// A connection pair using [`FakeParser`] and [`NullMac`], for exercising
/// the engine independent of any real framing or cryptography.
#[must_use]
pub fn fake_pair(embed_nonce_bits: u8) -> (Connection<FakeParser, NullMac>, Connection<FakeParser, NullMac>) {
    let client = Connection::new(FakeParser, NullMac, ConnectionConfig::new(embed_nonce_bits));
    let server = Connection::new(FakeParser, NullMac, ConnectionConfig::new(embed_nonce_bits));
    (client, server)
}

/// A connection pair using [`SplitParser`] (identically configured on both
/// ends; the parser has no client/server asymmetry) paired with
/// HMAC-SHA256, for exercising each alignment strategy end to end.
#[must_use]
pub fn split_pair(
    mac_splits: u16,
    alignment: SplitAlignment,
    embed_nonce_bits: u8,
) -> (Connection<SplitParser, HmacSha256Mac>, Connection<SplitParser, HmacSha256Mac>) {
    let mut client = Connection::new(
        SplitParser::new(mac_splits, alignment),
        HmacSha256Mac::new(),
        ConnectionConfig::new(embed_nonce_bits),
    );
    let mut server = Connection::new(
        SplitParser::new(mac_splits, alignment),
        HmacSha256Mac::new(),
        ConnectionConfig::new(embed_nonce_bits),
    );

    let (a_to_b, b_to_a) = symmetric_keys();
    client.set_keys(a_to_b);
    server.set_keys(b_to_a);

    (client, server)
}
