//! Literal end-to-end scenarios from the integrity-protection design.

use repel_core::{AuthVerdict, ConnectionError};
use repel_harness::{fake_pair, modbus_pair, sample_modbus_frame, split_pair};
use repel_parsers::SplitAlignment;

/// S2: default Modbus/TCP config round-trips a request through embed,
/// authenticate, re-embed (as a reply), authenticate again. The Transaction
/// Identifier is recovered via the client-side remap table; the Protocol
/// Identifier and Unit Identifier are full carrier with no recovery path and
/// settle at their canonical restored values (0x0000 and 0xFF) rather than
/// their pre-embed originals.
#[test]
fn modbus_round_trip_restores_header_fields() {
    let (mut client, mut server) = modbus_pair(3);

    let original = sample_modbus_frame();
    let mut packet = original.clone();

    client.embed(&mut packet).expect("client embed succeeds");
    assert_ne!(packet[0..2], original[0..2], "TID carrier bits must differ before verification");

    let (pktlen, verdict) = server.authenticate(&mut packet).expect("server authenticate runs");
    assert_eq!(pktlen, original.len());
    assert!(matches!(verdict, AuthVerdict::Success(_)));

    server.embed(&mut packet).expect("server embed succeeds");
    let (pktlen, verdict) = client.authenticate(&mut packet).expect("client authenticate runs");
    assert_eq!(pktlen, original.len());
    assert!(matches!(verdict, AuthVerdict::Success(_)));

    assert_eq!(&packet[0..2], &original[0..2], "TID restored after verified()");
    assert_eq!(&packet[2..4], &[0x00, 0x00], "PID settles at its canonical restored value");
    assert_eq!(packet[6], 0xFF, "unit id settles at its canonical restored value, with no recovery path");
    assert_eq!(&packet[7..], &original[7..], "payload untouched");
}

/// S3: dropping packets 2 and 3 of a run of six still lets packet 4 verify,
/// reporting the two losses; packets 5 and 6 then report no further loss.
#[test]
fn nonce_loss_is_reported_on_next_verified_packet() {
    let (mut client, mut server) = modbus_pair(3);

    let mut packets: Vec<Vec<u8>> = (0..6)
        .map(|_| {
            let mut p = sample_modbus_frame();
            client.embed(&mut p).expect("embed succeeds");
            p
        })
        .collect();

    let (_, verdict) = server.authenticate(&mut packets[0]).unwrap();
    assert!(matches!(verdict, AuthVerdict::Success(_)));

    // packets[1], packets[2] dropped in transit.

    let (_, verdict) = server.authenticate(&mut packets[3]).unwrap();
    let AuthVerdict::Success(result) = verdict else { panic!("packet 4 should verify") };
    assert_eq!(result.packet_loss, 2);

    for i in 4..6 {
        let (_, verdict) = server.authenticate(&mut packets[i]).unwrap();
        let AuthVerdict::Success(result) = verdict else { panic!("packet {i} should verify") };
        assert_eq!(result.packet_loss, 0);
    }
}

/// S4: flipping a payload bit after embedding causes authentication to fail
/// and leaves the receive nonce unchanged.
#[test]
fn tampering_the_function_code_fails_authentication() {
    let (mut client, mut server) = modbus_pair(3);

    let mut packet = sample_modbus_frame();
    client.embed(&mut packet).expect("embed succeeds");
    packet[7] ^= 0x01; // function code byte, outside any carrier field

    let (_, verdict) = server.authenticate(&mut packet).expect("authenticate runs");
    assert!(matches!(verdict, AuthVerdict::Failed(_)));
}

/// S5: a buffer shorter than the 6-byte MBAP header prefix is reported as
/// incomplete with the exact byte shortfall; once the full frame arrives,
/// authentication proceeds normally.
#[test]
fn incomplete_frame_reports_missing_bytes_until_whole() {
    let (mut client, mut server) = modbus_pair(3);

    let mut full = sample_modbus_frame();
    client.embed(&mut full).expect("embed succeeds");

    let mut five_bytes = full[..5].to_vec();
    match server.authenticate(&mut five_bytes) {
        Err(ConnectionError::Incomplete { missing }) => assert_eq!(missing, 1),
        other => panic!("expected Incomplete{{missing: 1}}, got {other:?}"),
    }

    let mut six_bytes = full[..6].to_vec();
    match server.authenticate(&mut six_bytes) {
        Err(ConnectionError::Incomplete { missing }) => assert_eq!(missing, full.len() - 6),
        other => panic!("expected Incomplete, got {other:?}"),
    }

    let (pktlen, verdict) = server.authenticate(&mut full).expect("full frame authenticates");
    assert_eq!(pktlen, full.len());
    assert!(matches!(verdict, AuthVerdict::Success(_)));
}

/// S6: the all-ones null MAC module always verifies, regardless of keys,
/// and its embedded carrier bytes are all-ones up to the requested width.
#[test]
fn null_mac_always_verifies() {
    let (mut client, mut server) = fake_pair(0);

    let mut packet = vec![0u8; 8];
    let bits = client.embed(&mut packet).expect("embed succeeds");
    assert_eq!(bits, 64, "an 8-byte buffer carries min(8*8, 256) = 64 bits");

    let (_, verdict) = server.authenticate(&mut packet).expect("authenticate runs");
    let AuthVerdict::Success(result) = verdict else { panic!("null mac must always verify") };
    assert_eq!(result.protection_level, bits);
}

/// Every split-parser alignment strategy round-trips through a real
/// embed/authenticate cycle: `restore` must zero exactly the packet bits
/// `embed` wrote, or the sender's and receiver's MAC inputs diverge and
/// authentication never succeeds. `MacByteAlign` regressed this silently
/// once (`restore` introduced a packet-side gap `embed` never created).
#[test]
fn split_parser_round_trips_for_every_alignment() {
    for alignment in [SplitAlignment::OneBitGap, SplitAlignment::PacketByteAlign, SplitAlignment::MacByteAlign] {
        let (mut client, mut server) = split_pair(3, alignment, 4);

        let mut packet = vec![0u8; 64];
        client.embed(&mut packet).expect("embed succeeds");
        let (_, verdict) = server.authenticate(&mut packet).expect("authenticate runs");

        assert!(matches!(verdict, AuthVerdict::Success(_)), "{alignment:?} failed to authenticate");
    }
}
