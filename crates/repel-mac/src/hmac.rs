//! Truncated HMAC-SHA256 MAC module.

use hmac::{Hmac, Mac};
use repel_core::{ceil_bits_to_bytes, MacModule, MacVerdict};
use sha2::Sha256;
use tracing::trace;
use zeroize::{Zeroize, ZeroizeOnDrop};

type HmacSha256 = Hmac<Sha256>;

/// Digest width of the underlying primitive, in bytes. MAC requests wider
/// than this are zero-padded past the real digest, matching the upstream
/// module's "buffer may be larger than the digest" allowance.
const DIGEST_BYTES: usize = 32;

/// Size in bytes of each directional key.
pub const KEY_SIZE: usize = 16;

/// Send/receive key pair for [`HmacSha256Mac`].
///
/// A single connection signs outgoing packets with `send` and verifies
/// incoming ones with `recv`; a peer's `send` key is this side's `recv` key.
/// Keys are zeroized on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct HmacKeys {
    /// Key used to sign outgoing packets.
    pub send: [u8; KEY_SIZE],
    /// Key used to verify incoming packets.
    pub recv: [u8; KEY_SIZE],
}

/// Truncated HMAC-SHA256 MAC module.
///
/// Signs `packet || nonce` (nonce omitted when absent) with the directional
/// send key and returns the digest truncated (or zero-extended) to the
/// requested bit width. Verification recomputes the digest with the
/// directional receive key and compares it byte-for-byte, masking off the
/// unused low bits of the final partial byte.
pub struct HmacSha256Mac {
    keys: HmacKeys,
}

impl Default for HmacSha256Mac {
    fn default() -> Self {
        Self {
            keys: HmacKeys { send: [0u8; KEY_SIZE], recv: [0u8; KEY_SIZE] },
        }
    }
}

impl HmacSha256Mac {
    /// Creates a module with zeroed keys; call [`MacModule::set_keys`]
    /// before using it on a real connection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn digest(key: &[u8; KEY_SIZE], packet: &[u8], nonce: Option<[u8; 8]>) -> [u8; DIGEST_BYTES] {
        let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
            unreachable!("HMAC-SHA256 accepts any key size");
        };
        mac.update(packet);
        if let Some(nonce) = nonce {
            mac.update(&nonce);
        }
        let mut out = [0u8; DIGEST_BYTES];
        out.copy_from_slice(&mac.finalize().into_bytes());
        out
    }
}

impl MacModule for HmacSha256Mac {
    type Keys = HmacKeys;

    fn set_keys(&mut self, keys: HmacKeys) {
        self.keys = keys;
    }

    fn sign(&self, packet: &[u8], macbits: u16, extrabits: u16, nonce: Option<[u8; 8]>) -> Vec<u8> {
        let digest = Self::digest(&self.keys.send, packet, nonce);
        let bytes = ceil_bits_to_bytes(macbits + extrabits);
        let mut buf = vec![0u8; bytes];
        let copy_len = bytes.min(DIGEST_BYTES);
        buf[..copy_len].copy_from_slice(&digest[..copy_len]);
        trace!(macbits, extrabits, "hmac: signed");
        buf
    }

    fn verify(&self, packet: &[u8], mac: &[u8], bits: u16, nonce: Option<[u8; 8]>) -> MacVerdict {
        let digest = Self::digest(&self.keys.recv, packet, nonce);
        let fullbytes = usize::from(bits) / 8;
        let oddbits = bits % 8;

        let needed = fullbytes + usize::from(oddbits > 0);
        let matches = mac.len() >= needed
            && digest.len() >= needed
            && mac[..fullbytes] == digest[..fullbytes]
            && (oddbits == 0 || {
                let mask = 0xffu8 >> oddbits;
                (mac[fullbytes] | mask) == (digest[fullbytes] | mask)
            });

        if matches {
            MacVerdict::Valid { protection_bits: bits }
        } else {
            MacVerdict::Invalid { attempted_bits: bits }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> HmacKeys {
        HmacKeys { send: [0x11u8; KEY_SIZE], recv: [0x11u8; KEY_SIZE] }
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let mut mac = HmacSha256Mac::new();
        mac.set_keys(keys());

        let packet = b"some packet bytes";
        let signed = mac.sign(packet, 64, 0, None);
        let verdict = mac.verify(packet, &signed, 64, None);
        assert_eq!(verdict, MacVerdict::Valid { protection_bits: 64 });
    }

    #[test]
    fn tampered_packet_fails_verification() {
        let mut mac = HmacSha256Mac::new();
        mac.set_keys(keys());

        let signed = mac.sign(b"original", 64, 0, None);
        let verdict = mac.verify(b"tampered", &signed, 64, None);
        assert_eq!(verdict, MacVerdict::Invalid { attempted_bits: 64 });
    }

    #[test]
    fn nonce_changes_the_signature() {
        let mut mac = HmacSha256Mac::new();
        mac.set_keys(keys());

        let a = mac.sign(b"packet", 64, 0, Some(0u64.to_be_bytes()));
        let b = mac.sign(b"packet", 64, 0, Some(1u64.to_be_bytes()));
        assert_ne!(a, b);
    }

    #[test]
    fn odd_bit_width_masks_trailing_bits() {
        let mut mac = HmacSha256Mac::new();
        mac.set_keys(keys());

        let packet = b"odd width packet";
        let mut signed = mac.sign(packet, 12, 0, None);
        // Flip bits below the 12-bit boundary in the trailing byte; they
        // must not affect verification.
        let last = signed.len() - 1;
        signed[last] ^= 0x0f;
        let verdict = mac.verify(packet, &signed, 12, None);
        assert_eq!(verdict, MacVerdict::Valid { protection_bits: 12 });
    }
}
