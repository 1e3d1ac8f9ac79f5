//! No-op MAC module that fills the MAC region with all-ones bits.
//!
//! Provides no integrity or replay protection whatsoever. Useful for
//! measuring a parser's carrier overhead in isolation, or as a harness
//! fixture, never for a real connection.

use repel_core::{ceil_bits_to_bytes, MacModule, MacVerdict};

/// All-ones MAC module. See the module-level docs for its (lack of)
/// security properties.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMac;

impl MacModule for NullMac {
    type Keys = ();

    fn set_keys(&mut self, (): ()) {}

    fn sign(&self, _packet: &[u8], macbits: u16, extrabits: u16, _nonce: Option<[u8; 8]>) -> Vec<u8> {
        vec![0xffu8; ceil_bits_to_bytes(macbits + extrabits)]
    }

    fn verify(&self, _packet: &[u8], mac: &[u8], bits: u16, _nonce: Option<[u8; 8]>) -> MacVerdict {
        let fullbytes = usize::from(bits) / 8;
        let oddbits = bits % 8;

        let needed = fullbytes + usize::from(oddbits > 0);
        let matches = mac.len() >= needed
            && mac[..fullbytes].iter().all(|&b| b == 0xff)
            && (oddbits == 0 || {
                let mask = 0xffu8 >> oddbits;
                (mac[fullbytes] | mask) == 0xff
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

    #[test]
    fn all_ones_mac_verifies() {
        let mac = NullMac;
        let signed = mac.sign(b"anything", 37, 0, None);
        assert_eq!(mac.verify(b"anything", &signed, 37, None), MacVerdict::Valid { protection_bits: 37 });
    }

    #[test]
    fn tampered_bit_fails() {
        let mac = NullMac;
        let mut signed = mac.sign(b"anything", 16, 0, None);
        signed[0] = 0;
        assert_eq!(mac.verify(b"anything", &signed, 16, None), MacVerdict::Invalid { attempted_bits: 16 });
    }
}
