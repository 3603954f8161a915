//! Host-side mirrors of the secure element's internal hash computations.
//!
//! These reproduce on the host what the element computes internally so the
//! host can predict a derived key or a MAC. They never touch the element.

use {
    crate::{
        config::{KEY_SIZE, NONCE_SIZE},
        secret::{DeviceSerial, DiversifiedKey, HostNonce, SharedSecret, TempKeySeed},
    },
    sha2::{Digest, Sha256},
    zeroize::Zeroizing,
};

const OPCODE_DERIVE_KEY: u8 = 0x1C;
const OPCODE_NONCE: u8 = 0x16;
const OPCODE_MAC: u8 = 0x08;

/// MAC mode: second 32 bytes of the message come from TempKey.
pub const MAC_MODE_TEMPKEY: u8 = 0x01;

/// TempKey as it sits inside the element after a random nonce.
pub struct TempKey(Zeroizing<[u8; KEY_SIZE]>);

impl TempKey {
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

fn finish(hasher: Sha256) -> Zeroizing<[u8; KEY_SIZE]> {
    let mut out = Zeroizing::new([0u8; KEY_SIZE]);
    out.copy_from_slice(hasher.finalize().as_slice());
    out
}

/// DeriveKey in "roll" mode: the target slot is re-keyed from its parent.
///
/// sha256(parent || 0x1C || mode || slot || SN[8] || SN[0..2] || 0^25 || TempKey)
pub fn derive_key(
    slot: u16,
    parent: &SharedSecret,
    serial: &DeviceSerial,
    temp_key: &TempKeySeed,
) -> DiversifiedKey {
    let sn = serial.as_bytes();
    let mut hasher = Sha256::new();
    hasher.update(parent.as_bytes());
    hasher.update([OPCODE_DERIVE_KEY, 0x00]);
    hasher.update(slot.to_le_bytes());
    hasher.update([sn[8], sn[0], sn[1]]);
    hasher.update([0u8; 25]);
    hasher.update(temp_key.as_bytes());
    DiversifiedKey::new(*finish(hasher))
}

/// TempKey produced by a random Nonce command.
///
/// sha256(rand_out || num_in || 0x16 0x00 0x00)
pub fn nonce_temp_key(rand_out: &[u8; KEY_SIZE], num_in: &HostNonce) -> TempKey {
    let mut hasher = Sha256::new();
    hasher.update(rand_out);
    hasher.update(&num_in.0[..NONCE_SIZE]);
    hasher.update([OPCODE_NONCE, 0x00, 0x00]);
    TempKey(finish(hasher))
}

/// MAC over TempKey with a slot key. Optional OTP and serial bits are
/// excluded so they are hashed as zeros.
pub fn mac(slot: u16, key: &[u8; KEY_SIZE], temp_key: &TempKey, serial: &DeviceSerial) -> [u8; 32] {
    let sn = serial.as_bytes();
    let mut hasher = Sha256::new();
    hasher.update(key);
    hasher.update(temp_key.as_bytes());
    hasher.update([OPCODE_MAC, MAC_MODE_TEMPKEY]);
    hasher.update(slot.to_le_bytes());
    hasher.update([0u8; 11]);
    hasher.update([sn[8]]);
    hasher.update([0u8; 4]);
    hasher.update([sn[0], sn[1]]);
    hasher.update([0u8; 2]);
    *finish(hasher)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn serial() -> DeviceSerial {
        DeviceSerial([0x01, 0x23, 0x5a, 0x5a, 0x5a, 0x5a, 0x5a, 0x5a, 0xee])
    }

    #[test]
    fn derived_key_depends_on_serial() {
        let secret = SharedSecret::compiled_in();
        let a = serial();
        let mut b = serial();
        b.0[4] ^= 0xff;
        let ka = derive_key(6, &secret, &a, &TempKeySeed::from_serial(&a));
        let kb = derive_key(6, &secret, &b, &TempKeySeed::from_serial(&b));
        assert!(ka != kb);
        assert!(ka == derive_key(6, &secret, &a, &TempKeySeed::from_serial(&a)));
    }

    #[test]
    fn derived_key_depends_on_slot() {
        let secret = SharedSecret::compiled_in();
        let sn = serial();
        let seed = TempKeySeed::from_serial(&sn);
        assert!(derive_key(6, &secret, &sn, &seed) != derive_key(7, &secret, &sn, &seed));
    }

    #[test]
    fn mac_binds_key_and_challenge() {
        let sn = serial();
        let tk = nonce_temp_key(&[0x11; 32], &HostNonce([0x22; 20]));
        let other = nonce_temp_key(&[0x11; 32], &HostNonce([0x23; 20]));
        let m = mac(6, &[1; 32], &tk, &sn);
        assert_eq!(m, mac(6, &[1; 32], &tk, &sn));
        assert_ne!(m, mac(6, &[2; 32], &tk, &sn));
        assert_ne!(m, mac(6, &[1; 32], &other, &sn));
    }
}
