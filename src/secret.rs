//! Secret and identity material.
//!
//! Key material lives in [`Zeroizing`] buffers so it is wiped as soon as the
//! operation holding it returns. None of these types print their contents.

use {
    crate::config::{KEY_SIZE, NONCE_SIZE, SERIAL_SIZE},
    zeroize::Zeroizing,
};

/// Root secret shared with the companion element. Must be kept out of
/// readable flash in a production build.
const COMPILED_IN_SECRET: [u8; KEY_SIZE] = [
    0x37, 0x80, 0xe6, 0x3d, 0x49, 0x68, 0xad, 0xe5, 0xd8, 0x22, 0xc0, 0x13, 0xfc, 0xc3, 0x23, 0x84,
    0x5d, 0x1b, 0x56, 0x9f, 0xe7, 0x05, 0xb6, 0x00, 0x06, 0xfe, 0xec, 0x14, 0x5a, 0x0d, 0xb1, 0xe3,
];

pub struct SharedSecret(Zeroizing<[u8; KEY_SIZE]>);

impl SharedSecret {
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Copies the built-in root secret into a scoped buffer.
    pub fn compiled_in() -> Self {
        Self::new(COMPILED_IN_SECRET)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl core::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("SharedSecret(..)")
    }
}

/// Per-device key derived from the shared secret and the device serial.
pub struct DiversifiedKey(Zeroizing<[u8; KEY_SIZE]>);

impl DiversifiedKey {
    pub fn new(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl core::fmt::Debug for DiversifiedKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("DiversifiedKey(..)")
    }
}

impl PartialEq for DiversifiedKey {
    fn eq(&self, other: &Self) -> bool {
        // Not constant time.
        self.0[..] == other.0[..]
    }
}

/// Immutable device identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSerial(pub [u8; SERIAL_SIZE]);

impl DeviceSerial {
    pub fn as_bytes(&self) -> &[u8; SERIAL_SIZE] {
        &self.0
    }
}

impl core::fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mut buf = [0u8; SERIAL_SIZE * 2];
        hex::encode_to_slice(self.0, &mut buf).map_err(|_| core::fmt::Error)?;
        // `encode_to_slice` only emits ASCII hex digits
        f.write_str(core::str::from_utf8(&buf).map_err(|_| core::fmt::Error)?)
    }
}

/// 32-byte TempKey seed used by key derivation: the serial followed by zeros.
pub struct TempKeySeed(Zeroizing<[u8; KEY_SIZE]>);

impl TempKeySeed {
    pub fn from_serial(serial: &DeviceSerial) -> Self {
        let mut value = Zeroizing::new([0u8; KEY_SIZE]);
        value[..SERIAL_SIZE].copy_from_slice(serial.as_bytes());
        Self(value)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Host contribution (`NumIn`) to the challenge.
#[derive(Clone, PartialEq, Eq)]
pub struct HostNonce(pub [u8; NONCE_SIZE]);

impl core::fmt::Debug for HostNonce {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("HostNonce(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_key_pads_serial_with_zeros() {
        let serial = DeviceSerial([1, 2, 3, 4, 5, 6, 7, 8, 9]);
        let seed = TempKeySeed::from_serial(&serial);
        assert_eq!(&seed.as_bytes()[..9], serial.as_bytes());
        assert!(seed.as_bytes()[9..].iter().all(|b| *b == 0));
    }

    #[test]
    fn secrets_are_redacted() {
        let secret = SharedSecret::compiled_in();
        assert_eq!(format!("{secret:?}"), "SharedSecret(..)");
        assert_eq!(format!("{:?}", DiversifiedKey::new([7; 32])), "DiversifiedKey(..)");
    }

    #[test]
    fn serial_displays_as_hex() {
        let serial = DeviceSerial([0x01, 0x23, 0xab, 0, 0, 0, 0, 0, 0xee]);
        assert_eq!(format!("{serial}"), "0123ab0000000000ee");
    }
}
