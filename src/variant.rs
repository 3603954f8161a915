//! Supported secure element families.
//!
//! Each variant carries the configuration zone image written during
//! provisioning and the bus addresses it may answer on.

const ATSHA204A_ADDRESS: u8 = 0xC8;
const ATECC508A_ADDRESS: u8 = 0xC0;
const ATECC608A_DEFAULT_ADDRESS: u8 = 0xC0;
/// Address the ATECC608A moves to once its configuration is written.
pub const ATECC608A_ADDRESS: u8 = 0x6C;

/// Offset of the I2C address byte inside the configuration zone.
const I2C_ADDRESS_OFFSET: usize = 16;

/// ATSHA204A configuration zone. The first 16 bytes and the trailing
/// UserExtra/Selector/LockData/LockConfig word are not written by the device.
const ATSHA204A_CONFIG: [u8; 88] = [
    0x01, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xee, 0x55, 0x00, 0x00,
    0xc8, 0x00, 0x55, 0x00, 0x8f, 0x80, 0x80, 0xa1, 0x82, 0xe0, 0xc4, 0xf4, 0x84, 0x00, 0xa0, 0x85,
    0x80, 0xb0, 0x87, 0x07, 0x0f, 0x00, 0xc4, 0x64, 0x8a, 0x7a, 0x0b, 0x8b, 0x0c, 0x4c, 0x80, 0xb0,
    0xc2, 0x42, 0xaf, 0x8f, 0xff, 0x00, 0xff, 0x00, 0xff, 0x00, 0xff, 0x00, 0xff, 0x00, 0xff, 0x00,
    0xff, 0x00, 0xff, 0x00, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x55, 0x55,
];

const ATECC508A_CONFIG: [u8; 128] = [
    0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xc0, 0x00, 0xaa, 0x00, 0x8f, 0x20, 0xc4, 0x44, 0x87, 0x20, 0x87, 0x20, 0x8f, 0x0f, 0xc4, 0x36,
    0x8f, 0x0f, 0x82, 0x20, 0x0f, 0x0f, 0xc4, 0x44, 0x0f, 0x0f, 0x0f, 0x0f, 0x0f, 0x0f, 0x0f, 0x0f,
    0x0f, 0x0f, 0x0f, 0x0f, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x33, 0x00, 0x1c, 0x00, 0x13, 0x00, 0x13, 0x00, 0x7c, 0x00, 0x1c, 0x00, 0x7c, 0x00, 0x33, 0x00,
    0x3c, 0x00, 0x3c, 0x00, 0x3c, 0x00, 0x30, 0x00, 0x3c, 0x00, 0x3c, 0x00, 0x3c, 0x00, 0x30, 0x00,
];

const ATECC608A_CONFIG: [u8; 128] = [
    0x01, 0x23, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x01, 0x01, 0x00,
    ATECC608A_ADDRESS, 0x00, 0x00, 0x01, 0x85, 0x00, 0x82, 0x00, 0x85, 0x20, 0x85, 0x20, 0x85, 0x20, 0x8f, 0x46,
    0x8f, 0x0f, 0x9f, 0x8f, 0x0f, 0x0f, 0x8f, 0x0f, 0x0f, 0x8f, 0x0f, 0x8f, 0x0f, 0x8f, 0x0f, 0x0f,
    0x0d, 0x1f, 0x0f, 0x0f, 0xff, 0xff, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0xff, 0xff,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x03, 0xf7, 0x00, 0x69, 0x76, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x0e, 0x60, 0x00, 0x00, 0x00, 0x00,
    0x53, 0x00, 0x53, 0x00, 0x73, 0x00, 0x73, 0x00, 0x73, 0x00, 0x38, 0x00, 0x7c, 0x00, 0x1c, 0x00,
    0x3c, 0x00, 0x1a, 0x00, 0x1c, 0x00, 0x10, 0x00, 0x1c, 0x00, 0x30, 0x00, 0x12, 0x00, 0x30, 0x00,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceVariant {
    Atsha204a,
    Atecc508a,
    Atecc608a,
}

impl DeviceVariant {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceVariant::Atsha204a => "ATSHA204A",
            DeviceVariant::Atecc508a => "ATECC508A",
            DeviceVariant::Atecc608a => "ATECC608A",
        }
    }

    /// Configuration zone image written before the zone is locked.
    pub fn config_payload(&self) -> &'static [u8] {
        match self {
            DeviceVariant::Atsha204a => &ATSHA204A_CONFIG,
            DeviceVariant::Atecc508a => &ATECC508A_CONFIG,
            DeviceVariant::Atecc608a => &ATECC608A_CONFIG,
        }
    }

    /// Bus addresses to probe, in order.
    pub fn addresses(&self) -> &'static [u8] {
        match self {
            DeviceVariant::Atsha204a => &[ATSHA204A_ADDRESS],
            DeviceVariant::Atecc508a => &[ATECC508A_ADDRESS],
            DeviceVariant::Atecc608a => &[ATECC608A_DEFAULT_ADDRESS, ATECC608A_ADDRESS],
        }
    }

    /// Whether individual data slots can be locked after the data zone.
    pub fn supports_slot_lock(&self) -> bool {
        !matches!(self, DeviceVariant::Atsha204a)
    }

    /// Address the device answers on after its configuration zone has been
    /// written, if the write moves it.
    pub fn configured_address(&self) -> Option<u8> {
        match self {
            DeviceVariant::Atecc608a => Some(self.config_payload()[I2C_ADDRESS_OFFSET]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_sizes_match_device_family() {
        assert_eq!(DeviceVariant::Atsha204a.config_payload().len(), 88);
        assert_eq!(DeviceVariant::Atecc508a.config_payload().len(), 128);
        assert_eq!(DeviceVariant::Atecc608a.config_payload().len(), 128);
    }

    #[test]
    fn only_608a_moves_address() {
        assert_eq!(DeviceVariant::Atecc608a.configured_address(), Some(ATECC608A_ADDRESS));
        assert_eq!(DeviceVariant::Atecc508a.configured_address(), None);
        assert_eq!(DeviceVariant::Atsha204a.configured_address(), None);
    }

    #[test]
    fn sha_family_has_no_slot_locks() {
        assert!(!DeviceVariant::Atsha204a.supports_slot_lock());
        assert!(DeviceVariant::Atecc508a.supports_slot_lock());
        assert!(DeviceVariant::Atecc608a.supports_slot_lock());
    }
}
