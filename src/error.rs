//! Device status codes and the controller error taxonomy.

use crate::entropy::SeedChannel;

/// Raw one-byte status code reported by the secure element or its transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status(pub u8);

impl Status {
    pub const SUCCESS: Status = Status(0x00);
    pub const CONFIG_ZONE_LOCKED: Status = Status(0x01);
    pub const DATA_ZONE_LOCKED: Status = Status(0x02);
    pub const CHECKMAC_VERIFY_FAILED: Status = Status(0xD1);
    pub const EXECUTION_ERROR: Status = Status(0xD5);
    pub const BAD_PARAM: Status = Status(0xE2);
    pub const INVALID_SIZE: Status = Status(0xE4);
    pub const COMM_FAIL: Status = Status(0xF0);
    pub const NOT_LOCKED: Status = Status(0xF8);
    pub const NO_DEVICES: Status = Status(0xF9);

    /// Negative verdict of a challenge/response exchange.
    pub fn is_checkmac_fail(&self) -> bool {
        *self == Self::CHECKMAC_VERIFY_FAILED
    }
}

impl core::fmt::Display for Status {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "status 0x{:02x}", self.0)
    }
}

pub trait StatusIntoResult {
    fn into_result(self) -> Result<(), Status>;
}

impl StatusIntoResult for u8 {
    fn into_result(self) -> Result<(), Status> {
        if self == 0 {
            Ok(())
        } else {
            Err(Status(self))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// No secure element answered on any of the variant's bus addresses.
    #[error("secure element not found")]
    DeviceNotFound,
    /// A read, write or lock transaction failed.
    #[error("secure element i/o failed: {0}")]
    DeviceIo(Status),
    /// The challenge/response verdict did not match. Not a fault.
    #[error("verification failed")]
    VerificationFailed,
    #[error("analog conversion on {channel:?} timed out")]
    EntropyTimeout { channel: SeedChannel },
    #[error("analog conversion on {channel:?} failed")]
    EntropySource { channel: SeedChannel },
    /// The configured key slot does not exist on the element.
    #[error("key slot {slot} out of range")]
    InvalidKeySlot { slot: u16 },
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        if status.is_checkmac_fail() {
            Error::VerificationFailed
        } else {
            Error::DeviceIo(status)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_codes_convert() {
        assert_eq!(0u8.into_result(), Ok(()));
        assert_eq!(0xF0u8.into_result(), Err(Status::COMM_FAIL));
    }

    #[test]
    fn checkmac_failure_is_a_verdict() {
        assert_eq!(Error::from(Status::CHECKMAC_VERIFY_FAILED), Error::VerificationFailed);
        assert_eq!(Error::from(Status::COMM_FAIL), Error::DeviceIo(Status::COMM_FAIL));
    }
}
