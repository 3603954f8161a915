//! Controller configuration.
//!
//! The constants below are the build-time defaults. [`Config`] carries the
//! values the controller actually uses and can be adjusted per board.

use crate::{error::Error, feedback::Polarity};

/// Key slot holding the diversified authentication key.
pub const AUTH_KEY_SLOT: u16 = 6;

/// Minimum number of ticks between two authentication cycles.
pub const AUTHENTICATION_MIN_TICKS: u32 = 1500;

/// Width of the random window added on top of [`AUTHENTICATION_MIN_TICKS`].
pub const AUTHENTICATION_RANGE_TICKS: u32 = 3000;

/// Host nonce (`NumIn`) size in bytes.
pub const NONCE_SIZE: usize = 20;

/// Symmetric key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Device serial number size in bytes.
pub const SERIAL_SIZE: usize = 9;

/// Number of key slots in the data zone.
pub const SLOT_COUNT: u16 = 16;

pub const LED_SHORT_DELAY_TICKS: u16 = 200;
pub const LED_LONG_DELAY_TICKS: u16 = 1000;

/// Upper bound on polls of a single analog conversion before entropy
/// collection gives up.
pub const ADC_MAX_POLLS: u32 = 100_000;

const _: () = assert!(AUTHENTICATION_MIN_TICKS > 0, "authentication interval must be non-zero");
const _: () = assert!(AUTHENTICATION_RANGE_TICKS > 0, "authentication range must be non-zero");
const _: () = assert!(AUTH_KEY_SLOT < SLOT_COUNT, "key slot out of range");
const _: () = assert!(NONCE_SIZE == 20, "NumIn is fixed at 20 bytes");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub key_slot: u16,
    pub auth_min_ticks: u32,
    pub auth_range_ticks: u32,
    pub indicator_polarity: Polarity,
    /// `None` waits for each analog conversion forever.
    pub adc_max_polls: Option<u32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            key_slot: AUTH_KEY_SLOT,
            auth_min_ticks: AUTHENTICATION_MIN_TICKS,
            auth_range_ticks: AUTHENTICATION_RANGE_TICKS,
            indicator_polarity: Polarity::ActiveLow,
            adc_max_polls: Some(ADC_MAX_POLLS),
        }
    }
}

impl Config {
    /// Selects the authentication key slot. Slots beyond the element's
    /// sixteen are rejected here rather than failing every cycle later.
    pub fn with_key_slot(mut self, slot: u16) -> Result<Self, Error> {
        if slot >= SLOT_COUNT {
            return Err(Error::InvalidKeySlot { slot });
        }
        self.key_slot = slot;
        Ok(self)
    }

    /// Sets the re-authentication window. Zero values are clamped to one tick.
    pub fn with_auth_interval(mut self, min_ticks: u32, range_ticks: u32) -> Self {
        self.auth_min_ticks = min_ticks.max(1);
        self.auth_range_ticks = range_ticks.max(1);
        self
    }

    pub fn with_indicator_polarity(mut self, polarity: Polarity) -> Self {
        self.indicator_polarity = polarity;
        self
    }

    pub fn with_adc_max_polls(mut self, polls: Option<u32>) -> Self {
        self.adc_max_polls = polls;
        self
    }
}
