//! Boot-time seed collection and the host pseudo-random generator.
//!
//! The seed is built from the low byte of four noisy analog readings. The
//! generator it feeds is not cryptographically secure; it only provides the
//! re-authentication jitter and the host half of the challenge, the element
//! mixes in its own random value.

use {
    crate::{config::NONCE_SIZE, error::Error, secret::HostNonce},
    rand::{rngs::SmallRng, Rng, RngCore, SeedableRng},
};

/// Analog inputs sampled for the seed, in packing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedChannel {
    Temperature,
    ScaledCoreVcc,
    ScaledIoVcc,
    Bandgap,
}

impl SeedChannel {
    pub const ALL: [SeedChannel; 4] = [
        SeedChannel::Temperature,
        SeedChannel::ScaledCoreVcc,
        SeedChannel::ScaledIoVcc,
        SeedChannel::Bandgap,
    ];
}

/// An ADC able to sample the seed channels.
pub trait AnalogSource {
    type Error: core::fmt::Debug;

    fn start_conversion(&mut self, channel: SeedChannel);

    /// Returns `WouldBlock` until the conversion started last has finished.
    fn read(&mut self, channel: SeedChannel) -> nb::Result<u16, Self::Error>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seed(pub u32);

fn convert<A: AnalogSource>(
    adc: &mut A,
    channel: SeedChannel,
    max_polls: Option<u32>,
) -> Result<u16, Error> {
    adc.start_conversion(channel);
    let mut polls = 0u32;
    loop {
        match adc.read(channel) {
            Ok(value) => return Ok(value),
            Err(nb::Error::WouldBlock) => {}
            Err(nb::Error::Other(e)) => {
                log::error!("conversion on {:?} failed: {:?}", channel, e);
                return Err(Error::EntropySource { channel });
            }
        }
        polls = polls.saturating_add(1);
        if let Some(max) = max_polls {
            if polls >= max {
                log::error!("conversion on {:?} timed out after {} polls", channel, polls);
                return Err(Error::EntropyTimeout { channel });
            }
        }
        core::hint::spin_loop();
    }
}

/// Samples every [`SeedChannel`] once and packs the low byte of reading `i`
/// at bit offset `8 * i`.
pub fn init_entropy<A: AnalogSource>(adc: &mut A, max_polls: Option<u32>) -> Result<Seed, Error> {
    let mut seed = 0u32;
    for (i, channel) in SeedChannel::ALL.iter().enumerate() {
        let value = convert(adc, *channel, max_polls)?;
        seed |= u32::from(value & 0x00FF) << (8 * i);
    }
    log::debug!("entropy collected");
    Ok(Seed(seed))
}

pub struct HostRng {
    rng: SmallRng,
}

impl HostRng {
    pub fn new(seed: Seed) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(u64::from(seed.0)),
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    /// Fills `out` with successive 4-byte draws; the last draw is truncated
    /// when the length is not a multiple of four.
    pub fn generate_random_block(&mut self, out: &mut [u8]) {
        for chunk in out.chunks_mut(4) {
            let draw = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&draw[..chunk.len()]);
        }
    }

    pub fn host_nonce(&mut self) -> HostNonce {
        let mut nonce = [0u8; NONCE_SIZE];
        self.generate_random_block(&mut nonce);
        HostNonce(nonce)
    }

    /// Draws the number of ticks until the next authentication cycle,
    /// uniform in `min..min + range`.
    pub fn auth_interval(&mut self, min: u32, range: u32) -> u32 {
        let jitter = if range == 0 {
            0
        } else {
            self.rng.random_range(0..range)
        };
        min.max(1).saturating_add(jitter)
    }
}
