//! Capability interface of the secure element.
//!
//! The controller only ever talks to the element through [`SecureElement`].
//! A driver for real silicon implements the bus transactions; [`crate::model`]
//! provides a software model for host testing.

use {
    crate::{
        config::KEY_SIZE,
        error::Status,
        host,
        secret::{DeviceSerial, DiversifiedKey, HostNonce, SharedSecret, TempKeySeed},
    },
    bitflags::bitflags,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Config,
    Data,
}

bitflags! {
    /// Lock flags persisted in the element. These are the only record of
    /// whether the device has been provisioned.
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct LockState: u8 {
        const CONFIG = 1 << 0;
        const DATA = 1 << 1;
    }
}

impl LockState {
    pub fn is_provisioned(&self) -> bool {
        self.contains(LockState::CONFIG | LockState::DATA)
    }
}

pub trait SecureElement {
    /// Opens a session at `address`. On success the address is kept for all
    /// following transactions.
    fn probe(&mut self, address: u8) -> Result<(), Status>;

    fn is_locked(&mut self, zone: Zone) -> Result<bool, Status>;

    fn write_config(&mut self, config: &[u8]) -> Result<(), Status>;

    fn lock_config(&mut self) -> Result<(), Status>;

    fn read_serial(&mut self) -> Result<DeviceSerial, Status>;

    /// Computes the key the element's DeriveKey command would place in `slot`.
    fn derive_key(
        &mut self,
        slot: u16,
        parent: &SharedSecret,
        serial: &DeviceSerial,
        temp_key: &TempKeySeed,
    ) -> Result<DiversifiedKey, Status> {
        Ok(host::derive_key(slot, parent, serial, temp_key))
    }

    fn write_slot(&mut self, slot: u16, key: &[u8; KEY_SIZE]) -> Result<(), Status>;

    fn lock_data(&mut self) -> Result<(), Status>;

    fn lock_slot(&mut self, slot: u16) -> Result<(), Status>;

    /// Runs the challenge/response exchange against the key in `slot`.
    /// A negative verdict is reported as [`Status::CHECKMAC_VERIFY_FAILED`].
    fn authenticate(
        &mut self,
        slot: u16,
        parent: &SharedSecret,
        nonce: &HostNonce,
    ) -> Result<(), Status>;

    fn lock_state(&mut self) -> Result<LockState, Status> {
        let mut state = LockState::empty();
        state.set(LockState::CONFIG, self.is_locked(Zone::Config)?);
        state.set(LockState::DATA, self.is_locked(Zone::Data)?);
        Ok(state)
    }
}

impl<T: SecureElement + ?Sized> SecureElement for &mut T {
    fn probe(&mut self, address: u8) -> Result<(), Status> {
        (**self).probe(address)
    }

    fn is_locked(&mut self, zone: Zone) -> Result<bool, Status> {
        (**self).is_locked(zone)
    }

    fn write_config(&mut self, config: &[u8]) -> Result<(), Status> {
        (**self).write_config(config)
    }

    fn lock_config(&mut self) -> Result<(), Status> {
        (**self).lock_config()
    }

    fn read_serial(&mut self) -> Result<DeviceSerial, Status> {
        (**self).read_serial()
    }

    fn derive_key(
        &mut self,
        slot: u16,
        parent: &SharedSecret,
        serial: &DeviceSerial,
        temp_key: &TempKeySeed,
    ) -> Result<DiversifiedKey, Status> {
        (**self).derive_key(slot, parent, serial, temp_key)
    }

    fn write_slot(&mut self, slot: u16, key: &[u8; KEY_SIZE]) -> Result<(), Status> {
        (**self).write_slot(slot, key)
    }

    fn lock_data(&mut self) -> Result<(), Status> {
        (**self).lock_data()
    }

    fn lock_slot(&mut self, slot: u16) -> Result<(), Status> {
        (**self).lock_slot(slot)
    }

    fn authenticate(
        &mut self,
        slot: u16,
        parent: &SharedSecret,
        nonce: &HostNonce,
    ) -> Result<(), Status> {
        (**self).authenticate(slot, parent, nonce)
    }
}
