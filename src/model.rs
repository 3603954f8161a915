//! Software model of a secure element.
//!
//! [`SoftElement`] enforces the same one-way zone rules as the silicon:
//! the configuration zone is writable until locked, slots are writable only
//! once the configuration is locked and until the data zone is locked, and
//! authentication requires a locked data zone. Every transaction is recorded
//! in a fixed-size journal so tests can check call ordering.

use {
    crate::{
        config::{KEY_SIZE, SLOT_COUNT},
        element::{SecureElement, Zone},
        error::Status,
        host,
        secret::{DeviceSerial, HostNonce, SharedSecret, TempKeySeed},
    },
    sha2::{Digest, Sha256},
};

const CONFIG_ZONE_SIZE: usize = 128;
const JOURNAL_CAPACITY: usize = 64;
const I2C_ADDRESS_OFFSET: usize = 16;

/// One transaction seen by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Probe(u8),
    IsLocked(Zone),
    WriteConfig,
    LockConfig,
    ReadSerial,
    WriteSlot(u16),
    LockData,
    LockSlot(u16),
    Authenticate(u16),
}

/// Transaction kinds that can be made to fail once with [`SoftElement::fail_next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    IsLocked,
    WriteConfig,
    LockConfig,
    ReadSerial,
    WriteSlot,
    LockData,
    LockSlot,
    Authenticate,
}

pub struct SoftElement {
    serial: DeviceSerial,
    address: u8,
    session: Option<u8>,
    follow_config_address: bool,
    config: [u8; CONFIG_ZONE_SIZE],
    config_written: bool,
    config_locked: bool,
    data_locked: bool,
    slots: [[u8; KEY_SIZE]; SLOT_COUNT as usize],
    slot_locks: u16,
    rng_counter: u32,
    fault: Option<(OpKind, Status)>,
    journal: [Op; JOURNAL_CAPACITY],
    journal_len: usize,
}

impl SoftElement {
    /// Creates a blank, unlocked element answering on `address`.
    pub fn new(serial: DeviceSerial, address: u8) -> Self {
        Self {
            serial,
            address,
            session: None,
            follow_config_address: false,
            config: [0; CONFIG_ZONE_SIZE],
            config_written: false,
            config_locked: false,
            data_locked: false,
            slots: [[0; KEY_SIZE]; SLOT_COUNT as usize],
            slot_locks: 0,
            rng_counter: 0,
            fault: None,
            journal: [Op::Probe(0); JOURNAL_CAPACITY],
            journal_len: 0,
        }
    }

    /// Makes the element move to the address stored at byte 16 of the
    /// configuration zone once it is written, as the ATECC608A does.
    pub fn following_config_address(mut self) -> Self {
        self.follow_config_address = true;
        self
    }

    /// Element whose configuration zone is already locked but whose data
    /// zone is still open.
    pub fn config_locked(mut self) -> Self {
        self.config_written = true;
        self.config_locked = true;
        self
    }

    /// Fully provisioned element holding the key diversified from `secret`
    /// in `slot`.
    pub fn provisioned(mut self, secret: &SharedSecret, slot: u16) -> Self {
        let key = host::derive_key(
            slot,
            secret,
            &self.serial,
            &TempKeySeed::from_serial(&self.serial),
        );
        self.slots[slot as usize] = *key.as_bytes();
        self.config_written = true;
        self.config_locked = true;
        self.data_locked = true;
        self.slot_locks |= 1 << slot;
        self
    }

    /// Fails the next transaction of `kind` with `status`.
    pub fn fail_next(&mut self, kind: OpKind, status: Status) {
        self.fault = Some((kind, status));
    }

    pub fn journal(&self) -> &[Op] {
        &self.journal[..self.journal_len]
    }

    pub fn clear_journal(&mut self) {
        self.journal_len = 0;
    }

    /// Drops the bus session, as a reset of the host would.
    pub fn reset_session(&mut self) {
        self.session = None;
    }

    pub fn serial(&self) -> DeviceSerial {
        self.serial
    }

    pub fn address(&self) -> u8 {
        self.address
    }

    pub fn slot(&self, slot: u16) -> &[u8; KEY_SIZE] {
        &self.slots[slot as usize]
    }

    pub fn config_zone(&self) -> &[u8; CONFIG_ZONE_SIZE] {
        &self.config
    }

    pub fn is_config_locked(&self) -> bool {
        self.config_locked
    }

    pub fn is_data_locked(&self) -> bool {
        self.data_locked
    }

    pub fn is_slot_locked(&self, slot: u16) -> bool {
        self.slot_locks & (1 << slot) != 0
    }

    fn record(&mut self, op: Op) {
        if self.journal_len < JOURNAL_CAPACITY {
            self.journal[self.journal_len] = op;
            self.journal_len += 1;
        }
    }

    fn begin(&mut self, op: Op, kind: OpKind) -> Result<(), Status> {
        self.record(op);
        if self.session != Some(self.address) {
            return Err(Status::COMM_FAIL);
        }
        match self.fault {
            Some((fault, status)) if fault == kind => {
                self.fault = None;
                Err(status)
            }
            _ => Ok(()),
        }
    }

    fn check_slot(slot: u16) -> Result<usize, Status> {
        if slot < SLOT_COUNT {
            Ok(slot as usize)
        } else {
            Err(Status::BAD_PARAM)
        }
    }

    /// The element's own 32-byte random contribution to a nonce.
    fn next_random(&mut self) -> [u8; KEY_SIZE] {
        self.rng_counter = self.rng_counter.wrapping_add(1);
        let mut hasher = Sha256::new();
        hasher.update(self.serial.as_bytes());
        hasher.update(self.rng_counter.to_le_bytes());
        let mut out = [0u8; KEY_SIZE];
        out.copy_from_slice(hasher.finalize().as_slice());
        out
    }
}

impl SecureElement for SoftElement {
    fn probe(&mut self, address: u8) -> Result<(), Status> {
        self.record(Op::Probe(address));
        if address == self.address {
            self.session = Some(address);
            Ok(())
        } else {
            Err(Status::NO_DEVICES)
        }
    }

    fn is_locked(&mut self, zone: Zone) -> Result<bool, Status> {
        self.begin(Op::IsLocked(zone), OpKind::IsLocked)?;
        Ok(match zone {
            Zone::Config => self.config_locked,
            Zone::Data => self.data_locked,
        })
    }

    fn write_config(&mut self, config: &[u8]) -> Result<(), Status> {
        self.begin(Op::WriteConfig, OpKind::WriteConfig)?;
        if self.config_locked {
            return Err(Status::CONFIG_ZONE_LOCKED);
        }
        if config.is_empty() || config.len() > CONFIG_ZONE_SIZE {
            return Err(Status::INVALID_SIZE);
        }
        self.config[..config.len()].copy_from_slice(config);
        self.config_written = true;
        if self.follow_config_address && config.len() > I2C_ADDRESS_OFFSET {
            self.address = config[I2C_ADDRESS_OFFSET];
        }
        Ok(())
    }

    fn lock_config(&mut self) -> Result<(), Status> {
        self.begin(Op::LockConfig, OpKind::LockConfig)?;
        if self.config_locked {
            return Err(Status::CONFIG_ZONE_LOCKED);
        }
        if !self.config_written {
            return Err(Status::EXECUTION_ERROR);
        }
        self.config_locked = true;
        Ok(())
    }

    fn read_serial(&mut self) -> Result<DeviceSerial, Status> {
        self.begin(Op::ReadSerial, OpKind::ReadSerial)?;
        Ok(self.serial)
    }

    fn write_slot(&mut self, slot: u16, key: &[u8; KEY_SIZE]) -> Result<(), Status> {
        self.begin(Op::WriteSlot(slot), OpKind::WriteSlot)?;
        let index = Self::check_slot(slot)?;
        if !self.config_locked {
            return Err(Status::NOT_LOCKED);
        }
        if self.data_locked {
            return Err(Status::DATA_ZONE_LOCKED);
        }
        self.slots[index] = *key;
        Ok(())
    }

    fn lock_data(&mut self) -> Result<(), Status> {
        self.begin(Op::LockData, OpKind::LockData)?;
        if !self.config_locked {
            return Err(Status::NOT_LOCKED);
        }
        if self.data_locked {
            return Err(Status::DATA_ZONE_LOCKED);
        }
        self.data_locked = true;
        Ok(())
    }

    fn lock_slot(&mut self, slot: u16) -> Result<(), Status> {
        self.begin(Op::LockSlot(slot), OpKind::LockSlot)?;
        Self::check_slot(slot)?;
        if !self.data_locked {
            return Err(Status::NOT_LOCKED);
        }
        self.slot_locks |= 1 << slot;
        Ok(())
    }

    fn authenticate(
        &mut self,
        slot: u16,
        parent: &SharedSecret,
        nonce: &HostNonce,
    ) -> Result<(), Status> {
        self.begin(Op::Authenticate(slot), OpKind::Authenticate)?;
        let index = Self::check_slot(slot)?;
        if !self.data_locked {
            return Err(Status::EXECUTION_ERROR);
        }

        let rand_out = self.next_random();
        let temp_key = host::nonce_temp_key(&rand_out, nonce);
        let device_mac = host::mac(slot, &self.slots[index], &temp_key, &self.serial);

        let expected_key = host::derive_key(
            slot,
            parent,
            &self.serial,
            &TempKeySeed::from_serial(&self.serial),
        );
        let host_mac = host::mac(slot, expected_key.as_bytes(), &temp_key, &self.serial);

        if device_mac == host_mac {
            Ok(())
        } else {
            Err(Status::CHECKMAC_VERIFY_FAILED)
        }
    }
}
