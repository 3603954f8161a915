//! One-time personalization of the secure element.
//!
//! Every step is guarded by the element's own lock flags, so the workflow
//! can run on every boot: completed steps are skipped, and a step that
//! failed before its lock committed is simply retried after the next reset.
//!
//! Order of operations:
//! - find the element on the bus
//! - if the configuration zone is open: wait for the operator, write the
//!   variant's configuration image, lock the zone
//! - if the data zone is open: derive the per-device key from the shared
//!   secret and the serial, write it to the key slot, lock the data zone and
//!   (where supported) the slot, then wait for the operator once more

use {
    crate::{
        console::{Console, StatusLine},
        element::{SecureElement, Zone},
        error::Error,
        feedback::{Feedback, PROVISION},
        input::{wait_for_confirmation, ConfirmInput},
        secret::{SharedSecret, TempKeySeed},
        variant::DeviceVariant,
    },
    core::fmt::Write,
    embedded_hal::digital::v2::OutputPin,
};

/// Probes the variant's addresses in order and keeps the first that answers.
pub fn detect<E: SecureElement>(element: &mut E, variant: DeviceVariant) -> Result<u8, Error> {
    for address in variant.addresses() {
        match element.probe(*address) {
            Ok(()) => {
                log::debug!("{} found at 0x{:02x}", variant.name(), address);
                return Ok(*address);
            }
            Err(status) => log::debug!("no answer at 0x{:02x}: {}", address, status),
        }
    }
    Err(Error::DeviceNotFound)
}

pub fn provision<E, C, L, W>(
    element: &mut E,
    variant: DeviceVariant,
    slot: u16,
    secret: impl FnOnce() -> SharedSecret,
    feedback: &Feedback<L>,
    confirm: &mut C,
    console: &mut Console<W>,
) -> Result<(), Error>
where
    E: SecureElement,
    C: ConfirmInput,
    L: OutputPin,
    W: Write,
{
    let address = detect(element, variant)?;

    if !element.is_locked(Zone::Config)? {
        console.report(StatusLine::NotProvisioned);
        feedback.select(Some(PROVISION));
        wait_for_confirmation(confirm);

        element.write_config(variant.config_payload())?;
        if let Some(moved) = variant.configured_address() {
            if moved != address {
                log::debug!("element moved to 0x{:02x}", moved);
                element.probe(moved).map_err(|_| Error::DeviceNotFound)?;
            }
        }
        element.lock_config()?;
        log::info!("configuration zone locked");
    }

    if !element.is_locked(Zone::Data)? {
        let serial = element.read_serial()?;
        log::info!("provisioning slot {} of {}", slot, serial);

        let secret = secret();
        let temp_key = TempKeySeed::from_serial(&serial);
        let key = element.derive_key(slot, &secret, &serial, &temp_key)?;
        drop(secret);

        element.write_slot(slot, key.as_bytes())?;
        drop(key);

        element.lock_data()?;
        if variant.supports_slot_lock() {
            element.lock_slot(slot)?;
        }
        log::info!("data zone locked");

        feedback.select(None);
        console.report(StatusLine::Provisioned);
        wait_for_confirmation(confirm);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            console::NullSink,
            error::Status,
            model::{Op, OpKind, SoftElement},
            secret::DeviceSerial,
        },
        core::convert::Infallible,
    };

    struct NullPin;

    impl OutputPin for NullPin {
        type Error = Infallible;

        fn set_low(&mut self) -> Result<(), Infallible> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    /// Confirms on every second read: released, pressed, released, ...
    fn toggling() -> impl FnMut() -> bool {
        let mut pressed = true;
        move || {
            pressed = !pressed;
            pressed
        }
    }

    fn run(se: &mut SoftElement, variant: DeviceVariant) -> Result<(), Error> {
        let feedback = Feedback::new(NullPin, crate::feedback::Polarity::ActiveLow);
        let mut console = Console::new(NullSink);
        provision(
            se,
            variant,
            6,
            SharedSecret::compiled_in,
            &feedback,
            &mut toggling(),
            &mut console,
        )
    }

    const SERIAL: DeviceSerial = DeviceSerial([0x01, 0x23, 1, 2, 3, 4, 5, 6, 0xee]);

    #[test]
    fn missing_device_is_reported() {
        let mut se = SoftElement::new(SERIAL, 0x10);
        assert_eq!(run(&mut se, DeviceVariant::Atecc508a), Err(Error::DeviceNotFound));
    }

    #[test]
    fn failed_config_lock_is_retried_on_next_boot() {
        let mut se = SoftElement::new(SERIAL, 0xC0);
        se.fail_next(OpKind::LockConfig, Status::COMM_FAIL);
        assert_eq!(
            run(&mut se, DeviceVariant::Atecc508a),
            Err(Error::DeviceIo(Status::COMM_FAIL))
        );
        assert!(!se.is_config_locked());
        assert!(!se.journal().iter().any(|op| matches!(op, Op::WriteSlot(_))));

        // next boot retries and completes
        se.reset_session();
        assert_eq!(run(&mut se, DeviceVariant::Atecc508a), Ok(()));
        assert!(se.is_config_locked() && se.is_data_locked());
    }

    #[test]
    fn sha_variant_skips_slot_lock() {
        let mut se = SoftElement::new(SERIAL, 0xC8);
        assert_eq!(run(&mut se, DeviceVariant::Atsha204a), Ok(()));
        assert!(se.is_data_locked());
        assert!(!se.is_slot_locked(6));
        assert!(!se.journal().iter().any(|op| matches!(op, Op::LockSlot(_))));
    }

    #[test]
    fn ecc608_follows_its_new_address() {
        let mut se = SoftElement::new(SERIAL, 0xC0).following_config_address();
        assert_eq!(run(&mut se, DeviceVariant::Atecc608a), Ok(()));
        assert_eq!(se.address(), crate::variant::ATECC608A_ADDRESS);
        assert!(se.is_slot_locked(6));

        // after a reset the element only answers on the new address
        se.reset_session();
        se.clear_journal();
        assert_eq!(run(&mut se, DeviceVariant::Atecc608a), Ok(()));
        assert_eq!(se.journal()[..2], [Op::Probe(0xC0), Op::Probe(0x6C)]);
    }
}
