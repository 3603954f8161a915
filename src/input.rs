//! Operator confirmation input.

use embedded_hal::digital::v2::InputPin;

/// A debounced "confirm" signal, polled by the provisioning workflow.
pub trait ConfirmInput {
    /// Returns `true` while the operator is pressing confirm.
    fn is_pressed(&mut self) -> bool;
}

impl<F: FnMut() -> bool> ConfirmInput for F {
    fn is_pressed(&mut self) -> bool {
        self()
    }
}

/// Push button on a GPIO. Read errors count as "not pressed".
pub struct Button<P> {
    pin: P,
    active_low: bool,
}

impl<P: InputPin> Button<P> {
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn active_high(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> ConfirmInput for Button<P> {
    fn is_pressed(&mut self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        level.unwrap_or(false)
    }
}

/// Blocks until a press edge: the input is first seen released, then pressed.
///
/// A button still held from an earlier confirmation therefore does not
/// confirm twice. There is no timeout, this wait requires a human.
pub fn wait_for_confirmation<C: ConfirmInput + ?Sized>(confirm: &mut C) {
    while confirm.is_pressed() {
        core::hint::spin_loop();
    }
    while !confirm.is_pressed() {
        core::hint::spin_loop();
    }
}
