#![allow(dead_code)]

use {
    authgate::{
        console::Console,
        feedback::{Feedback, Polarity},
        model::SoftElement,
        provision::provision,
        secret::{DeviceSerial, SharedSecret},
        DeviceVariant,
        Error,
    },
    core::convert::Infallible,
    embedded_hal::digital::v2::OutputPin,
    std::{cell::Cell, string::String, vec::Vec},
};

pub const SERIAL: DeviceSerial = DeviceSerial([0x01, 0x23, 0x71, 0x0a, 0x3c, 0x55, 0x90, 0x08, 0xee]);

/// Indicator that keeps every level written, `true` meaning pin high.
#[derive(Default)]
pub struct RecordingPin {
    pub writes: Vec<bool>,
}

impl OutputPin for RecordingPin {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.writes.push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.writes.push(true);
        Ok(())
    }
}

/// Operator that presses and releases confirm in turn, counting presses.
pub fn operator(presses: &Cell<u32>) -> impl FnMut() -> bool + '_ {
    let mut pressed = true;
    move || {
        pressed = !pressed;
        if pressed {
            presses.set(presses.get() + 1);
        }
        pressed
    }
}

/// Operator that must never be asked.
pub fn absent_operator() -> impl FnMut() -> bool {
    || -> bool { panic!("operator was asked to confirm") }
}

pub struct Run {
    pub result: Result<(), Error>,
    pub presses: u32,
    pub console: String,
    pub feedback: Feedback<RecordingPin>,
}

pub fn run_provisioning(element: &mut SoftElement, variant: DeviceVariant) -> Run {
    let presses = Cell::new(0);
    let feedback = Feedback::new(RecordingPin::default(), Polarity::ActiveLow);
    let mut console = Console::new(String::new());
    let result = provision(
        element,
        variant,
        6,
        SharedSecret::compiled_in,
        &feedback,
        &mut operator(&presses),
        &mut console,
    );
    Run {
        result,
        presses: presses.get(),
        console: console.sink().clone(),
        feedback,
    }
}
