// SPDX-FileCopyrightText: 2024 Foundation Devices, Inc. <hello@foundationdevices.com>
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Runs the controller on the host against the software element model.
//!
//! Usage: `simulator [atsha204a|atecc508a|atecc608a] [cycles]`

use {
    authgate::{
        entropy::{AnalogSource, SeedChannel},
        logging::{init_logging, SinkLogger},
        model::SoftElement,
        secret::DeviceSerial,
        AuthState,
        Config,
        Context,
        Controller,
        DeviceVariant,
    },
    core::convert::Infallible,
    embedded_hal::digital::v2::OutputPin,
    std::{
        io::Write as _,
        process::ExitCode,
        sync::atomic::Ordering,
        thread,
        time::{Duration, SystemTime, UNIX_EPOCH},
    },
};

const TICK: Duration = Duration::from_millis(1);
const OPERATOR_DELAY: Duration = Duration::from_millis(750);

static LOGGER: SinkLogger<Stdout> = SinkLogger::new(log::LevelFilter::Debug);

/// Samples the wall clock; settles after a few polls like a real converter.
struct ClockAdc {
    pending: u8,
}

impl AnalogSource for ClockAdc {
    type Error = Infallible;

    fn start_conversion(&mut self, _channel: SeedChannel) {
        self.pending = 3;
    }

    fn read(&mut self, _channel: SeedChannel) -> nb::Result<u16, Infallible> {
        if self.pending > 0 {
            self.pending -= 1;
            return Err(nb::Error::WouldBlock);
        }
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Ok((nanos ^ (nanos >> 11)) as u16)
    }
}

/// Indicator that prints level changes.
struct ConsoleLed {
    lit: Option<bool>,
}

impl ConsoleLed {
    fn show(&mut self, lit: bool) {
        if self.lit != Some(lit) {
            self.lit = Some(lit);
            println!("LED {}", if lit { "*" } else { "." });
        }
    }
}

// Wired active-low, see `Config::default`.
impl OutputPin for ConsoleLed {
    type Error = Infallible;

    fn set_low(&mut self) -> Result<(), Infallible> {
        self.show(true);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.show(false);
        Ok(())
    }
}

struct Stdout;

impl core::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut out = std::io::stdout().lock();
        out.write_all(s.as_bytes()).map_err(|_| core::fmt::Error)?;
        out.flush().map_err(|_| core::fmt::Error)
    }
}

/// An operator who presses confirm a little while after being asked.
fn patient_operator() -> impl FnMut() -> bool {
    let mut pressed = true;
    move || {
        pressed = !pressed;
        if pressed {
            thread::sleep(OPERATOR_DELAY);
        }
        pressed
    }
}

fn parse_variant(arg: Option<&str>) -> Option<DeviceVariant> {
    match arg {
        None | Some("atecc608a") => Some(DeviceVariant::Atecc608a),
        Some("atecc508a") => Some(DeviceVariant::Atecc508a),
        Some("atsha204a") => Some(DeviceVariant::Atsha204a),
        Some(_) => None,
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(variant) = parse_variant(args.first().map(String::as_str)) else {
        eprintln!("unknown device variant, expected atsha204a, atecc508a or atecc608a");
        return ExitCode::FAILURE;
    };
    let cycles: u32 = match args.get(1).map(|s| s.parse()) {
        None => 3,
        Some(Ok(n)) => n,
        Some(Err(e)) => {
            eprintln!("invalid cycle count: {e}");
            return ExitCode::FAILURE;
        }
    };

    let config = Config::default();
    let ctx = match Context::from_entropy(&mut ClockAdc { pending: 0 }, ConsoleLed { lit: None }, &config) {
        Ok(ctx) => &*Box::leak(Box::new(ctx)),
        Err(e) => {
            eprintln!("entropy collection failed: {e}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&LOGGER, Stdout, Some(ctx.uptime()));

    thread::spawn(move || loop {
        ctx.on_tick();
        thread::sleep(TICK);
    });

    let serial = DeviceSerial([0x01, 0x23, 0x5a, 0x17, 0xc4, 0x02, 0x9e, 0x61, 0xee]);
    let address = variant.addresses()[0];
    let mut element = SoftElement::new(serial, address);
    if variant.configured_address().is_some() {
        element = element.following_config_address();
    }

    let mut controller = Controller::new(ctx, element, variant, patient_operator(), Stdout, &config);
    controller.boot(|_| thread::sleep(TICK));

    let mut passed = 0;
    while passed < cycles {
        let before = ctx.uptime().load(Ordering::Relaxed);
        if ctx.trigger().is_armed() {
            if controller.poll() == AuthState::Authenticated {
                passed += 1;
                log::info!("periodic check {} passed at tick {}", passed, before);
            } else {
                log::error!("periodic check failed");
                return ExitCode::FAILURE;
            }
        }
        thread::sleep(TICK * 10);
    }

    ExitCode::SUCCESS
}
