//! Indicator patterns reflecting the controller state on a single LED.
//!
//! [`Player`] walks a [`Pattern`] one tick at a time. [`Feedback`] wraps it
//! in a critical section so that [`Feedback::select`] can be called from the
//! main loop while [`Feedback::tick`] runs from the timer interrupt.

use {
    crate::config::{LED_LONG_DELAY_TICKS, LED_SHORT_DELAY_TICKS},
    core::cell::RefCell,
    embedded_hal::digital::v2::OutputPin,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Drive the indicator, then stay silent for `ticks` ticks.
    /// `ticks == 0` ends the pattern.
    Level { on: bool, ticks: u16 },
    /// Sentinel: restart from the first step.
    Repeat,
}

impl Step {
    pub const fn on(ticks: u16) -> Self {
        Step::Level { on: true, ticks }
    }

    pub const fn off(ticks: u16) -> Self {
        Step::Level { on: false, ticks }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pattern {
    pub name: &'static str,
    pub steps: &'static [Step],
}

const SHORT: u16 = LED_SHORT_DELAY_TICKS;
const LONG: u16 = LED_LONG_DELAY_TICKS;

/// Waiting for the operator to confirm provisioning.
pub const PROVISION: Pattern = Pattern {
    name: "provision",
    steps: &[Step::on(SHORT), Step::off(SHORT), Step::off(LONG), Step::Repeat],
};

pub const SUCCESS: Pattern = Pattern {
    name: "success",
    steps: &[
        Step::on(SHORT),
        Step::off(SHORT),
        Step::on(SHORT),
        Step::off(SHORT),
        Step::off(LONG),
        Step::Repeat,
    ],
};

pub const FAIL: Pattern = Pattern {
    name: "fail",
    steps: &[
        Step::on(SHORT),
        Step::off(SHORT),
        Step::on(SHORT),
        Step::off(SHORT),
        Step::on(SHORT),
        Step::off(SHORT),
        Step::off(LONG),
        Step::Repeat,
    ],
};

/// Logic level that lights the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    fn pin_high(&self, on: bool) -> bool {
        match self {
            Polarity::ActiveHigh => on,
            Polarity::ActiveLow => !on,
        }
    }
}

pub struct Player<L> {
    led: L,
    polarity: Polarity,
    pattern: Option<Pattern>,
    index: usize,
    remaining: u16,
}

impl<L: OutputPin> Player<L> {
    pub fn new(led: L, polarity: Polarity) -> Self {
        Self {
            led,
            polarity,
            pattern: None,
            index: 0,
            remaining: 0,
        }
    }

    fn drive(&mut self, on: bool) {
        if self.polarity.pin_high(on) {
            self.led.set_high().ok();
        } else {
            self.led.set_low().ok();
        }
    }

    /// Switches to `pattern`. Re-selecting the active pattern keeps its
    /// position; `None` turns the indicator off immediately.
    pub fn select(&mut self, pattern: Option<Pattern>) {
        if pattern.is_none() {
            self.drive(false);
        }

        if self.pattern != pattern {
            self.pattern = pattern;
            self.index = 0;
            self.remaining = 0;
        }
    }

    pub fn tick(&mut self) {
        if self.remaining > 0 {
            self.remaining -= 1;
            return;
        }

        let Some(pattern) = self.pattern else {
            return;
        };

        match pattern.steps.get(self.index) {
            Some(Step::Level { on, ticks }) => {
                self.drive(*on);
                if *ticks == 0 {
                    self.select(None);
                    return;
                }
                self.remaining = *ticks;
                self.index += 1;
                if matches!(pattern.steps.get(self.index), Some(Step::Repeat) | None) {
                    self.index = 0;
                }
            }
            // Only reachable for a pattern with no drivable first step.
            Some(Step::Repeat) | None => self.select(None),
        }
    }

    pub fn pattern(&self) -> Option<Pattern> {
        self.pattern
    }

    /// Current step index and remaining silent ticks.
    pub fn position(&self) -> (usize, u16) {
        (self.index, self.remaining)
    }

    pub fn led(&self) -> &L {
        &self.led
    }
}

/// [`Player`] shared between the main loop and the tick interrupt.
pub struct Feedback<L> {
    player: critical_section::Mutex<RefCell<Player<L>>>,
}

impl<L: OutputPin> Feedback<L> {
    pub fn new(led: L, polarity: Polarity) -> Self {
        let mut player = Player::new(led, polarity);
        player.drive(false);
        Self {
            player: critical_section::Mutex::new(RefCell::new(player)),
        }
    }

    pub fn select(&self, pattern: Option<Pattern>) {
        if let Some(p) = pattern {
            log::debug!("feedback pattern: {}", p.name);
        }
        self.with(|player| player.select(pattern));
    }

    pub fn tick(&self) {
        self.with(|player| player.tick());
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut Player<L>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.player.borrow(cs).borrow_mut()))
    }
}
