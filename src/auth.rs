//! Periodic challenge/response authentication.

use {
    crate::{
        controller::Context,
        element::SecureElement,
        error::Error,
        feedback::{FAIL, SUCCESS},
        secret::SharedSecret,
    },
    core::sync::atomic::{AtomicBool, AtomicU32, Ordering},
    embedded_hal::digital::v2::OutputPin,
};

/// Volatile result of the last completed cycle. Never survives a reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    NotAuthenticated,
    Authenticated,
}

/// One-shot request for an authentication cycle.
///
/// Only the tick interrupt arms it and only the main loop takes it. Taking
/// is a single swap, so an arm landing mid-take is never lost.
pub struct AuthTrigger(AtomicBool);

impl AuthTrigger {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn arm(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clears the trigger and reports whether it was armed.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::AcqRel)
    }
}

impl Default for AuthTrigger {
    fn default() -> Self {
        Self::new()
    }
}

/// Elapsed-tick bookkeeping for the randomized re-authentication interval.
/// Written from interrupt context only.
pub struct Schedule {
    elapsed: AtomicU32,
    interval: AtomicU32,
}

impl Schedule {
    pub const fn new(interval: u32) -> Self {
        Self {
            elapsed: AtomicU32::new(0),
            interval: AtomicU32::new(interval),
        }
    }

    /// Counts one tick. When the interval has elapsed the counter restarts,
    /// the next interval is taken from `redraw` and `true` is returned.
    pub fn advance(&self, redraw: impl FnOnce() -> u32) -> bool {
        let elapsed = self.elapsed.load(Ordering::Relaxed).wrapping_add(1);
        if elapsed >= self.interval.load(Ordering::Relaxed) {
            self.elapsed.store(0, Ordering::Relaxed);
            self.interval.store(redraw().max(1), Ordering::Relaxed);
            true
        } else {
            self.elapsed.store(elapsed, Ordering::Relaxed);
            false
        }
    }

    /// Restarts the count with a fresh interval.
    pub fn restart(&self, interval: u32) {
        self.elapsed.store(0, Ordering::Relaxed);
        self.interval.store(interval.max(1), Ordering::Relaxed);
    }

    pub fn interval(&self) -> u32 {
        self.interval.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed.load(Ordering::Relaxed)
    }
}

pub struct Authenticator {
    slot: u16,
    state: AuthState,
}

impl Authenticator {
    pub fn new(slot: u16) -> Self {
        Self {
            slot,
            state: AuthState::NotAuthenticated,
        }
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn slot(&self) -> u16 {
        self.slot
    }

    /// Runs one cycle if the trigger is armed, otherwise returns the
    /// current state unchanged. Device errors and negative verdicts both
    /// leave the controller unauthenticated.
    pub fn poll<E, L>(
        &mut self,
        ctx: &Context<L>,
        element: &mut E,
        secret: impl FnOnce() -> SharedSecret,
    ) -> AuthState
    where
        E: SecureElement,
        L: OutputPin,
    {
        if !ctx.trigger().take() {
            return self.state;
        }

        match self.exchange(ctx, element, secret) {
            Ok(()) => {
                log::debug!("slot {} authenticated", self.slot);
                self.state = AuthState::Authenticated;
                ctx.feedback().select(Some(SUCCESS));
            }
            Err(e) => {
                log::warn!("authentication on slot {} failed: {}", self.slot, e);
                self.state = AuthState::NotAuthenticated;
                ctx.feedback().select(Some(FAIL));
            }
        }
        self.state
    }

    fn exchange<E, L>(
        &self,
        ctx: &Context<L>,
        element: &mut E,
        secret: impl FnOnce() -> SharedSecret,
    ) -> Result<(), Error>
    where
        E: SecureElement,
        L: OutputPin,
    {
        let secret = secret();
        let nonce = ctx.host_nonce();
        element.authenticate(self.slot, &secret, &nonce)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trigger_is_one_shot() {
        let trigger = AuthTrigger::new();
        assert!(!trigger.take());
        trigger.arm();
        assert!(trigger.is_armed());
        assert!(trigger.take());
        assert!(!trigger.is_armed());
        assert!(!trigger.take());
    }

    #[test]
    fn rearm_after_take_is_seen() {
        let trigger = AuthTrigger::default();
        trigger.arm();
        assert!(trigger.take());
        trigger.arm();
        assert!(trigger.is_armed());
        assert!(trigger.take());
    }

    #[test]
    fn schedule_fires_after_interval_and_redraws() {
        let schedule = Schedule::new(3);
        assert!(!schedule.advance(|| unreachable!()));
        assert!(!schedule.advance(|| unreachable!()));
        assert!(schedule.advance(|| 5));
        assert_eq!(schedule.interval(), 5);
        assert_eq!(schedule.elapsed(), 0);
        for _ in 0..4 {
            assert!(!schedule.advance(|| unreachable!()));
        }
        assert!(schedule.advance(|| 2));
    }

    #[test]
    fn zero_redraw_is_clamped() {
        let schedule = Schedule::new(1);
        assert!(schedule.advance(|| 0));
        assert_eq!(schedule.interval(), 1);
    }
}
