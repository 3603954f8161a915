//! Boot sequencing and the state shared with the tick interrupt.
//!
//! The boot order is fixed: entropy, provisioning, then authentication. The
//! host application must not start before [`Controller::boot`] returns.

use {
    crate::{
        auth::{AuthState, AuthTrigger, Authenticator, Schedule},
        config::Config,
        console::{Console, StatusLine},
        element::SecureElement,
        entropy::{init_entropy, AnalogSource, HostRng, Seed},
        error::Error,
        feedback::Feedback,
        input::ConfirmInput,
        provision::provision,
        secret::{HostNonce, SharedSecret},
        variant::DeviceVariant,
    },
    core::{
        cell::RefCell,
        fmt::Write,
        sync::atomic::{AtomicU32, Ordering},
    },
    embedded_hal::digital::v2::OutputPin,
};

/// Everything the tick interrupt touches.
///
/// Owned by the boot code and handed by reference to both the interrupt
/// handler ([`Context::on_tick`]) and the [`Controller`].
pub struct Context<L> {
    trigger: AuthTrigger,
    schedule: Schedule,
    uptime: AtomicU32,
    rng: critical_section::Mutex<RefCell<HostRng>>,
    feedback: Feedback<L>,
    auth_min_ticks: u32,
    auth_range_ticks: u32,
}

impl<L: OutputPin> Context<L> {
    pub fn new(seed: Seed, led: L, config: &Config) -> Self {
        let mut rng = HostRng::new(seed);
        let interval = rng.auth_interval(config.auth_min_ticks, config.auth_range_ticks);
        Self {
            trigger: AuthTrigger::new(),
            schedule: Schedule::new(interval),
            uptime: AtomicU32::new(0),
            rng: critical_section::Mutex::new(RefCell::new(rng)),
            feedback: Feedback::new(led, config.indicator_polarity),
            auth_min_ticks: config.auth_min_ticks,
            auth_range_ticks: config.auth_range_ticks,
        }
    }

    /// Seeds the generator from the analog inputs and builds the context.
    pub fn from_entropy<A: AnalogSource>(adc: &mut A, led: L, config: &Config) -> Result<Self, Error> {
        let seed = init_entropy(adc, config.adc_max_polls)?;
        Ok(Self::new(seed, led, config))
    }

    /// Timer interrupt body, called once per tick.
    pub fn on_tick(&self) {
        self.uptime
            .store(self.uptime.load(Ordering::Relaxed).wrapping_add(1), Ordering::Relaxed);
        if self.schedule.advance(|| self.draw_interval()) {
            self.trigger.arm();
        }
        self.feedback.tick();
    }

    fn draw_interval(&self) -> u32 {
        critical_section::with(|cs| {
            self.rng
                .borrow(cs)
                .borrow_mut()
                .auth_interval(self.auth_min_ticks, self.auth_range_ticks)
        })
    }

    pub fn host_nonce(&self) -> HostNonce {
        critical_section::with(|cs| self.rng.borrow(cs).borrow_mut().host_nonce())
    }

    /// Restarts the re-authentication countdown with a freshly drawn interval.
    pub fn restart_schedule(&self) {
        let interval = self.draw_interval();
        log::debug!("next authentication in {} ticks", interval);
        critical_section::with(|_| self.schedule.restart(interval));
    }

    pub fn trigger(&self) -> &AuthTrigger {
        &self.trigger
    }

    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    pub fn feedback(&self) -> &Feedback<L> {
        &self.feedback
    }

    /// Monotonic tick counter since boot.
    pub fn uptime(&self) -> &AtomicU32 {
        &self.uptime
    }
}

pub struct Controller<'a, E, C, L, W: Write> {
    ctx: &'a Context<L>,
    element: E,
    variant: DeviceVariant,
    confirm: C,
    console: Console<W>,
    auth: Authenticator,
    secret: fn() -> SharedSecret,
}

impl<'a, E, C, L, W> Controller<'a, E, C, L, W>
where
    E: SecureElement,
    C: ConfirmInput,
    L: OutputPin,
    W: Write,
{
    pub fn new(
        ctx: &'a Context<L>,
        element: E,
        variant: DeviceVariant,
        confirm: C,
        console: W,
        config: &Config,
    ) -> Self {
        Self {
            ctx,
            element,
            variant,
            confirm,
            console: Console::new(console),
            auth: Authenticator::new(config.key_slot),
            secret: SharedSecret::compiled_in,
        }
    }

    /// Replaces the compiled-in root secret source.
    pub fn with_secret(mut self, secret: fn() -> SharedSecret) -> Self {
        self.secret = secret;
        self
    }

    /// Personalizes the element if it is not yet locked.
    pub fn provision(&mut self) -> Result<(), Error> {
        provision(
            &mut self.element,
            self.variant,
            self.auth.slot(),
            self.secret,
            self.ctx.feedback(),
            &mut self.confirm,
            &mut self.console,
        )
    }

    /// Authentication transition function. Does nothing unless the trigger
    /// is armed.
    pub fn poll(&mut self) -> AuthState {
        if !self.ctx.trigger().is_armed() {
            return self.auth.state();
        }
        let state = self.auth.poll(self.ctx, &mut self.element, self.secret);
        if state == AuthState::NotAuthenticated {
            self.console.report(StatusLine::AuthenticationFailed);
        }
        state
    }

    /// Forces a cycle now and keeps polling until one succeeds. `idle` runs
    /// between polls; on hardware it can simply spin, tests drive ticks from
    /// it.
    ///
    /// There is no retry limit. A deployment that needs one must wrap this
    /// call in a watchdog or attempt counter.
    pub fn authenticate_blocking(&mut self, mut idle: impl FnMut(&Context<L>)) {
        self.ctx.restart_schedule();
        self.ctx.trigger().arm();
        while self.poll() == AuthState::NotAuthenticated {
            idle(self.ctx);
            core::hint::spin_loop();
        }
        self.console.report(StatusLine::Authenticated);
    }

    /// Provisioning followed by the blocking authentication gate.
    ///
    /// A provisioning failure is reported and boot continues; the
    /// authentication that follows then fails visibly until the device is
    /// reset and provisioned.
    pub fn boot(&mut self, idle: impl FnMut(&Context<L>)) {
        log::info!("booting with {}", self.variant.name());
        if let Err(e) = self.provision() {
            log::warn!("provisioning failed: {}", e);
            self.console.report(StatusLine::ProvisionFailed);
        }
        self.authenticate_blocking(idle);
        log::info!("authenticated, starting application");
    }

    pub fn state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn context(&self) -> &'a Context<L> {
        self.ctx
    }

    pub fn element(&self) -> &E {
        &self.element
    }

    pub fn element_mut(&mut self) -> &mut E {
        &mut self.element
    }

    pub fn console(&self) -> &W {
        self.console.sink()
    }
}

#[cfg(test)]
mod tests {
    use {super::*, core::convert::Infallible};

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

    #[test]
    fn tick_arms_trigger_when_interval_elapses() {
        let config = Config::default().with_auth_interval(5, 1);
        let ctx = Context::new(Seed(1), NullPin, &config);
        for _ in 0..4 {
            ctx.on_tick();
            assert!(!ctx.trigger().is_armed());
        }
        ctx.on_tick();
        assert!(ctx.trigger().is_armed());
        assert_eq!(ctx.uptime().load(Ordering::Relaxed), 5);
    }

    #[test]
    fn redrawn_intervals_stay_in_window() {
        let config = Config::default().with_auth_interval(10, 20);
        let ctx = Context::new(Seed(99), NullPin, &config);
        for _ in 0..2000 {
            ctx.on_tick();
            let interval = ctx.schedule().interval();
            assert!((10..30).contains(&interval));
        }
    }
}
