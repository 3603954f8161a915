//! `log` backend writing to any text sink.
//!
//! The logger lives in a `static` owned by the board code, so no allocator
//! is needed:
//!
//! ```ignore
//! static LOGGER: SinkLogger<Uart> = SinkLogger::new(log::LevelFilter::Debug);
//! init_logging(&LOGGER, uart, Some(ctx.uptime()));
//! ```

use core::{
    cell::{Cell, RefCell},
    fmt::Write,
    sync::atomic::{AtomicU32, Ordering},
};

/// Milliseconds per tick of the controller timer.
const TICK_MS: u32 = 1;

pub struct SinkLogger<W> {
    sink: critical_section::Mutex<RefCell<Option<W>>>,
    uptime_ticks: critical_section::Mutex<Cell<Option<&'static AtomicU32>>>,
    level: log::LevelFilter,
}

impl<W> SinkLogger<W> {
    /// Logger with no sink attached yet. Records are dropped until
    /// [`init_logging`] hands it one.
    pub const fn new(level: log::LevelFilter) -> Self {
        Self {
            sink: critical_section::Mutex::new(RefCell::new(None)),
            uptime_ticks: critical_section::Mutex::new(Cell::new(None)),
            level,
        }
    }

    fn attach(&self, sink: W, uptime_ticks: Option<&'static AtomicU32>) {
        critical_section::with(|cs| {
            self.sink.borrow(cs).replace(Some(sink));
            self.uptime_ticks.borrow(cs).set(uptime_ticks);
        })
    }
}

impl<W: Send + Write> log::Log for SinkLogger<W> {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        critical_section::with(|cs| {
            let ms = self
                .uptime_ticks
                .borrow(cs)
                .get()
                .map(|t| t.load(Ordering::Relaxed).wrapping_mul(TICK_MS))
                .unwrap_or(0);
            if let Some(sink) = self.sink.borrow(cs).borrow_mut().as_mut() {
                write!(
                    sink,
                    "{} {}.{:03} [{}] {}\r\n",
                    record.level(),
                    ms / 1000,
                    ms % 1000,
                    record.module_path().unwrap_or("bin"),
                    record.args()
                )
                .ok();
            }
        })
    }

    fn flush(&self) {}
}

/// Attaches `sink` to `logger` and installs it. `uptime_ticks` is the
/// controller's monotonic tick counter, see
/// [`crate::controller::Context::uptime`].
///
/// If another logger is already installed the sink is still attached but
/// nothing is routed to it.
pub fn init_logging<W: Send + Write + 'static>(
    logger: &'static SinkLogger<W>,
    sink: W,
    uptime_ticks: Option<&'static AtomicU32>,
) {
    logger.attach(sink, uptime_ticks);
    if log::set_logger(logger).is_ok() {
        log::set_max_level(logger.level);
    }
}

#[cfg(test)]
mod tests {
    use {super::*, log::Log, std::string::String};

    fn emit(logger: &SinkLogger<String>, level: log::Level, message: &str) {
        logger.log(
            &log::Record::builder()
                .level(level)
                .module_path(Some("authgate::auth"))
                .args(format_args!("{}", message))
                .build(),
        );
    }

    fn output(logger: &SinkLogger<String>) -> String {
        critical_section::with(|cs| logger.sink.borrow(cs).borrow().clone().unwrap_or_default())
    }

    #[test]
    fn records_carry_uptime_and_module() {
        static UPTIME: AtomicU32 = AtomicU32::new(12_345);
        let logger = SinkLogger::new(log::LevelFilter::Info);
        logger.attach(String::new(), Some(&UPTIME));
        emit(&logger, log::Level::Info, "slot 6 authenticated");
        assert_eq!(
            output(&logger),
            "INFO 12.345 [authgate::auth] slot 6 authenticated\r\n"
        );
    }

    #[test]
    fn level_filter_and_missing_sink() {
        let logger = SinkLogger::new(log::LevelFilter::Warn);
        emit(&logger, log::Level::Error, "dropped, no sink yet");
        logger.attach(String::new(), None);
        emit(&logger, log::Level::Debug, "filtered");
        emit(&logger, log::Level::Warn, "kept");
        assert_eq!(output(&logger), "WARN 0.000 [authgate::auth] kept\r\n");
    }
}
