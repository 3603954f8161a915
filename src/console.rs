//! Status lines for the operator.
//!
//! The console is a secondary channel next to the indicator. Any
//! [`core::fmt::Write`] sink works, [`TeeConsole`] mirrors to two of them the
//! way a board prints to both its UART and a small display.

use core::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLine {
    NotProvisioned,
    Provisioned,
    ProvisionFailed,
    Authenticated,
    AuthenticationFailed,
}

impl core::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            StatusLine::NotProvisioned => {
                "Device is not provisioned... Press the confirm button to provision"
            }
            StatusLine::Provisioned => {
                "Device provisioned successfully... Press the confirm button to continue"
            }
            StatusLine::ProvisionFailed => "Provision failed... Check device and press RESET",
            StatusLine::Authenticated => "Authentication succeeded",
            StatusLine::AuthenticationFailed => "Authentication failed",
        })
    }
}

pub struct Console<W: Write> {
    sink: W,
}

impl<W: Write> Console<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn report(&mut self, line: StatusLine) {
        log::info!("{}", line);
        write!(self.sink, "{}\r\n", line).ok();
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }
}

/// Text sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl Write for NullSink {
    fn write_str(&mut self, _s: &str) -> core::fmt::Result {
        Ok(())
    }
}

pub struct TeeConsole<A: Write, B: Write> {
    primary: A,
    secondary: B,
}

impl<A: Write, B: Write> TeeConsole<A, B> {
    pub fn new(primary: A, secondary: B) -> Self {
        Self { primary, secondary }
    }

    pub fn into_parts(self) -> (A, B) {
        (self.primary, self.secondary)
    }
}

impl<A: Write, B: Write> Write for TeeConsole<A, B> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        // A failing secondary must not hide output on the primary.
        self.secondary.write_str(s).ok();
        self.primary.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use {super::*, std::string::String};

    #[test]
    fn lines_are_crlf_terminated() {
        let mut console = Console::new(String::new());
        console.report(StatusLine::Authenticated);
        assert_eq!(console.sink(), "Authentication succeeded\r\n");
    }

    #[test]
    fn tee_writes_both_sinks() {
        let mut console = Console::new(TeeConsole::new(String::new(), String::new()));
        console.report(StatusLine::ProvisionFailed);
        let (primary, secondary) = console.sink.into_parts();
        assert_eq!(primary, secondary);
        assert!(primary.starts_with("Provision failed"));
    }

    #[test]
    fn sink_can_be_drained_between_reports() {
        let mut console = Console::new(String::new());
        console.report(StatusLine::NotProvisioned);
        console.sink_mut().clear();
        console.report(StatusLine::AuthenticationFailed);
        assert_eq!(console.sink(), "Authentication failed\r\n");
    }
}
