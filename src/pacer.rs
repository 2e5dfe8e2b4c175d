//! Command pacing on top of the byte transport.
//!
//! The DP7xx drops commands which arrive too close to the previous one, so
//! every command goes through a [Pacer] which holds back until
//! [MIN_COMMAND_INTERVAL] has passed since the last one was issued.

use embedded_io::Error as _;
use fugit::{MicrosDurationU64, TimerInstantU64};

use crate::error::{Error, Result};

/// Point in time with microsecond resolution.
pub type Instant = TimerInstantU64<1_000_000>;
/// Span of time with microsecond resolution.
pub type Duration = MicrosDurationU64;

/// Minimum spacing between two commands on the wire.
pub const MIN_COMMAND_INTERVAL: Duration = Duration::millis(50);

/// Source of wall-clock time, and the way to block on it.
pub trait Clock {
    /// Current time. Must never go backwards.
    fn now(&mut self) -> Instant;
    /// Block the caller for `duration`.
    fn sleep(&mut self, duration: Duration);
}

/// [Clock] backed by [std::time::Instant] and [std::thread::sleep].
#[cfg(not(feature = "no_std"))]
#[derive(Debug, Clone, Copy)]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(not(feature = "no_std"))]
impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(not(feature = "no_std"))]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(feature = "no_std"))]
impl Clock for StdClock {
    fn now(&mut self) -> Instant {
        let elapsed = self.origin.elapsed().as_micros();
        Instant::from_ticks(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(core::time::Duration::from_micros(duration.ticks()));
    }
}

/// Owns the transport and the time the last command was issued.
///
/// `L` is the longest reply line accepted, excluding the terminator.
pub struct Pacer<S: embedded_io::Read + embedded_io::Write, C: Clock, const L: usize> {
    interface: S,
    clock: C,
    min_interval: Duration,
    /// `None` until the first command has been issued.
    last_issue: Option<Instant>,
}

impl<S: embedded_io::Read + embedded_io::Write, C: Clock, const L: usize> Pacer<S, C, L> {
    /// Create a pacer enforcing [MIN_COMMAND_INTERVAL].
    pub fn new(interface: S, clock: C) -> Self {
        Self::with_min_interval(interface, clock, MIN_COMMAND_INTERVAL)
    }

    /// Create a pacer enforcing a custom minimum spacing.
    pub fn with_min_interval(interface: S, clock: C, min_interval: Duration) -> Self {
        Self {
            interface,
            clock,
            min_interval,
            last_issue: None,
        }
    }

    /// Send `command` and, if `expects_reply`, return the reply line with surrounding
    /// whitespace removed.
    ///
    /// Blocks first until the minimum spacing since the previous command has passed.
    pub fn execute(
        &mut self,
        command: &[u8],
        expects_reply: bool,
    ) -> Result<Option<heapless::String<L>>, S::Error> {
        self.wait_for_slot();
        self.last_issue = Some(self.clock.now());

        log::debug!(
            "-> {}",
            core::str::from_utf8(command).unwrap_or("<binary>").trim_end()
        );
        self.interface
            .write_all(command)
            .map_err(Error::TransportError)?;
        self.interface.flush().map_err(Error::TransportError)?;

        if !expects_reply {
            return Ok(None);
        }

        let reply = self.read_line()?;
        log::debug!("<- {}", reply);
        Ok(Some(reply))
    }

    /// Access the clock the pacer waits on.
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    /// Release the transport.
    pub fn into_inner(self) -> S {
        self.interface
    }

    #[cfg(test)]
    pub(crate) fn parts_mut(&mut self) -> (&mut S, &mut C) {
        (&mut self.interface, &mut self.clock)
    }

    fn wait_for_slot(&mut self) {
        let Some(last_issue) = self.last_issue else {
            return;
        };
        let now = self.clock.now();
        let elapsed = now
            .checked_duration_since(last_issue)
            .unwrap_or(Duration::from_ticks(0));
        if let Some(remaining) = self.min_interval.checked_sub(elapsed) {
            if remaining.ticks() > 0 {
                log::trace!("pacing: holding command for {} us", remaining.ticks());
                self.clock.sleep(remaining);
            }
        }
    }

    /// Read up to and excluding `\n`.
    ///
    /// One byte at a time, so nothing belonging to a later reply is consumed.
    /// A line longer than `L` is still read through to its terminator before
    /// [Error::BufferError] is returned, so the next reply starts clean.
    fn read_line(&mut self) -> Result<heapless::String<L>, S::Error> {
        let mut line: heapless::Vec<u8, L> = heapless::Vec::new();
        let mut overflowed = false;
        let mut byte = [0u8; 1];
        loop {
            match self.interface.read(&mut byte) {
                // Nothing arrived before the transport gave up.
                Ok(0) => return Err(Error::Timeout),
                Ok(_) => {
                    if byte[0] == b'\n' {
                        break;
                    }
                    if line.push(byte[0]).is_err() && !overflowed {
                        log::warn!("reply longer than {} bytes, discarding it", L);
                        overflowed = true;
                    }
                }
                Err(e) if matches!(e.kind(), embedded_io::ErrorKind::TimedOut) => {
                    return Err(Error::Timeout);
                }
                Err(e) => return Err(Error::TransportError(e)),
            }
        }
        if overflowed {
            return Err(Error::BufferError);
        }

        let text = core::str::from_utf8(&line)
            .map_err(|_| Error::ProtocolError("reply is not valid UTF-8"))?;
        let mut reply = heapless::String::new();
        reply
            .push_str(text.trim())
            .map_err(|_| Error::BufferError)?;
        Ok(reply)
    }
}
