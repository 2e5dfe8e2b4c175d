use core::fmt;

use crate::{
    codec::{self, Command},
    error::{Error, Result},
    pacer::{Clock, Duration, Pacer},
    ramp::{RampPlan, RampTarget},
    types::{Identity, Limits, ProtectionSummary, Quantity, SelfTestResult, State},
};

/// Default longest accepted reply line.
pub const DEFAULT_REPLY_LEN: usize = 64;

/// Clamp `x` into `[lo, hi]`.
///
/// `x <= lo` gives `lo`, which also turns NaN and `-0.0` into `lo`.
pub fn clamp(x: f32, lo: f32, hi: f32) -> f32 {
    if !(x > lo) {
        lo
    } else if x > hi {
        hi
    } else {
        x
    }
}

/// A connected Rigol DP7xx power supply.
///
/// You can create a Dp7xx using any interface which implements [embedded_io::Read] & [embedded_io::Write].
/// Connecting runs the identify, self-test and limit handshake, the session only exists once that
/// has succeeded.
///
/// For its methods "get" means a live query of the instrument and "set" means writing a setting.
/// Nothing but the handshake results is cached.
pub struct Dp7xx<
    S: embedded_io::Read + embedded_io::Write,
    C: Clock,
    const L: usize = DEFAULT_REPLY_LEN,
> {
    pacer: Pacer<S, C, L>,
    identity: Identity,
    self_test: SelfTestResult,
    limits: Limits,
}

#[cfg(not(feature = "no_std"))]
impl<S: embedded_io::Read + embedded_io::Write, const L: usize> Dp7xx<S, crate::pacer::StdClock, L> {
    /// Connect using the system clock for command pacing.
    pub fn connect(interface: S) -> Result<Self, S::Error> {
        Self::connect_with_clock(interface, crate::pacer::StdClock::new())
    }
}

impl<S: embedded_io::Read + embedded_io::Write, C: Clock, const L: usize> Dp7xx<S, C, L> {
    /// Connect using the given clock for command pacing and ramp timing.
    pub fn connect_with_clock(interface: S, clock: C) -> Result<Self, S::Error> {
        Self::handshake(Pacer::new(interface, clock))
    }

    /// Run the connection handshake over an already built pacer.
    ///
    /// Order is fixed: identify, self test, then the voltage, current, OVP and OCP ceilings.
    pub fn handshake(mut pacer: Pacer<S, C, L>) -> Result<Self, S::Error> {
        let reply = Self::query_with(&mut pacer, Command::Identify)?;
        let identity = codec::decode_identity(&reply)?;

        let reply = Self::query_with(&mut pacer, Command::SelfTest)?;
        let self_test = codec::decode_self_test(&reply);
        if self_test == SelfTestResult::Fail {
            log::warn!("DP7xx self test failed: {}", reply);
        }

        let max_voltage = Self::query_float_with(&mut pacer, Command::QueryMax(Quantity::Voltage))?;
        let max_current = Self::query_float_with(&mut pacer, Command::QueryMax(Quantity::Current))?;
        let max_ovp =
            Self::query_float_with(&mut pacer, Command::QueryProtectionMax(Quantity::Voltage))?;
        let max_ocp =
            Self::query_float_with(&mut pacer, Command::QueryProtectionMax(Quantity::Current))?;
        let limits = Limits {
            max_voltage,
            max_current,
            max_ovp,
            max_ocp,
        };

        log::info!(
            "connected to {} {} (serial {}, version {}), max {:.2}V {:.2}A",
            identity.manufacturer,
            identity.model,
            identity.serial_number,
            identity.version,
            max_voltage,
            max_current
        );

        Ok(Self {
            pacer,
            identity,
            self_test,
            limits,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn model(&self) -> &str {
        &self.identity.model
    }

    pub fn serial_number(&self) -> &str {
        &self.identity.serial_number
    }

    pub fn version(&self) -> &str {
        &self.identity.version
    }

    /// Self test outcome from the handshake.
    pub fn self_test(&self) -> SelfTestResult {
        self.self_test
    }

    /// Instrument ceilings from the handshake.
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// End the session and give back the transport.
    pub fn into_inner(self) -> S {
        self.pacer.into_inner()
    }

    /// Turn the front panel display on or off.
    pub fn set_display(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.send(Command::SetDisplay(state.into()))
    }

    /// Whether the front panel display is on.
    pub fn get_display(&mut self) -> Result<bool, S::Error> {
        self.query_state(Command::QueryDisplay)
    }

    /// Enable/disable the channel 1 output.
    pub fn set_output(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.send(Command::SetOutput(state.into()))
    }

    /// Whether the channel 1 output is enabled.
    pub fn get_output(&mut self) -> Result<bool, S::Error> {
        self.query_state(Command::QueryOutput)
    }

    /// Set the channel 1 voltage. Silently clamped into `[0, max_voltage]`.
    pub fn set_voltage(&mut self, volts: f32) -> Result<(), S::Error> {
        self.set_level(Quantity::Voltage, volts)
    }

    /// Get the channel 1 voltage setting, volts.
    pub fn get_voltage(&mut self) -> Result<f32, S::Error> {
        self.get_level(Quantity::Voltage)
    }

    /// Set the channel 1 current limit. Silently clamped into `[0, max_current]`.
    pub fn set_current(&mut self, amps: f32) -> Result<(), S::Error> {
        self.set_level(Quantity::Current, amps)
    }

    /// Get the channel 1 current limit, amps.
    pub fn get_current(&mut self) -> Result<f32, S::Error> {
        self.get_level(Quantity::Current)
    }

    pub fn set_ovp_level(&mut self, volts: f32) -> Result<(), S::Error> {
        self.set_protection_level(Quantity::Voltage, volts)
    }

    pub fn get_ovp_level(&mut self) -> Result<f32, S::Error> {
        self.get_protection_level(Quantity::Voltage)
    }

    pub fn set_ocp_level(&mut self, amps: f32) -> Result<(), S::Error> {
        self.set_protection_level(Quantity::Current, amps)
    }

    pub fn get_ocp_level(&mut self) -> Result<f32, S::Error> {
        self.get_protection_level(Quantity::Current)
    }

    /// Enable/disable over-voltage protection.
    pub fn set_ovp_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.set_protection_state(Quantity::Voltage, state)
    }

    pub fn get_ovp_state(&mut self) -> Result<bool, S::Error> {
        self.get_protection_state(Quantity::Voltage)
    }

    /// Enable/disable over-current protection.
    pub fn set_ocp_state(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        self.set_protection_state(Quantity::Current, state)
    }

    pub fn get_ocp_state(&mut self) -> Result<bool, S::Error> {
        self.get_protection_state(Quantity::Current)
    }

    /// Has over-voltage protection tripped?
    pub fn get_ovp_tripped(&mut self) -> Result<bool, S::Error> {
        self.get_protection_tripped(Quantity::Voltage)
    }

    /// Has over-current protection tripped?
    pub fn get_ocp_tripped(&mut self) -> Result<bool, S::Error> {
        self.get_protection_tripped(Quantity::Current)
    }

    /// Clear a latched over-voltage trip.
    pub fn clear_ovp(&mut self) -> Result<(), S::Error> {
        self.clear_protection(Quantity::Voltage)
    }

    /// Clear a latched over-current trip.
    pub fn clear_ocp(&mut self) -> Result<(), S::Error> {
        self.clear_protection(Quantity::Current)
    }

    pub fn get_ovp_summary(&mut self) -> Result<ProtectionSummary, S::Error> {
        self.get_protection_summary(Quantity::Voltage)
    }

    pub fn get_ocp_summary(&mut self) -> Result<ProtectionSummary, S::Error> {
        self.get_protection_summary(Quantity::Current)
    }

    /// Ramp the voltage linearly from `v_start` to `v_end` over `duration_s` seconds
    /// in `steps` steps, then set `v_end`.
    ///
    /// Every step goes through [Self::set_voltage], so out-of-range ramps saturate.
    pub fn ramp_voltage(
        &mut self,
        v_start: f32,
        v_end: f32,
        duration_s: f32,
        steps: u32,
    ) -> Result<(), S::Error> {
        let plan = RampPlan::new(v_start, v_end, duration_s, steps)?;
        plan.run(self)
    }

    /// Set the output setpoint of `quantity`, clamped into `[0, max]`.
    pub fn set_level(&mut self, quantity: Quantity, value: f32) -> Result<(), S::Error> {
        let value = clamp(value, 0.0, self.limits.max_level(quantity));
        self.send(Command::SetLevel(quantity, value))
    }

    pub fn get_level(&mut self, quantity: Quantity) -> Result<f32, S::Error> {
        self.query_float(Command::QueryLevel(quantity))
    }

    /// Set the protection threshold of `quantity`, clamped into `[0, max]`.
    pub fn set_protection_level(&mut self, quantity: Quantity, value: f32) -> Result<(), S::Error> {
        let value = clamp(value, 0.0, self.limits.max_protection(quantity));
        self.send(Command::SetProtectionLevel(quantity, value))
    }

    pub fn get_protection_level(&mut self, quantity: Quantity) -> Result<f32, S::Error> {
        self.query_float(Command::QueryProtectionLevel(quantity))
    }

    pub fn set_protection_state(
        &mut self,
        quantity: Quantity,
        state: impl Into<State>,
    ) -> Result<(), S::Error> {
        self.send(Command::SetProtectionState(quantity, state.into()))
    }

    pub fn get_protection_state(&mut self, quantity: Quantity) -> Result<bool, S::Error> {
        self.query_state(Command::QueryProtectionState(quantity))
    }

    pub fn get_protection_tripped(&mut self, quantity: Quantity) -> Result<bool, S::Error> {
        let reply = self.query(Command::QueryProtectionTripped(quantity))?;
        Ok(codec::decode_tripped(&reply))
    }

    pub fn clear_protection(&mut self, quantity: Quantity) -> Result<(), S::Error> {
        self.send(Command::ClearProtection(quantity))
    }

    /// Enabled state, threshold and trip state, read with three separate queries.
    pub fn get_protection_summary(
        &mut self,
        quantity: Quantity,
    ) -> Result<ProtectionSummary, S::Error> {
        let enabled = self.get_protection_state(quantity)?;
        let level = self.get_protection_level(quantity)?;
        let tripped = self.get_protection_tripped(quantity)?;
        Ok(ProtectionSummary {
            quantity,
            enabled,
            level,
            tripped,
        })
    }

    fn send(&mut self, command: Command) -> Result<(), S::Error> {
        let line = command.encode::<L>()?;
        self.pacer.execute(line.as_bytes(), false)?;
        Ok(())
    }

    fn query(&mut self, command: Command) -> Result<heapless::String<L>, S::Error> {
        Self::query_with(&mut self.pacer, command)
    }

    fn query_state(&mut self, command: Command) -> Result<bool, S::Error> {
        let reply = self.query(command)?;
        Ok(codec::decode_state(&reply))
    }

    fn query_float(&mut self, command: Command) -> Result<f32, S::Error> {
        Self::query_float_with(&mut self.pacer, command)
    }

    fn query_with(
        pacer: &mut Pacer<S, C, L>,
        command: Command,
    ) -> Result<heapless::String<L>, S::Error> {
        let line = command.encode::<L>()?;
        pacer
            .execute(line.as_bytes(), true)?
            .ok_or(Error::ProtocolError("no reply to a query"))
    }

    fn query_float_with(pacer: &mut Pacer<S, C, L>, command: Command) -> Result<f32, S::Error> {
        let reply = Self::query_with(pacer, command)?;
        Ok(codec::decode_float(&reply)?)
    }
}

impl<S: embedded_io::Read + embedded_io::Write, C: Clock, const L: usize> RampTarget
    for Dp7xx<S, C, L>
{
    type Error = Error<S::Error>;

    fn set_voltage(&mut self, voltage: f32) -> core::result::Result<(), Self::Error> {
        Dp7xx::set_voltage(self, voltage)
    }

    fn wait(&mut self, duration: Duration) {
        self.pacer.clock_mut().sleep(duration);
    }
}

impl<S: embedded_io::Read + embedded_io::Write, C: Clock, const L: usize> fmt::Display
    for Dp7xx<S, C, L>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "model {}", self.identity.model)?;
        writeln!(f, "serial number {}", self.identity.serial_number)?;
        writeln!(f, "version {}", self.identity.version)?;
        writeln!(f, "selftest {}", self.self_test.as_ref())?;
        writeln!(f, "max voltage {:.2}V", self.limits.max_voltage)?;
        write!(f, "max current {:.2}A", self.limits.max_current)
    }
}
