//! This module contains the typed values exchanged with the DP7xx.

use core::fmt;

use strum_macros::{AsRefStr, EnumIter};

/// Maximum length of a single `*IDN?` field.
pub const IDENT_FIELD_LEN: usize = 32;

/// One field of the identification reply.
pub type IdentField = heapless::String<IDENT_FIELD_LEN>;

/// Used to be less ambiguous about whether something is on or off.
///
/// The string form is the token used on the wire.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, AsRefStr, EnumIter)]
pub enum State {
    /// Disabled.
    #[default]
    #[strum(serialize = "OFF")]
    Off,
    /// Enabled.
    #[strum(serialize = "ON")]
    On,
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}

/// Selects which of the two mirrored command families is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum Quantity {
    /// The `:VOLT` family.
    Voltage,
    /// The `:CURR` family.
    Current,
}

impl Quantity {
    /// Root mnemonic of the command family.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Quantity::Voltage => "VOLT",
            Quantity::Current => "CURR",
        }
    }

    /// Unit suffix used when rendering a value of this quantity.
    pub const fn unit(self) -> &'static str {
        match self {
            Quantity::Voltage => "V",
            Quantity::Current => "A",
        }
    }
}

/// Outcome of the `*TST?` power-on self test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum SelfTestResult {
    Pass,
    Fail,
}

/// Identity reported by `*IDN?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub manufacturer: IdentField,
    pub model: IdentField,
    pub serial_number: IdentField,
    pub version: IdentField,
}

/// Instrument ceilings, read once during the connection handshake.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Limits {
    /// Volts.
    pub max_voltage: f32,
    /// Amps.
    pub max_current: f32,
    /// Highest accepted over-voltage protection level, volts.
    pub max_ovp: f32,
    /// Highest accepted over-current protection level, amps.
    pub max_ocp: f32,
}

impl Limits {
    /// Ceiling for the output setpoint of the given quantity.
    pub fn max_level(&self, quantity: Quantity) -> f32 {
        match quantity {
            Quantity::Voltage => self.max_voltage,
            Quantity::Current => self.max_current,
        }
    }

    /// Ceiling for the protection threshold of the given quantity.
    pub fn max_protection(&self, quantity: Quantity) -> f32 {
        match quantity {
            Quantity::Voltage => self.max_ovp,
            Quantity::Current => self.max_ocp,
        }
    }
}

/// Snapshot of one protection guard, built from three separate queries.
///
/// The three values are not read atomically.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProtectionSummary {
    pub quantity: Quantity,
    pub enabled: bool,
    pub level: f32,
    pub tripped: bool,
}

impl fmt::Display for ProtectionSummary {
    /// E.g. `on 5.00V ok` or `off 1.20A tripped`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled = if self.enabled { "on" } else { "off" };
        let tripped = if self.tripped { "tripped" } else { "ok" };
        write!(
            f,
            "{} {:.2}{} {}",
            enabled,
            self.level,
            self.quantity.unit(),
            tripped
        )
    }
}
