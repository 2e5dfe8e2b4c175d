//! Encoding of DP7xx commands and decoding of the replies.
//!
//! Every command is a single line of text terminated by `\n`. Queries get
//! exactly one line back.

use core::fmt::{self, Write};

use thiserror::Error;

use crate::types::{IdentField, Identity, Quantity, SelfTestResult, State};

/// Transport independent failures of the codec.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unexpected reply shape: {0}")]
    Protocol(&'static str),
    #[error("Reply is not a number")]
    Parse,
    #[error("Text does not fit in the buffer")]
    Overflow,
}

/// Every command the driver can put on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    /// `*IDN?`
    Identify,
    /// `*TST?`
    SelfTest,
    /// `:DISP?`
    QueryDisplay,
    /// `:DISP ON|OFF`
    SetDisplay(State),
    /// `:OUTP:STAT? CH1`
    QueryOutput,
    /// `:OUTP:STAT CH1,ON|OFF`
    SetOutput(State),
    /// `:VOLT?` / `:CURR?`
    QueryLevel(Quantity),
    /// `:VOLT 5.1` / `:CURR 0.25`, value rendered with [MinimalFloat].
    SetLevel(Quantity, f32),
    /// `:VOLT? MAX` / `:CURR? MAX`
    QueryMax(Quantity),
    /// `:VOLT:PROT?` / `:CURR:PROT?`
    QueryProtectionLevel(Quantity),
    /// `:VOLT:PROT 5.00` / `:CURR:PROT 1.20`, always two decimals.
    SetProtectionLevel(Quantity, f32),
    /// `:VOLT:PROT? MAX` / `:CURR:PROT? MAX`
    QueryProtectionMax(Quantity),
    /// `:VOLT:PROT:STAT?` / `:CURR:PROT:STAT?`
    QueryProtectionState(Quantity),
    /// `:VOLT:PROT:STAT ON|OFF` / `:CURR:PROT:STAT ON|OFF`
    SetProtectionState(Quantity, State),
    /// `:VOLT:PROT:TRIP?` / `:CURR:PROT:TRIP?`
    QueryProtectionTripped(Quantity),
    /// `:VOLT:PROT:CLE` / `:CURR:PROT:CLE`
    ClearProtection(Quantity),
}

impl Command {
    /// Whether the instrument answers this command with a line.
    pub fn expects_reply(&self) -> bool {
        use Command as C;
        match self {
            C::Identify
            | C::SelfTest
            | C::QueryDisplay
            | C::QueryOutput
            | C::QueryLevel(_)
            | C::QueryMax(_)
            | C::QueryProtectionLevel(_)
            | C::QueryProtectionMax(_)
            | C::QueryProtectionState(_)
            | C::QueryProtectionTripped(_) => true,
            C::SetDisplay(_)
            | C::SetOutput(_)
            | C::SetLevel(..)
            | C::SetProtectionLevel(..)
            | C::SetProtectionState(..)
            | C::ClearProtection(_) => false,
        }
    }

    /// Render the command including the line terminator.
    pub fn encode<const N: usize>(&self) -> Result<heapless::String<N>, CodecError> {
        let mut line = heapless::String::new();
        writeln!(line, "{}", self).map_err(|_| CodecError::Overflow)?;
        Ok(line)
    }
}

impl fmt::Display for Command {
    /// The command text without the terminator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Command as C;
        match *self {
            C::Identify => f.write_str("*IDN?"),
            C::SelfTest => f.write_str("*TST?"),
            C::QueryDisplay => f.write_str(":DISP?"),
            C::SetDisplay(state) => write!(f, ":DISP {}", state.as_ref()),
            C::QueryOutput => f.write_str(":OUTP:STAT? CH1"),
            C::SetOutput(state) => write!(f, ":OUTP:STAT CH1,{}", state.as_ref()),
            C::QueryLevel(q) => write!(f, ":{}?", q.mnemonic()),
            C::SetLevel(q, value) => write!(f, ":{} {}", q.mnemonic(), MinimalFloat(value)),
            C::QueryMax(q) => write!(f, ":{}? MAX", q.mnemonic()),
            C::QueryProtectionLevel(q) => write!(f, ":{}:PROT?", q.mnemonic()),
            C::SetProtectionLevel(q, value) => write!(f, ":{}:PROT {:.2}", q.mnemonic(), value),
            C::QueryProtectionMax(q) => write!(f, ":{}:PROT? MAX", q.mnemonic()),
            C::QueryProtectionState(q) => write!(f, ":{}:PROT:STAT?", q.mnemonic()),
            C::SetProtectionState(q, state) => {
                write!(f, ":{}:PROT:STAT {}", q.mnemonic(), state.as_ref())
            }
            C::QueryProtectionTripped(q) => write!(f, ":{}:PROT:TRIP?", q.mnemonic()),
            C::ClearProtection(q) => write!(f, ":{}:PROT:CLE", q.mnemonic()),
        }
    }
}

/// Renders a value with two decimals, then drops trailing zeros and a dangling point.
///
/// `5.0` => `5`, `5.10` => `5.1`, `5.25` => `5.25`.
#[derive(Debug, Clone, Copy)]
pub struct MinimalFloat(pub f32);

impl fmt::Display for MinimalFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough for the widest f32 with two decimals.
        let mut fixed: heapless::String<48> = heapless::String::new();
        write!(fixed, "{:.2}", self.0)?;
        let trimmed = if fixed.contains('.') {
            fixed.trim_end_matches('0').trim_end_matches('.')
        } else {
            fixed.as_str()
        };
        f.write_str(trimmed)
    }
}

/// `ON` is the only reply meaning enabled.
pub fn decode_state(reply: &str) -> bool {
    reply == State::On.as_ref()
}

/// `YES` is the only reply meaning tripped.
pub fn decode_tripped(reply: &str) -> bool {
    reply == "YES"
}

pub fn decode_float(reply: &str) -> Result<f32, CodecError> {
    reply.parse::<f32>().map_err(|_| CodecError::Parse)
}

/// Parse `manufacturer,model,serial,version`.
pub fn decode_identity(reply: &str) -> Result<Identity, CodecError> {
    let mut fields = reply.split(',');
    let (Some(manufacturer), Some(model), Some(serial_number), Some(version), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(CodecError::Protocol("identify reply must have 4 fields"));
    };

    Ok(Identity {
        manufacturer: ident_field(manufacturer)?,
        model: ident_field(model)?,
        serial_number: ident_field(serial_number)?,
        version: ident_field(version)?,
    })
}

fn ident_field(text: &str) -> Result<IdentField, CodecError> {
    let mut field = IdentField::new();
    field.push_str(text).map_err(|_| CodecError::Overflow)?;
    Ok(field)
}

/// Any case-insensitive occurrence of `fail` marks the self test as failed.
pub fn decode_self_test(reply: &str) -> SelfTestResult {
    let failed = reply
        .as_bytes()
        .windows(4)
        .any(|w| w.eq_ignore_ascii_case(b"fail"));
    if failed {
        SelfTestResult::Fail
    } else {
        SelfTestResult::Pass
    }
}
