//! This crate provides an interface for communicating with and controlling the Rigol DP7xx series of
//! programmable bench power supplies.
//!
//! It supports `no-std` environments by use of the `no_std` feature flag. You then supply your own
//! [pacer::Clock].
//!
//! Tested against:
//! * DP712, firmware 00.01.03
//!
//! The PSU speaks a SCPI-like text protocol: one command per line, one reply line per query.
//! It drops commands which arrive less than 50 ms after the previous one, so every command is
//! paced. See [pacer].
//!
//! The serial port used for PSU comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: None
//! * A read timeout, the driver reports it as [error::Error::Timeout]
//!
//! Only channel 1 is supported.

// Tests always link std for the mocks.
#![cfg_attr(all(feature = "no_std", not(test)), no_std)]

pub mod codec;
pub mod error;
pub mod pacer;
pub mod psu;
pub mod ramp;
pub mod types;

#[cfg(test)]
mod mock_clock;
#[cfg(test)]
mod mock_serial;
