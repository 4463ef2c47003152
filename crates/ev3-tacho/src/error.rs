//! This module defines the error types used by the `ev3-tacho` crate.
//!
//! None of these are retried or masked internally; every failure is
//! surfaced synchronously to the caller with enough context to act on.
//! Validation errors are always raised before any write is attempted.

use std::io;
use std::num::ParseIntError;
use std::path::PathBuf;

use thiserror::Error;

/// Wanted and observed driver names for a resolved motor.
///
/// This is a soft signal: resolution still yields a usable handle when the
/// connected device reports a different driver. It implements
/// [`std::error::Error`] so callers that treat a mismatch as fatal can
/// propagate it with `?` through [`Error::Mismatch`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("driver mismatch: want {want:?}, have {have:?}")]
pub struct DriverMismatch {
    /// The driver name the caller asked for.
    pub want: String,
    /// The driver name the device reports.
    pub have: String,
}

/// Error type for device resolution and attribute access.
#[derive(Debug, Error)]
pub enum Error {
    /// No port carried a motor with the requested driver after scanning
    /// every candidate port.
    #[error("could not find a tacho-motor for driver {driver:?}")]
    NoDevice {
        /// The requested driver name.
        driver: String,
    },

    /// The port resolver found no device bound to the named port.
    #[error("port {port:?} is not connected to a device")]
    PortNotConnected {
        /// The requested port name.
        port: String,
    },

    /// A directory in the device tree could not be enumerated.
    #[error("failed to enumerate {}: {source}", .path.display())]
    List {
        /// The directory that failed to enumerate.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The motor subtree did not hold exactly one entry.
    #[error("expected exactly one device in {}, found {entries:?}", .path.display())]
    DeviceCount {
        /// The motor subtree that was enumerated.
        path: PathBuf,
        /// Every entry observed in the subtree.
        entries: Vec<String>,
    },

    /// The single entry of the motor subtree lacks the motor name prefix.
    #[error("device in {} is not a motor: {entry:?}", .path.display())]
    NotAMotor {
        /// The motor subtree that was enumerated.
        path: PathBuf,
        /// The offending entry name.
        entry: String,
    },

    /// The numeric suffix of the motor node name is not a valid integer.
    #[error("could not parse id from device name {entry:?}: {source}")]
    BadMotorId {
        /// The offending entry name.
        entry: String,
        /// The underlying parse error.
        #[source]
        source: ParseIntError,
    },

    /// The driver identity of a freshly resolved motor could not be read.
    /// Fatal during resolution.
    #[error("could not get driver name: {source}")]
    DriverQuery {
        /// The underlying read or parse error.
        #[source]
        source: Box<Error>,
    },

    /// A [`DriverMismatch`] promoted to a hard error by the caller.
    #[error(transparent)]
    Mismatch(#[from] DriverMismatch),

    /// An attribute could not be read from the store.
    #[error("failed to read {attr}: {source}")]
    AttrRead {
        /// The attribute name.
        attr: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An attribute could not be written to the store.
    #[error("failed to write {attr}: {source}")]
    AttrWrite {
        /// The attribute name.
        attr: &'static str,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An attribute value was read but is not parseable as its scalar type.
    #[error("failed to parse {attr} value {value:?}: {source}")]
    AttrParse {
        /// The attribute name.
        attr: &'static str,
        /// The value as read from the store.
        value: String,
        /// The underlying parse error.
        #[source]
        source: ParseIntError,
    },

    /// A candidate value lies outside the attribute's numeric range.
    #[error("invalid {attr}: {value} (valid {min} to {max})")]
    Range {
        /// The attribute name.
        attr: &'static str,
        /// The rejected value.
        value: i64,
        /// Smallest accepted value.
        min: i64,
        /// Largest accepted value.
        max: i64,
    },

    /// A candidate value does not round-trip through a 32-bit signed
    /// representation.
    #[error("invalid {attr}: {value} (valid in i32)")]
    NotInt32 {
        /// The attribute name.
        attr: &'static str,
        /// The rejected value.
        value: i64,
    },

    /// A candidate duration does not fit the device's signed 32-bit
    /// millisecond field.
    #[error("invalid {attr}: {millis} ms (valid in i32 milliseconds)")]
    DurationRange {
        /// The attribute name.
        attr: &'static str,
        /// The rejected duration in whole milliseconds.
        millis: u128,
    },

    /// A polarity token other than `normal` or `inversed`.
    #[error("invalid polarity {value:?} (valid \"normal\" or \"inversed\")")]
    InvalidPolarity {
        /// The rejected token.
        value: String,
    },

    /// A command token outside the set the device currently accepts.
    #[error("{attr} {command:?} not available for {motor} (available: {available:?})")]
    CommandNotAvailable {
        /// Which command channel rejected the token.
        attr: &'static str,
        /// The motor node the command was issued to.
        motor: String,
        /// The rejected token.
        command: String,
        /// The full set the device accepts.
        available: Vec<String>,
    },
}
