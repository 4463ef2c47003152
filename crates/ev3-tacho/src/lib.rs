#![warn(missing_docs)]
#![doc = "A client for the ev3dev tacho-motor sysfs interface."]
#![doc = ""]
#![doc = "This crate resolves a lego-port name and an expected driver identifier"]
#![doc = "to a unique motor device node, then exposes typed getters and setters"]
#![doc = "for every tunable attribute: duty cycle, speed, position, PID gains,"]
#![doc = "ramp timings, stop behavior, and command issuance."]
#![doc = ""]
#![doc = "All calls are synchronous, blocking transactions against the attribute"]
#![doc = "file space. Setters validate before they write; writes on one handle"]
#![doc = "are serialized, reads are not synchronized against writes."]

pub mod error;
pub mod motor;
pub mod port;
pub mod store;

mod paths;

#[cfg(test)]
mod testutil;

pub use error::{DriverMismatch, Error};
pub use motor::{MotorId, MotorState, Polarity, TachoMotor};
pub use port::{Connection, PortResolver, SysfsPortResolver};
pub use store::{AttrStore, Sysfs};
