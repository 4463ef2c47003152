//! Motor handles, device resolution, and the attribute accessors.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bitflags::bitflags;
use parking_lot::Mutex;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{DriverMismatch, Error};
use crate::paths::{attr, port_name, LEGO_PORT_CLASS, MOTOR_PREFIX, PORT_COUNT, TACHO_MOTOR};
use crate::port::PortResolver;
use crate::store::{chomp, AttrStore};

const DUTY_CYCLE_MIN: i64 = -100;
const DUTY_CYCLE_MAX: i64 = 100;

/// Identifier of a motor node within the tacho-motor class.
///
/// Assigned by the host when the device is enumerated; never changes for
/// the lifetime of the device.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorId(pub u32);

impl MotorId {
    /// Path segment of the motor node, e.g. `motor3`.
    pub fn node(&self) -> String {
        format!("{MOTOR_PREFIX}{}", self.0)
    }
}

impl fmt::Display for MotorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{MOTOR_PREFIX}{}", self.0)
    }
}

bitflags! {
    /// Bitmask decoded from the whitespace-separated token listing of the
    /// `state` attribute.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MotorState: u32 {
        /// Power is being sent to the motor.
        const RUNNING = 1 << 0;
        /// The motor is ramping up or down.
        const RAMPING = 1 << 1;
        /// The motor is actively holding its position.
        const HOLDING = 1 << 2;
        /// The motor is turning but cannot reach its speed set point.
        const OVERLOADED = 1 << 3;
        /// The motor is not turning when it should be.
        const STALLED = 1 << 4;
    }
}

impl MotorState {
    /// Unknown tokens contribute no bits and do not error.
    fn decode(listing: &str) -> MotorState {
        let mut state = MotorState::empty();
        for token in listing.split_whitespace() {
            state |= match token {
                "running" => MotorState::RUNNING,
                "ramping" => MotorState::RAMPING,
                "holding" => MotorState::HOLDING,
                "overloaded" => MotorState::OVERLOADED,
                "stalled" => MotorState::STALLED,
                _ => MotorState::empty(),
            };
        }
        state
    }
}

/// Rotation sense of the motor relative to its positive command direction.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Positive commands turn the motor in its native direction.
    Normal,
    /// Positive commands turn the motor in the opposite direction.
    Inversed,
}

impl Polarity {
    /// The token the device stores for this polarity.
    pub fn as_str(&self) -> &'static str {
        match self {
            Polarity::Normal => "normal",
            Polarity::Inversed => "inversed",
        }
    }
}

impl fmt::Display for Polarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Polarity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Polarity::Normal),
            "inversed" => Ok(Polarity::Inversed),
            _ => Err(Error::InvalidPolarity {
                value: s.to_owned(),
            }),
        }
    }
}

/// Handle to one tacho-motor device.
///
/// Setters on a handle are serialized by a per-handle lock; getters are
/// deliberately not synchronized against setters, matching the consistency
/// the underlying attribute files themselves provide. A getter racing a
/// setter on the same attribute may observe either value. Distinct handles
/// never contend on the same lock.
///
/// Handles are never explicitly closed; an id stays valid for as long as
/// the host keeps the device enumerated.
pub struct TachoMotor<S> {
    store: Arc<S>,
    id: MotorId,
    write_lock: Mutex<()>,
}

impl<S: AttrStore> TachoMotor<S> {
    /// A handle for a known motor id.
    ///
    /// Prefer [`TachoMotor::find`] when the id is not already known.
    pub fn new(store: Arc<S>, id: MotorId) -> Self {
        TachoMotor {
            store,
            id,
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the motor's id.
    pub fn id(&self) -> MotorId {
        self.id
    }

    /// Resolves `port` and `driver` to a motor handle.
    ///
    /// With an empty `port`, the candidate ports `port0`..`port7` are
    /// scanned in order and the first motor whose driver matches `driver`
    /// is returned; exhausting the scan fails with [`Error::NoDevice`].
    ///
    /// With a named port, the resolved motor is returned even when its
    /// driver differs from `driver`: the handle comes back together with
    /// `Some(DriverMismatch)` so the caller can decide whether the
    /// difference matters.
    ///
    /// # Errors
    ///
    /// Port resolution failures are propagated verbatim. The motor subtree
    /// must hold exactly one entry carrying the `motor` name prefix with a
    /// numeric suffix; anything else fails with [`Error::DeviceCount`],
    /// [`Error::NotAMotor`], or [`Error::BadMotorId`]. A failure to read
    /// the resolved motor's driver identity is fatal ([`Error::DriverQuery`]).
    pub fn find<R>(
        store: Arc<S>,
        resolver: &R,
        port: &str,
        driver: &str,
    ) -> Result<(Self, Option<DriverMismatch>), Error>
    where
        R: PortResolver,
    {
        if port.is_empty() {
            for index in 0..PORT_COUNT {
                let candidate = port_name(index);
                // A motor with a mismatching driver does not stop the scan.
                if let Ok((motor, None)) =
                    Self::find(Arc::clone(&store), resolver, &candidate, driver)
                {
                    debug!(port = %candidate, motor = %motor.id, "found motor by port scan");
                    return Ok((motor, None));
                }
            }
            return Err(Error::NoDevice {
                driver: driver.to_owned(),
            });
        }

        let conn = resolver.connected_to(port)?;
        let device_path = Path::new(LEGO_PORT_CLASS).join(&conn.node).join(&conn.device);
        let entries = store.list(&device_path).map_err(|source| Error::List {
            path: device_path.clone(),
            source,
        })?;
        // A port with no matching mapping is left to fail on the subtree
        // enumeration below rather than being rejected here.
        let mapping = entries
            .iter()
            .find(|entry| entry.split(':').next() == Some(port))
            .cloned()
            .unwrap_or_default();
        let subtree = device_path.join(&mapping).join(TACHO_MOTOR);
        let entries = store.list(&subtree).map_err(|source| Error::List {
            path: subtree.clone(),
            source,
        })?;
        if entries.len() != 1 {
            return Err(Error::DeviceCount {
                path: subtree,
                entries,
            });
        }
        let entry = &entries[0];
        let Some(suffix) = entry.strip_prefix(MOTOR_PREFIX) else {
            return Err(Error::NotAMotor {
                path: subtree,
                entry: entry.clone(),
            });
        };
        let id = suffix.parse::<u32>().map_err(|source| Error::BadMotorId {
            entry: entry.clone(),
            source,
        })?;

        let motor = Self::new(store, MotorId(id));
        let have = motor.driver().map_err(|source| Error::DriverQuery {
            source: Box::new(source),
        })?;
        let mismatch = if have == driver {
            None
        } else {
            warn!(want = driver, have = %have, motor = %motor.id, "driver mismatch");
            Some(DriverMismatch {
                want: driver.to_owned(),
                have,
            })
        };
        Ok((motor, mismatch))
    }

    fn attr_path(&self, attr: &'static str) -> PathBuf {
        Path::new(TACHO_MOTOR).join(self.id.node()).join(attr)
    }

    fn raw(&self, attr: &'static str) -> Result<String, Error> {
        let value = self
            .store
            .read(&self.attr_path(attr))
            .map_err(|source| Error::AttrRead { attr, source })?;
        Ok(chomp(&value).to_owned())
    }

    fn int(&self, attr: &'static str) -> Result<i64, Error> {
        let value = self.raw(attr)?;
        value
            .parse()
            .map_err(|source| Error::AttrParse { attr, value, source })
    }

    fn duration(&self, attr: &'static str) -> Result<Duration, Error> {
        let value = self.raw(attr)?;
        let millis: u64 = value
            .parse()
            .map_err(|source| Error::AttrParse { attr, value, source })?;
        Ok(Duration::from_millis(millis))
    }

    fn tokens(&self, attr: &'static str) -> Result<Vec<String>, Error> {
        Ok(self.raw(attr)?.split(' ').map(str::to_owned).collect())
    }

    fn write(&self, attr: &'static str, data: &str) -> Result<(), Error> {
        let _guard = self.write_lock.lock();
        self.store
            .write(&self.attr_path(attr), data)
            .map_err(|source| Error::AttrWrite { attr, source })
    }

    fn write_int(&self, attr: &'static str, value: i64) -> Result<(), Error> {
        self.write(attr, &format!("{value}\n"))
    }

    fn write_duration(&self, attr: &'static str, d: Duration) -> Result<(), Error> {
        let millis = d.as_millis();
        if millis > i32::MAX as u128 {
            return Err(Error::DurationRange { attr, millis });
        }
        self.write_int(attr, millis as i64)
    }

    /// Returns the port address the motor is connected to.
    pub fn address(&self) -> Result<String, Error> {
        self.raw(attr::ADDRESS)
    }

    /// Returns the commands the motor currently accepts.
    pub fn commands(&self) -> Result<Vec<String>, Error> {
        self.tokens(attr::COMMANDS)
    }

    /// Issues a command to the motor.
    ///
    /// The accepted set is read fresh from the device on every call, never
    /// cached; a token outside it is rejected before any write.
    pub fn command(&self, command: &str) -> Result<(), Error> {
        let available = self.commands()?;
        if !available.iter().any(|c| c == command) {
            return Err(Error::CommandNotAvailable {
                attr: attr::COMMAND,
                motor: self.id.node(),
                command: command.to_owned(),
                available,
            });
        }
        debug!(motor = %self.id, command, "issuing command");
        self.write(attr::COMMAND, command)
    }

    /// Returns the number of tacho counts in one rotation of the motor.
    ///
    /// The host rejects the query for non-rotational motors; that error is
    /// propagated, not masked.
    pub fn count_per_rot(&self) -> Result<i64, Error> {
        self.int(attr::COUNT_PER_ROT)
    }

    /// Returns the number of tacho counts in one meter of travel.
    ///
    /// The host rejects the query for non-linear motors.
    pub fn count_per_meter(&self) -> Result<i64, Error> {
        self.int(attr::COUNT_PER_METER)
    }

    /// Returns the number of tacho counts in the full travel of the motor.
    ///
    /// The host rejects the query for non-linear motors.
    pub fn full_travel_count(&self) -> Result<i64, Error> {
        self.int(attr::FULL_TRAVEL_COUNT)
    }

    /// Returns the driver name of the device.
    pub fn driver(&self) -> Result<String, Error> {
        self.raw(attr::DRIVER_NAME)
    }

    /// Returns the current duty cycle, in percent.
    pub fn duty_cycle(&self) -> Result<i64, Error> {
        self.int(attr::DUTY_CYCLE)
    }

    /// Returns the duty cycle set point, in percent.
    pub fn duty_cycle_set_point(&self) -> Result<i64, Error> {
        self.int(attr::DUTY_CYCLE_SP)
    }

    /// Sets the duty cycle set point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Range`] unless `sp` lies in `[-100, 100]`.
    pub fn set_duty_cycle_set_point(&self, sp: i64) -> Result<(), Error> {
        if !(DUTY_CYCLE_MIN..=DUTY_CYCLE_MAX).contains(&sp) {
            return Err(Error::Range {
                attr: attr::DUTY_CYCLE_SP,
                value: sp,
                min: DUTY_CYCLE_MIN,
                max: DUTY_CYCLE_MAX,
            });
        }
        self.write_int(attr::DUTY_CYCLE_SP, sp)
    }

    /// Returns the current polarity of the motor.
    pub fn polarity(&self) -> Result<Polarity, Error> {
        self.raw(attr::POLARITY)?.parse()
    }

    /// Sets the polarity of the motor.
    pub fn set_polarity(&self, polarity: Polarity) -> Result<(), Error> {
        self.write(attr::POLARITY, polarity.as_str())
    }

    /// Returns the current position, in tacho counts.
    pub fn position(&self) -> Result<i64, Error> {
        self.int(attr::POSITION)
    }

    /// Sets the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInt32`] unless `pos` round-trips through `i32`,
    /// the width of the device's position counter.
    pub fn set_position(&self, pos: i64) -> Result<(), Error> {
        if i32::try_from(pos).is_err() {
            return Err(Error::NotInt32 {
                attr: attr::POSITION,
                value: pos,
            });
        }
        self.write_int(attr::POSITION, pos)
    }

    /// Returns the derivative constant of the position-hold PID.
    pub fn hold_pid_kd(&self) -> Result<i64, Error> {
        self.int(attr::HOLD_PID_KD)
    }

    /// Sets the derivative constant of the position-hold PID.
    pub fn set_hold_pid_kd(&self, kd: i64) -> Result<(), Error> {
        self.write_int(attr::HOLD_PID_KD, kd)
    }

    /// Returns the integral constant of the position-hold PID.
    pub fn hold_pid_ki(&self) -> Result<i64, Error> {
        self.int(attr::HOLD_PID_KI)
    }

    /// Sets the integral constant of the position-hold PID.
    pub fn set_hold_pid_ki(&self, ki: i64) -> Result<(), Error> {
        self.write_int(attr::HOLD_PID_KI, ki)
    }

    /// Returns the proportional constant of the position-hold PID.
    pub fn hold_pid_kp(&self) -> Result<i64, Error> {
        self.int(attr::HOLD_PID_KP)
    }

    /// Sets the proportional constant of the position-hold PID.
    pub fn set_hold_pid_kp(&self, kp: i64) -> Result<(), Error> {
        self.write_int(attr::HOLD_PID_KP, kp)
    }

    /// Returns the position set point, in tacho counts.
    pub fn position_set_point(&self) -> Result<i64, Error> {
        self.int(attr::POSITION_SP)
    }

    /// Sets the position set point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInt32`] unless `pos` round-trips through `i32`.
    pub fn set_position_set_point(&self, pos: i64) -> Result<(), Error> {
        if i32::try_from(pos).is_err() {
            return Err(Error::NotInt32 {
                attr: attr::POSITION_SP,
                value: pos,
            });
        }
        self.write_int(attr::POSITION_SP, pos)
    }

    /// Returns the current speed, in tacho counts per second.
    pub fn speed(&self) -> Result<i64, Error> {
        self.int(attr::SPEED)
    }

    /// Returns the speed set point, in tacho counts per second.
    pub fn speed_set_point(&self) -> Result<i64, Error> {
        self.int(attr::SPEED_SP)
    }

    /// Sets the speed set point.
    pub fn set_speed_set_point(&self, sp: i64) -> Result<(), Error> {
        self.write_int(attr::SPEED_SP, sp)
    }

    /// Returns the ramp up set point.
    pub fn ramp_up_set_point(&self) -> Result<Duration, Error> {
        self.duration(attr::RAMP_UP_SP)
    }

    /// Sets the ramp up set point, stored in whole milliseconds.
    pub fn set_ramp_up_set_point(&self, d: Duration) -> Result<(), Error> {
        self.write_duration(attr::RAMP_UP_SP, d)
    }

    /// Returns the ramp down set point.
    pub fn ramp_down_set_point(&self) -> Result<Duration, Error> {
        self.duration(attr::RAMP_DOWN_SP)
    }

    /// Sets the ramp down set point, stored in whole milliseconds.
    pub fn set_ramp_down_set_point(&self, d: Duration) -> Result<(), Error> {
        self.write_duration(attr::RAMP_DOWN_SP, d)
    }

    /// Returns the derivative constant of the speed regulation PID.
    pub fn speed_pid_kd(&self) -> Result<i64, Error> {
        self.int(attr::SPEED_PID_KD)
    }

    /// Sets the derivative constant of the speed regulation PID.
    pub fn set_speed_pid_kd(&self, kd: i64) -> Result<(), Error> {
        self.write_int(attr::SPEED_PID_KD, kd)
    }

    /// Returns the integral constant of the speed regulation PID.
    pub fn speed_pid_ki(&self) -> Result<i64, Error> {
        self.int(attr::SPEED_PID_KI)
    }

    /// Sets the integral constant of the speed regulation PID.
    pub fn set_speed_pid_ki(&self, ki: i64) -> Result<(), Error> {
        self.write_int(attr::SPEED_PID_KI, ki)
    }

    /// Returns the proportional constant of the speed regulation PID.
    pub fn speed_pid_kp(&self) -> Result<i64, Error> {
        self.int(attr::SPEED_PID_KP)
    }

    /// Sets the proportional constant of the speed regulation PID.
    pub fn set_speed_pid_kp(&self, kp: i64) -> Result<(), Error> {
        self.write_int(attr::SPEED_PID_KP, kp)
    }

    /// Returns the current state of the motor.
    pub fn state(&self) -> Result<MotorState, Error> {
        Ok(MotorState::decode(&self.raw(attr::STATE)?))
    }

    /// Returns the stop action used when a stop command is issued.
    pub fn stop_command(&self) -> Result<String, Error> {
        self.raw(attr::STOP_COMMAND)
    }

    /// Sets the stop action used when a stop command is issued.
    ///
    /// The accepted set is read fresh from the device on every call; a
    /// token outside it is rejected before any write.
    pub fn set_stop_command(&self, command: &str) -> Result<(), Error> {
        let available = self.stop_commands()?;
        if !available.iter().any(|c| c == command) {
            return Err(Error::CommandNotAvailable {
                attr: attr::STOP_COMMAND,
                motor: self.id.node(),
                command: command.to_owned(),
                available,
            });
        }
        self.write(attr::STOP_COMMAND, command)
    }

    /// Returns the stop actions the motor currently accepts.
    pub fn stop_commands(&self) -> Result<Vec<String>, Error> {
        self.tokens(attr::STOP_COMMANDS)
    }

    /// Returns the time set point for timed run commands.
    pub fn time_set_point(&self) -> Result<Duration, Error> {
        self.duration(attr::TIME_SP)
    }

    /// Sets the time set point, stored in whole milliseconds.
    pub fn set_time_set_point(&self, d: Duration) -> Result<(), Error> {
        self.write_duration(attr::TIME_SP, d)
    }
}

impl<S> fmt::Debug for TachoMotor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TachoMotor").field("id", &self.id).finish()
    }
}
