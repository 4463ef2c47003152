//! Path fragments of the sysfs class tree.
//!
//! These are fixed by the ev3dev kernel drivers and loaded nowhere else;
//! every path handed to the attribute store is assembled from this table.

/// Class directory holding the lego-port nodes.
pub(crate) const LEGO_PORT_CLASS: &str = "lego-port";

/// Class directory holding the motor nodes, and also the name of the
/// subtree under a port mapping that holds the bound motor instance.
pub(crate) const TACHO_MOTOR: &str = "tacho-motor";

/// Name prefix of a motor node, followed by its numeric id.
pub(crate) const MOTOR_PREFIX: &str = "motor";

/// Name prefix of a generated port name, followed by its index.
pub(crate) const PORT_PREFIX: &str = "port";

/// Number of physical ports scanned when no port name is given.
pub(crate) const PORT_COUNT: u32 = 8;

/// Generated port name for the brute-force port scan.
pub(crate) fn port_name(index: u32) -> String {
    format!("{PORT_PREFIX}{index}")
}

/// Attribute names within a motor or port node.
pub(crate) mod attr {
    pub const ADDRESS: &str = "address";
    pub const COMMAND: &str = "command";
    pub const COMMANDS: &str = "commands";
    pub const COUNT_PER_METER: &str = "count_per_meter";
    pub const COUNT_PER_ROT: &str = "count_per_rot";
    pub const DRIVER_NAME: &str = "driver_name";
    pub const DUTY_CYCLE: &str = "duty_cycle";
    pub const DUTY_CYCLE_SP: &str = "duty_cycle_sp";
    pub const FULL_TRAVEL_COUNT: &str = "full_travel_count";
    pub const HOLD_PID_KD: &str = "hold_pid/Kd";
    pub const HOLD_PID_KI: &str = "hold_pid/Ki";
    pub const HOLD_PID_KP: &str = "hold_pid/Kp";
    pub const POLARITY: &str = "polarity";
    pub const POSITION: &str = "position";
    pub const POSITION_SP: &str = "position_sp";
    pub const RAMP_DOWN_SP: &str = "ramp_down_sp";
    pub const RAMP_UP_SP: &str = "ramp_up_sp";
    pub const SPEED: &str = "speed";
    pub const SPEED_PID_KD: &str = "speed_pid/Kd";
    pub const SPEED_PID_KI: &str = "speed_pid/Ki";
    pub const SPEED_PID_KP: &str = "speed_pid/Kp";
    pub const SPEED_SP: &str = "speed_sp";
    pub const STATE: &str = "state";
    pub const STOP_COMMAND: &str = "stop_command";
    pub const STOP_COMMANDS: &str = "stop_commands";
    pub const TIME_SP: &str = "time_sp";
}
