//! Controller configuration parameters
//!
//! All tunable parameters for the robot program.  Defaults match the
//! competition robot; a JSON file passed to the binary can override any
//! subset of them.

use serde::{Deserialize, Serialize};

use crate::control::pid::PidGains;
use crate::error::{Error, Result};

/// Core controller configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    // --- Timing ---
    /// Scheduler tick period (milliseconds)
    pub tick_period_ms: u32,
    /// Telemetry publish interval (ticks)
    pub telemetry_interval_ticks: u32,

    // --- Wiring ---
    pub channels: ChannelConfig,

    // --- Dashboard ---
    pub dashboard: DashboardTitles,

    // --- Actuators ---
    pub swerve: SwerveConfig,
    pub servo: ServoConfig,
    pub encoded_motor: EncodedMotorConfig,
    /// Open-loop output of the general motor while X is held (-1..1)
    pub general_motor_forward_percent: f32,

    // --- Autonomous ---
    /// Routine selected at startup
    pub default_autonomous: String,
}

/// Actuator channel numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    pub general_motor_pwm: u8,
    pub general_servo_pwm: u8,
    pub encoded_motor_can: u8,
}

/// Dashboard titles the telemetry values are published under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardTitles {
    pub general_motor_running: String,
    pub general_servo_position: String,
    pub general_servo_destination: String,
    pub encoded_motor_running: String,
    pub encoded_motor_position: String,
}

/// Swerve drive limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwerveConfig {
    /// Top translational speed (m/s)
    pub max_speed_mps: f32,
    /// Top rotational rate (rotations per second)
    pub max_rotation_rps: f32,
    /// POV nudge speed as a fraction of top speed
    pub max_pov_speed: f32,
    /// Stick deadband as a fraction of full scale
    pub deadband: f32,
}

/// Servo positions, normalised to 0..1 of travel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServoConfig {
    pub min_position: f32,
    pub max_position: f32,
    pub a_position: f32,
    /// Travel per tick while moving or adjusting
    pub step_per_tick: f32,
}

/// Encoded motor destinations and loop tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodedMotorConfig {
    /// Open-loop output while POV up is held (-1..1)
    pub forward_percent: f32,
    /// Destination A (rotations)
    pub destination_a: f32,
    /// Destination B (rotations)
    pub destination_b: f32,
    /// Arrival band (rotations)
    pub tolerance: f32,
    /// Output clamp of the position loop (0..1)
    pub max_output: f32,
    pub gains: PidGains,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            // Timing
            tick_period_ms: 20,           // 50 Hz
            telemetry_interval_ticks: 50, // 1/s

            channels: ChannelConfig::default(),
            dashboard: DashboardTitles::default(),

            swerve: SwerveConfig::default(),
            servo: ServoConfig::default(),
            encoded_motor: EncodedMotorConfig::default(),
            general_motor_forward_percent: 0.5,

            default_autonomous: "Tests".into(),
        }
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            general_motor_pwm: 4,
            general_servo_pwm: 9,
            encoded_motor_can: 5,
        }
    }
}

impl Default for DashboardTitles {
    fn default() -> Self {
        Self {
            general_motor_running: "General Motor Running".into(),
            general_servo_position: "General Servo Position".into(),
            general_servo_destination: "General Servo Destination".into(),
            encoded_motor_running: "Encoded Motor Running".into(),
            encoded_motor_position: "Encoded Motor Position".into(),
        }
    }
}

impl Default for SwerveConfig {
    fn default() -> Self {
        Self {
            max_speed_mps: 4.5,
            max_rotation_rps: 0.75,
            max_pov_speed: 0.2,
            deadband: 0.1,
        }
    }
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_position: 0.0,
            max_position: 1.0,
            a_position: 0.5,
            step_per_tick: 0.02,
        }
    }
}

impl Default for EncodedMotorConfig {
    fn default() -> Self {
        Self {
            forward_percent: 0.3,
            destination_a: 10.0,
            destination_b: 25.0,
            tolerance: 0.25,
            max_output: 0.6,
            gains: PidGains {
                kp: 0.15,
                ki: 0.0,
                kd: 0.002,
            },
        }
    }
}

impl SwerveConfig {
    /// Top rotational rate in radians per second.
    pub fn max_angular_rate(&self) -> f32 {
        self.max_rotation_rps * core::f32::consts::TAU
    }
}

impl ControllerConfig {
    /// Seconds per tick.
    pub fn tick_secs(&self) -> f32 {
        self.tick_period_ms as f32 / 1000.0
    }

    /// Reject values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.tick_period_ms == 0 {
            return Err(Error::Config("tick period must be non-zero"));
        }
        if self.channels.general_motor_pwm == self.channels.general_servo_pwm {
            return Err(Error::Config("PWM channels must be distinct"));
        }
        let s = &self.swerve;
        if s.max_speed_mps <= 0.0 || s.max_rotation_rps <= 0.0 {
            return Err(Error::Config("swerve limits must be positive"));
        }
        if !(0.0..1.0).contains(&s.deadband) {
            return Err(Error::Config("deadband must be in [0, 1)"));
        }
        if !(0.0..=1.0).contains(&s.max_pov_speed) {
            return Err(Error::Config("POV speed must be in [0, 1]"));
        }
        let v = &self.servo;
        let travel = 0.0..=1.0;
        if !travel.contains(&v.min_position) || !travel.contains(&v.max_position) {
            return Err(Error::Config("servo positions must be in [0, 1]"));
        }
        if v.min_position >= v.max_position {
            return Err(Error::Config("servo min must be below max"));
        }
        if !(v.min_position..=v.max_position).contains(&v.a_position) {
            return Err(Error::Config("servo A position outside travel"));
        }
        if v.step_per_tick <= 0.0 {
            return Err(Error::Config("servo step must be positive"));
        }
        let m = &self.encoded_motor;
        if !(0.0..=1.0).contains(&m.max_output) || m.tolerance <= 0.0 {
            return Err(Error::Config("encoded motor loop limits out of range"));
        }
        if self.general_motor_forward_percent.abs() > 1.0 || m.forward_percent.abs() > 1.0 {
            return Err(Error::Config("open-loop output must be in [-1, 1]"));
        }
        Ok(())
    }
}
