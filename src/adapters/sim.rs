//! Simulated platform: in-memory actuators behind the real port traits.
//!
//! Lets the binary and the tests run the full robot on a host machine.
//! PWM outputs record their duty, the CAN motor integrates its output into
//! an encoder position, and the swerve stack records every request.

use embedded_hal::pwm::{self, ErrorKind, ErrorType, SetDutyCycle};
use log::debug;

use crate::app::ports::{EncodedMotorPort, SwervePort};
use crate::config::ControllerConfig;
use crate::error::{ActuatorError, Result};
use crate::robot::{Hardware, Platform};
use crate::subsystems::drivetrain::SwerveRequest;

/// 20 ms frame at 1 µs resolution.
const SIM_PWM_MAX_DUTY: u16 = 20_000;

/// Encoder rotations per tick at full output.
const SIM_MOTOR_ROTATIONS_PER_TICK: f32 = 0.5;

// ───────────────────────────────────────────────────────────────
// PWM
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPwmError;

impl pwm::Error for SimPwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug)]
pub struct SimPwm {
    channel: u8,
    duty: u16,
    writes: u32,
}

impl SimPwm {
    pub fn new(channel: u8) -> Self {
        Self {
            channel,
            duty: 0,
            writes: 0,
        }
    }

    pub fn duty(&self) -> u16 {
        self.duty
    }

    /// Pulse width in microseconds.
    pub fn pulse_us(&self) -> u16 {
        self.duty
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ErrorType for SimPwm {
    type Error = SimPwmError;
}

impl SetDutyCycle for SimPwm {
    fn max_duty_cycle(&self) -> u16 {
        SIM_PWM_MAX_DUTY
    }

    fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), Self::Error> {
        if duty > SIM_PWM_MAX_DUTY {
            return Err(SimPwmError);
        }
        if duty != self.duty {
            debug!("sim PWM {}: {} us", self.channel, duty);
        }
        self.duty = duty;
        self.writes += 1;
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// CAN motor
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct SimCanMotor {
    can_id: u8,
    output: f32,
    position: f32,
}

impl SimCanMotor {
    pub fn new(can_id: u8) -> Self {
        Self {
            can_id,
            output: 0.0,
            position: 0.0,
        }
    }

    pub fn can_id(&self) -> u8 {
        self.can_id
    }

    pub fn output(&self) -> f32 {
        self.output
    }
}

impl EncodedMotorPort for SimCanMotor {
    fn set_output(&mut self, percent: f32) -> Result<()> {
        if !percent.is_finite() {
            return Err(ActuatorError::CanWriteFailed.into());
        }
        self.output = percent;
        self.position += percent * SIM_MOTOR_ROTATIONS_PER_TICK;
        Ok(())
    }

    fn position(&self) -> f32 {
        self.position
    }
}

// ───────────────────────────────────────────────────────────────
// Swerve
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SimSwerve {
    last: Option<SwerveRequest>,
    applied: u32,
    seeds: u32,
}

impl SimSwerve {
    pub fn last(&self) -> Option<SwerveRequest> {
        self.last
    }

    pub fn applied(&self) -> u32 {
        self.applied
    }

    pub fn seeds(&self) -> u32 {
        self.seeds
    }
}

impl SwervePort for SimSwerve {
    fn apply(&mut self, request: &SwerveRequest) -> Result<()> {
        self.last = Some(*request);
        self.applied += 1;
        Ok(())
    }

    fn seed_field_centric(&mut self) {
        debug!("sim swerve: heading seeded");
        self.seeds += 1;
    }
}

// ───────────────────────────────────────────────────────────────
// Platform
// ───────────────────────────────────────────────────────────────

pub struct SimPlatform;

impl Platform for SimPlatform {
    type Pwm = SimPwm;
    type Can = SimCanMotor;
    type Swerve = SimSwerve;
}

impl SimPlatform {
    /// Simulated ports on the configured channels.
    pub fn hardware(config: &ControllerConfig) -> Hardware<Self> {
        let ch = config.channels;
        Hardware {
            general_motor: SimPwm::new(ch.general_motor_pwm),
            general_servo: SimPwm::new(ch.general_servo_pwm),
            encoded_motor: SimCanMotor::new(ch.encoded_motor_can),
            drivetrain: SimSwerve::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pwm_rejects_duty_above_frame() {
        let mut pwm = SimPwm::new(4);
        assert!(pwm.set_duty_cycle(1_500).is_ok());
        assert_eq!(pwm.pulse_us(), 1_500);
        assert_eq!(pwm.set_duty_cycle(SIM_PWM_MAX_DUTY + 1), Err(SimPwmError));
        assert_eq!(pwm.writes(), 1);
    }

    #[test]
    fn can_motor_integrates_output() {
        let mut motor = SimCanMotor::new(5);
        motor.set_output(0.5).unwrap();
        motor.set_output(0.5).unwrap();
        assert!((motor.position() - 0.5).abs() < 1e-6);
        assert!(motor.set_output(f32::NAN).is_err());
    }
}
