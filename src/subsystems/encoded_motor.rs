//! CAN motor with an integrated encoder.
//!
//! Runs open-loop (`set`) or drives to a destination with the position
//! loop (`go_to` + `step_to_destination`).

use log::{debug, info};

use crate::app::ports::EncodedMotorPort;
use crate::config::EncodedMotorConfig;
use crate::control::pid::PidController;
use crate::error::{ActuatorError, Result};

pub struct EncodedMotor<M> {
    port: M,
    can_id: u8,
    pid: PidController,
    output: f32,
}

impl<M: EncodedMotorPort> EncodedMotor<M> {
    pub fn new(port: M, can_id: u8, config: &EncodedMotorConfig) -> Self {
        let mut pid = PidController::new(config.gains, 0.0);
        pid.set_limits(-config.max_output, config.max_output);
        pid.set_tolerance(config.tolerance);
        Self {
            port,
            can_id,
            pid,
            output: 0.0,
        }
    }

    /// Open-loop output in `-1.0..=1.0`.
    pub fn set(&mut self, percent: f32) -> Result<()> {
        if !(-1.0..=1.0).contains(&percent) {
            return Err(ActuatorError::OutOfRange.into());
        }
        self.port.set_output(percent)?;
        self.output = percent;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.set(0.0)
    }

    /// Arm the position loop for `destination` (rotations).
    pub fn go_to(&mut self, destination: f32) {
        info!("Encoded motor (CAN {}): go to {:.2}", self.can_id, destination);
        self.pid.set_target(destination);
    }

    /// One position-loop step.  Returns true once within tolerance.
    pub fn step_to_destination(&mut self, dt: f32) -> Result<bool> {
        let position = self.port.position();
        if self.pid.at_setpoint(position) {
            self.stop()?;
            return Ok(true);
        }
        let output = self.pid.compute(position, dt);
        debug!("Encoded motor (CAN {}): pos={:.2} out={:.3}", self.can_id, position, output);
        self.set(output)?;
        Ok(false)
    }

    pub fn position(&self) -> f32 {
        self.port.position()
    }

    pub fn at_destination(&self) -> bool {
        self.pid.at_setpoint(self.port.position())
    }

    pub fn destination(&self) -> f32 {
        self.pid.target()
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn is_running(&self) -> bool {
        self.output != 0.0
    }

    pub fn port(&self) -> &M {
        &self.port
    }
}
