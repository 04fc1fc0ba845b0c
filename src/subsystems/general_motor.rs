//! General-purpose PWM motor (motor controller on a PWM channel).
//!
//! Open-loop only: output in `-1.0..=1.0`, mapped onto the 1–2 ms pulse.

use embedded_hal::pwm::SetDutyCycle;
use log::debug;

use crate::error::{ActuatorError, Result};

pub struct GeneralMotor<P> {
    pwm: P,
    channel: u8,
    output: f32,
}

impl<P: SetDutyCycle> GeneralMotor<P> {
    pub fn new(pwm: P, channel: u8) -> Self {
        Self {
            pwm,
            channel,
            output: 0.0,
        }
    }

    /// Drive at `percent` of full output (negative is reverse).
    pub fn set(&mut self, percent: f32) -> Result<()> {
        if !(-1.0..=1.0).contains(&percent) {
            return Err(ActuatorError::OutOfRange.into());
        }
        super::write_pulse(&mut self.pwm, (percent + 1.0) / 2.0)?;
        if percent != self.output {
            debug!("General motor (PWM {}): {:.2}", self.channel, percent);
        }
        self.output = percent;
        Ok(())
    }

    pub fn stop(&mut self) -> Result<()> {
        self.set(0.0)
    }

    pub fn output(&self) -> f32 {
        self.output
    }

    pub fn is_running(&self) -> bool {
        self.output != 0.0
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}
