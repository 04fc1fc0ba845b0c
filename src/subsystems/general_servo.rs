//! Positional servo on a PWM channel.
//!
//! Position is normalised to `0.0..=1.0` of travel.  The servo has no
//! feedback; [`position`](GeneralServo::position) is the last commanded
//! pulse.  Moves are slewed by commands at a fixed step per tick, so the
//! destination and the position differ while a move is in progress.

use embedded_hal::pwm::SetDutyCycle;

use crate::error::Result;

pub struct GeneralServo<P> {
    pwm: P,
    channel: u8,
    position: f32,
    destination: f32,
}

impl<P: SetDutyCycle> GeneralServo<P> {
    /// Starts centred; nothing is written until the first command.
    pub fn new(pwm: P, channel: u8) -> Self {
        Self {
            pwm,
            channel,
            position: 0.5,
            destination: 0.5,
        }
    }

    pub fn set_destination(&mut self, destination: f32) {
        self.destination = destination.clamp(0.0, 1.0);
    }

    /// Move the destination by `delta`, saturating at the ends of travel.
    pub fn adjust_destination(&mut self, delta: f32) {
        self.set_destination(self.destination + delta);
    }

    /// Advance the position toward the destination by at most `step` and
    /// write the pulse.  Returns true once the destination is reached.
    pub fn step_toward_destination(&mut self, step: f32) -> Result<bool> {
        let remaining = self.destination - self.position;
        let next = if remaining.abs() <= step {
            self.destination
        } else {
            self.position + step.copysign(remaining)
        };
        self.write(next)?;
        Ok(self.at_destination())
    }

    /// Write `position` immediately.
    pub fn write(&mut self, position: f32) -> Result<()> {
        super::write_pulse(&mut self.pwm, position)?;
        self.position = position;
        Ok(())
    }

    pub fn at_destination(&self) -> bool {
        (self.destination - self.position).abs() < f32::EPSILON
    }

    pub fn position(&self) -> f32 {
        self.position
    }

    pub fn destination(&self) -> f32 {
        self.destination
    }

    pub fn channel(&self) -> u8 {
        self.channel
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}
