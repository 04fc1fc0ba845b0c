//! Robot subsystems: one struct per physical actuator.
//!
//! Subsystems are dumb actuators.  They hold no scheduling state and never
//! decide who may drive them; the scheduler's ownership map does that.
//! Each one wraps a port (an `embedded-hal` PWM output, a CAN motor port or
//! the swerve port) and records the last value it commanded so telemetry
//! can report it.
//!
//! ## PWM pulse mapping
//!
//! Hobby servos and PWM motor controllers both expect a 50 Hz pulse train
//! whose width encodes the set-point:
//!
//! | Pulse  | Duty  | Motor        | Servo |
//! |--------|-------|--------------|-------|
//! | 1.0 ms | 5 %   | full reverse | 0.0   |
//! | 1.5 ms | 7.5 % | neutral      | 0.5   |
//! | 2.0 ms | 10 %  | full forward | 1.0   |

pub mod drivetrain;
pub mod encoded_motor;
pub mod general_motor;
pub mod general_servo;

use embedded_hal::pwm::SetDutyCycle;

use crate::error::{ActuatorError, Result};

/// Duty fraction of a 1.0 ms pulse in a 20 ms frame.
const PULSE_MIN_DUTY: f32 = 0.05;
/// Duty fraction of a 2.0 ms pulse in a 20 ms frame.
const PULSE_MAX_DUTY: f32 = 0.10;

/// Write a pulse whose width is `fraction` (0..1) of the 1–2 ms span.
pub(crate) fn write_pulse(pwm: &mut impl SetDutyCycle, fraction: f32) -> Result<()> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(ActuatorError::OutOfRange.into());
    }
    let duty = PULSE_MIN_DUTY + fraction * (PULSE_MAX_DUTY - PULSE_MIN_DUTY);
    let raw = (duty * f32::from(pwm.max_duty_cycle())).round() as u16;
    pwm.set_duty_cycle(raw)
        .map_err(|_| ActuatorError::PwmWriteFailed.into())
}
