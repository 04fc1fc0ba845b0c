//! PID controller for closed-loop position control.
//!
//! Drives the encoded motor to a destination given encoder feedback.
//! Output is clamped and integration stops while saturated.

use serde::{Deserialize, Serialize};

/// Proportional, integral and derivative gains.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f32,
    pub ki: f32,
    pub kd: f32,
}

/// PID controller
#[derive(Debug, Clone)]
pub struct PidController {
    gains: PidGains,
    setpoint: f32,
    /// Error band within which the setpoint counts as reached.
    tolerance: f32,
    integral: f32,
    prev_error: Option<f32>,
    output_min: f32,
    output_max: f32,
}

impl PidController {
    pub fn new(gains: PidGains, setpoint: f32) -> Self {
        Self {
            gains,
            setpoint,
            tolerance: 0.0,
            integral: 0.0,
            prev_error: None,
            output_min: -1.0,
            output_max: 1.0,
        }
    }

    /// Set output limits
    pub fn set_limits(&mut self, min: f32, max: f32) {
        self.output_min = min;
        self.output_max = max;
    }

    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance.abs();
    }

    /// Update setpoint and forget accumulated state.
    pub fn set_target(&mut self, setpoint: f32) {
        self.setpoint = setpoint;
        self.reset();
    }

    pub fn target(&self) -> f32 {
        self.setpoint
    }

    /// Whether `measurement` is within tolerance of the setpoint.
    pub fn at_setpoint(&self, measurement: f32) -> bool {
        (self.setpoint - measurement).abs() <= self.tolerance
    }

    /// Compute PID output given current measurement
    pub fn compute(&mut self, measurement: f32, dt: f32) -> f32 {
        let error = self.setpoint - measurement;

        let p = self.gains.kp * error;

        self.integral += error * dt;
        let i = self.gains.ki * self.integral;

        // No derivative kick on the first sample after a reset
        let derivative = match self.prev_error {
            Some(prev) if dt > 0.0 => (error - prev) / dt,
            _ => 0.0,
        };
        let d = self.gains.kd * derivative;

        self.prev_error = Some(error);

        let output = (p + i + d).clamp(self.output_min, self.output_max);

        // Anti-windup: if output is saturated, stop integrating
        if output >= self.output_max || output <= self.output_min {
            self.integral -= error * dt;
        }

        output
    }

    /// Reset controller state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.prev_error = None;
    }
}
