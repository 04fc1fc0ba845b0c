//! Swerve drivetrain.
//!
//! The drivetrain forwards [`SwerveRequest`]s to the module stack behind a
//! [`SwervePort`] and remembers the last one for telemetry.  Joystick
//! shaping (deadband, scaling, axis conventions) lives here so every
//! command drives the same way.
//!
//! Axis convention: +x is forward, +y is left, +omega is counter-clockwise.
//! Controller sticks report +y for *down* and +x for *right*, hence the
//! sign flips in [`Drivetrain::field_centric_from`].

use serde::Serialize;

use crate::app::ports::SwervePort;
use crate::config::SwerveConfig;
use crate::error::Result;
use crate::input::{Axis, ControllerState, apply_deadband};

/// One request to the module stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum SwerveRequest {
    /// Velocities relative to the field (m/s, m/s, rad/s).
    FieldCentric { vx: f32, vy: f32, omega: f32 },
    /// Velocities relative to the robot frame.
    RobotCentric { vx: f32, vy: f32, omega: f32 },
    /// Wheels in an X pattern, holding position.
    Brake,
    /// Steer every module to `angle_rad`, no drive output.
    PointWheelsAt { angle_rad: f32 },
    /// Neutral output; modules coast or brake per their configuration.
    Idle,
}

pub struct Drivetrain<S> {
    port: S,
    config: SwerveConfig,
    last: SwerveRequest,
}

impl<S: SwervePort> Drivetrain<S> {
    pub fn new(port: S, config: SwerveConfig) -> Self {
        Self {
            port,
            config,
            last: SwerveRequest::Idle,
        }
    }

    pub fn apply(&mut self, request: SwerveRequest) -> Result<()> {
        self.port.apply(&request)?;
        self.last = request;
        Ok(())
    }

    pub fn seed_field_centric(&mut self) {
        self.port.seed_field_centric();
    }

    /// Field-centric request from the left stick (translation) and the
    /// right stick X axis (rotation), with the configured deadband.
    pub fn field_centric_from(&self, controller: &ControllerState) -> SwerveRequest {
        let c = &self.config;
        let shape = |axis| apply_deadband(controller.axis(axis), c.deadband);
        SwerveRequest::FieldCentric {
            vx: -shape(Axis::LeftY) * c.max_speed_mps,
            vy: -shape(Axis::LeftX) * c.max_speed_mps,
            omega: -shape(Axis::RightX) * c.max_angular_rate(),
        }
    }

    /// Robot-centric nudge toward a POV angle at the configured POV speed.
    /// `None` for angles other than the four cardinal ones.
    pub fn pov_nudge(&self, angle: u16) -> Option<SwerveRequest> {
        let speed = self.config.max_pov_speed * self.config.max_speed_mps;
        let (vx, vy) = match angle {
            0 => (speed, 0.0),
            180 => (-speed, 0.0),
            90 => (0.0, speed),
            270 => (0.0, -speed),
            _ => return None,
        };
        Some(SwerveRequest::RobotCentric { vx, vy, omega: 0.0 })
    }

    /// Point the wheels along the left stick.
    pub fn point_along_stick(&self, controller: &ControllerState) -> SwerveRequest {
        let x = -controller.axis(Axis::LeftY);
        let y = -controller.axis(Axis::LeftX);
        SwerveRequest::PointWheelsAt {
            angle_rad: y.atan2(x),
        }
    }

    pub fn last_request(&self) -> SwerveRequest {
        self.last
    }

    pub fn config(&self) -> &SwerveConfig {
        &self.config
    }

    pub fn port(&self) -> &S {
        &self.port
    }
}
