//! Port traits: the boundary between the command core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlService / subsystems
//! ```
//!
//! Driven adapters (motor controllers, the swerve module stack, log and
//! telemetry sinks) implement these traits.  Subsystems and the
//! [`ControlService`](super::service::ControlService) consume them through
//! generics, so the core never touches a bus directly.  PWM outputs use
//! `embedded_hal::pwm::SetDutyCycle` and need no port of their own.

use crate::error::Result;
use crate::subsystems::drivetrain::SwerveRequest;

use super::events::{AppEvent, TelemetryFrame, TelemetryValue};

// ───────────────────────────────────────────────────────────────
// Actuator ports (domain → hardware)
// ───────────────────────────────────────────────────────────────

/// CAN motor controller with an integrated encoder.
pub trait EncodedMotorPort {
    /// Open-loop output in `-1.0..=1.0`.
    fn set_output(&mut self, percent: f32) -> Result<()>;

    /// Encoder position in rotations.
    fn position(&self) -> f32;
}

/// The swerve module stack.  Requests are applied as-is; kinematics and
/// module control live behind this port.
pub trait SwervePort {
    fn apply(&mut self, request: &SwerveRequest) -> Result<()>;

    /// Take the current heading as field-forward.
    fn seed_field_centric(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Output ports (domain → logging / dashboard)
// ───────────────────────────────────────────────────────────────

/// Structured [`AppEvent`]s leave the core through this port.  Adapters
/// decide where they go (console, file, network table, ...).
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

/// Write-only telemetry output, fed every N ticks.
pub trait TelemetrySink {
    fn publish(&mut self, frame: &TelemetryFrame);
}

/// Implemented by the command context to contribute dashboard values to
/// each [`TelemetryFrame`].
pub trait TelemetrySource {
    fn telemetry_values(&self) -> Vec<TelemetryValue> {
        Vec::new()
    }
}
