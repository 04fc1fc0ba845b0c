//! Unified error types for the command core.
//!
//! A single `Error` enum that every subsystem and command hook can convert
//! into, so the scheduler's fault handling stays uniform.  All variants are
//! `Copy` so they can be carried inside scheduler events without allocation.

use core::fmt;

use crate::subsystem::SubsystemId;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible operation in the crate funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An actuator write failed inside a command hook.
    Actuator(ActuatorError),
    /// A binding or default command was rejected at setup time.
    Binding(BindingError),
    /// A command reported a failure of its own.
    Command(&'static str),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Actuator(e) => write!(f, "actuator: {e}"),
            Self::Binding(e) => write!(f, "binding: {e}"),
            Self::Command(msg) => write!(f, "command: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Actuator errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorError {
    /// PWM duty-cycle write failed.
    PwmWriteFailed,
    /// CAN frame could not be sent to the motor controller.
    CanWriteFailed,
    /// Requested set-point is outside the actuator's range.
    OutOfRange,
}

impl fmt::Display for ActuatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PwmWriteFailed => write!(f, "PWM write failed"),
            Self::CanWriteFailed => write!(f, "CAN write failed"),
            Self::OutOfRange => write!(f, "set-point out of range"),
        }
    }
}

impl From<ActuatorError> for Error {
    fn from(e: ActuatorError) -> Self {
        Self::Actuator(e)
    }
}

// ---------------------------------------------------------------------------
// Binding errors
// ---------------------------------------------------------------------------

/// Contract violations caught while the binding table is being built.
/// Once setup succeeds none of these can occur at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingError {
    /// A command requires a subsystem that was never registered.
    UnknownSubsystem(SubsystemId),
    /// The same subsystem appears twice in one requirement set.
    DuplicateRequirement(SubsystemId),
    /// The requirement set exceeds the fixed capacity.
    TooManyRequirements,
    /// A default command does not require the subsystem it is attached to.
    DefaultMissingRequirement(SubsystemId),
    /// The subsystem table is full.
    TooManySubsystems,
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSubsystem(id) => write!(f, "unknown subsystem {id}"),
            Self::DuplicateRequirement(id) => write!(f, "subsystem {id} required twice"),
            Self::TooManyRequirements => write!(f, "too many requirements"),
            Self::DefaultMissingRequirement(id) => {
                write!(f, "default command does not require subsystem {id}")
            }
            Self::TooManySubsystems => write!(f, "too many subsystems"),
        }
    }
}

impl From<BindingError> for Error {
    fn from(e: BindingError) -> Self {
        Self::Binding(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
