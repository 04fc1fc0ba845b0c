//! Command capability interface and lifecycle types.
//!
//! A command is a unit of behaviour that declares which subsystems it needs
//! and is driven by the scheduler through four hooks:
//!
//! ```text
//!   Idle ──schedule──▶ Scheduled ──initialize──▶ Running ──┬─ is_finished ─▶ Finished ─┐
//!                                                           └─ cancel/fault ─▶ Cancelled ┤
//!   Idle ◀──────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every hook receives the caller's context `C` explicitly (the bundle of
//! subsystems and the current controller sample).  Commands never hold a
//! reference back to the scheduler; they refer to subsystems by id only.

pub mod functional;

use core::fmt;

use serde::Serialize;

use crate::error::Result;
use crate::subsystem::SubsystemId;

pub use functional::FunctionalCommand;

/// Boxed command as stored by the scheduler.
pub type BoxedCommand<C> = Box<dyn Command<C>>;

/// Builds a fresh command instance every time it is called.
pub type CommandFactory<C> = Box<dyn FnMut() -> BoxedCommand<C>>;

/// The capability interface every command implements.
///
/// Only [`name`](Command::name) and [`requirements`](Command::requirements)
/// are mandatory; the lifecycle hooks default to no-ops and a command that
/// never finishes on its own.
pub trait Command<C> {
    /// Human-readable label used in logs and telemetry.
    fn name(&self) -> &'static str;

    /// Subsystems this command needs exclusively while running.
    fn requirements(&self) -> &[SubsystemId];

    /// Runs once when the command starts, after it owns its subsystems.
    fn initialize(&mut self, _ctx: &mut C) -> Result<()> {
        Ok(())
    }

    /// Runs once per tick while the command is running.
    fn execute(&mut self, _ctx: &mut C) -> Result<()> {
        Ok(())
    }

    /// Evaluated every tick directly after [`execute`](Command::execute).
    fn is_finished(&self, _ctx: &C) -> Result<bool> {
        Ok(false)
    }

    /// Runs once when the command leaves `Running`.  `interrupted` is true
    /// for cancellation and faults, false for normal completion.
    fn end(&mut self, _ctx: &mut C, _interrupted: bool) -> Result<()> {
        Ok(())
    }

    /// Which side yields when another command wants one of our subsystems.
    fn interruption(&self) -> Interruption {
        Interruption::CancelSelf
    }

    /// Whether the command may start and keep running while disabled.
    fn runs_when_disabled(&self) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Identity and lifecycle
// ---------------------------------------------------------------------------

/// Stable identity of a logical command.
///
/// Identity belongs to the *source* of the command, not to one instance:
/// every instance a binding creates shares that binding's id, so a second
/// schedule request from the same binding finds its predecessor still
/// running and becomes a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandId {
    /// Created by the binding at this declaration index.
    Binding(u16),
    /// Default command of this subsystem.
    Default(SubsystemId),
    /// Scheduled directly (e.g. the autonomous routine).
    Adhoc(u32),
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding(i) => write!(f, "binding{i}"),
            Self::Default(s) => write!(f, "default{s}"),
            Self::Adhoc(n) => write!(f, "adhoc{n}"),
        }
    }
}

/// Lifecycle state of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandState {
    Idle,
    Scheduled,
    Running,
    Finished,
    Cancelled,
}

/// Interruption policy of a running command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Interruption {
    /// Yield to any incoming command that needs one of our subsystems.
    #[default]
    CancelSelf,
    /// Keep running; incoming conflicting commands are rejected.
    CancelIncoming,
}
