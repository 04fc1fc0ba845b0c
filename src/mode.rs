//! Robot operating modes and the mode controller.
//!
//! ```text
//!              ┌──────────── platform-reported mode ────────────┐
//!              ▼                                                 │
//!   ┌──────────┐   ┌────────────┐   ┌────────┐   ┌──────┐
//!   │ Disabled │◀─▶│ Autonomous │◀─▶│ Teleop │◀─▶│ Test │   (any ↔ any)
//!   └──────────┘   └────────────┘   └────────┘   └──────┘
//! ```
//!
//! The controller diffs the reported mode against the last known one once
//! per tick.  A transition runs the exit action of the old mode, then the
//! entry action of the new one:
//!
//! | Transition       | Action                                            | When        |
//! |------------------|---------------------------------------------------|-------------|
//! | Autonomous → any | cancel the autonomous command if still running    | before tick |
//! | any → Autonomous | schedule the chooser's selection                  | before tick |
//! | any → Test       | cancel every running command                      | before tick |
//! | any → Disabled   | cancel everything not marked runs-while-disabled  | after tick  |
//!
//! The Disabled sweep runs after the scheduler tick so it overrides
//! anything the tick did.  The controller never terminates.

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::chooser::AutoChooser;
use crate::command::CommandId;
use crate::scheduler::{CommandScheduler, ScheduleOutcome};

/// Operating mode reported by the platform each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RobotMode {
    #[default]
    Disabled,
    Autonomous,
    Teleop,
    Test,
}

impl RobotMode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Autonomous => "autonomous",
            Self::Teleop => "teleop",
            Self::Test => "test",
        }
    }

    pub const fn is_enabled(self) -> bool {
        !matches!(self, Self::Disabled)
    }
}

impl core::fmt::Display for RobotMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// A mode change detected at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: RobotMode,
    pub to: RobotMode,
}

/// Reacts to mode changes with bulk schedule/cancel requests.
#[derive(Debug, Default)]
pub struct ModeController {
    current: RobotMode,
    /// Id of the command scheduled on the last Autonomous entry.
    autonomous: Option<CommandId>,
}

impl ModeController {
    /// Starts in `Disabled`, like the platform.
    pub const fn new() -> Self {
        Self {
            current: RobotMode::Disabled,
            autonomous: None,
        }
    }

    pub fn current(&self) -> RobotMode {
        self.current
    }

    pub fn autonomous_command(&self) -> Option<CommandId> {
        self.autonomous
    }

    /// Diff `reported` against the last known mode and run every
    /// transition action that must precede trigger evaluation.
    pub fn begin_tick<C>(
        &mut self,
        reported: RobotMode,
        scheduler: &mut CommandScheduler<C>,
        ctx: &mut C,
        chooser: &mut dyn AutoChooser<C>,
    ) -> Option<Transition> {
        if reported == self.current {
            return None;
        }
        let transition = Transition {
            from: self.current,
            to: reported,
        };
        info!("Mode transition: {} -> {}", transition.from, transition.to);
        scheduler.set_enabled(reported.is_enabled());

        // Exit
        if transition.from == RobotMode::Autonomous {
            if let Some(id) = self.autonomous.take() {
                if scheduler.cancel(id, ctx) {
                    info!("Mode: cancelled autonomous command {}", id);
                }
            }
        }

        self.current = reported;

        // Enter
        match reported {
            RobotMode::Autonomous => self.enter_autonomous(scheduler, ctx, chooser),
            RobotMode::Test => {
                let n = scheduler.cancel_all(ctx);
                info!("Mode: test entry cancelled {} command(s)", n);
            }
            RobotMode::Teleop | RobotMode::Disabled => {}
        }

        Some(transition)
    }

    /// Run the transition actions that must follow the scheduler tick.
    pub fn end_tick<C>(
        &mut self,
        transition: Option<Transition>,
        scheduler: &mut CommandScheduler<C>,
        ctx: &mut C,
    ) {
        if let Some(Transition {
            to: RobotMode::Disabled,
            ..
        }) = transition
        {
            let n = scheduler.cancel_where(ctx, |_, runs_when_disabled| !runs_when_disabled);
            info!("Mode: disabled entry cancelled {} command(s)", n);
        }
    }

    fn enter_autonomous<C>(
        &mut self,
        scheduler: &mut CommandScheduler<C>,
        ctx: &mut C,
        chooser: &mut dyn AutoChooser<C>,
    ) {
        let Some(command) = chooser.selected() else {
            warn!("Mode: no autonomous routine selected");
            return;
        };
        let name = command.name();
        match scheduler.schedule(ctx, command) {
            Ok((id, ScheduleOutcome::Started)) => {
                info!("Mode: autonomous '{}' scheduled as {}", name, id);
                self.autonomous = Some(id);
            }
            Ok((id, outcome)) => {
                warn!("Mode: autonomous '{}' ({}) not started: {:?}", name, id, outcome);
            }
            Err(e) => error!("Mode: autonomous '{}' rejected: {}", name, e),
        }
    }
}
