//! Command scheduler: arbitration and execution engine.
//!
//! One call to [`CommandScheduler::run`] is one tick:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ 1. sample triggers ──▶ ordered Schedule / Cancel requests    │
//! │ 2. apply Cancel requests (end hook, release, queue defaults) │
//! │ 3. drain schedule queue in order:                            │
//! │      conflict with CancelIncoming holder ──▶ reject          │
//! │      otherwise cancel holders ──▶ claim ──▶ initialize       │
//! │    then idle defaults                                        │
//! │ 4. execute + is_finished for every running command           │
//! │      finished ──▶ end(false), release (defaults next tick)   │
//! │      Err / panic ──▶ end(true), release, report fault        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`SubsystemTable`] ownership map is the only record of who drives
//! what.  Nothing here blocks; a faulty command is cancelled and the tick
//! carries on.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};

use heapless::Deque;
use log::{error, info, warn};
use serde::Serialize;

use crate::binding::{BindingTable, Request};
use crate::command::{BoxedCommand, CommandId, CommandState, Interruption};
use crate::error::{BindingError, Error, Result};
use crate::input::Snapshot;
use crate::subsystem::{self, Requirements, SubsystemId, SubsystemTable};

// ═══════════════════════════════════════════════════════════════
//  Outcomes and events
// ═══════════════════════════════════════════════════════════════

/// Why a schedule request did not start its command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// `subsystem` is held by `holder`, which refuses interruption.
    Conflict { subsystem: SubsystemId, holder: CommandId },
    /// The robot is disabled and the command does not run while disabled.
    Disabled,
    /// The command's requirement set is malformed.
    Invalid(BindingError),
}

/// Why a command was force-cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultReason {
    /// A hook returned `Err`.
    Error(Error),
    /// A hook panicked.
    Panic,
}

impl core::fmt::Display for FaultReason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Error(e) => write!(f, "{e}"),
            Self::Panic => write!(f, "panic"),
        }
    }
}

/// Result of a single schedule request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    Started,
    /// The same command id is already running; nothing changed.
    AlreadyRunning,
    Rejected(Rejection),
    /// `initialize` failed; the command was cancelled straight away.
    Faulted(FaultReason),
}

/// Lifecycle notifications, drained by the caller after each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedulerEvent {
    Started { id: CommandId, name: &'static str },
    Rejected { id: CommandId, name: &'static str, reason: Rejection },
    /// Cancelled explicitly (`by == None`) or by an incoming command.
    Interrupted { id: CommandId, name: &'static str, by: Option<CommandId> },
    Finished { id: CommandId, name: &'static str },
    Faulted { id: CommandId, name: &'static str, reason: FaultReason },
}

/// Observability view of the scheduler, for the telemetry sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchedulerTelemetry {
    pub tick: u64,
    pub running: Vec<RunningInfo>,
    pub owners: Vec<OwnerInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunningInfo {
    pub id: CommandId,
    pub name: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerInfo {
    pub subsystem: &'static str,
    pub owner: Option<CommandId>,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Ended ad-hoc ids whose final state is still reported; the oldest is
/// forgotten first.
const RETIRED_ADHOC: usize = 16;

struct RunningCommand<C> {
    id: CommandId,
    requirements: Requirements,
    command: BoxedCommand<C>,
}

/// Work item for the schedule phase.
enum Pending<C> {
    Command { id: CommandId, command: BoxedCommand<C> },
    /// Re-arm the default of this subsystem if it is still idle.
    Default(SubsystemId),
}

/// The command scheduler.
///
/// Constructed once at startup from a subsystem table and a binding table;
/// both are frozen from then on.  `C` is the context handed to every
/// command hook.
pub struct CommandScheduler<C> {
    subsystems: SubsystemTable<C>,
    bindings: BindingTable<C>,
    /// Running commands in the order they started.
    running: Vec<RunningCommand<C>>,
    /// Last lifecycle state seen for every id.  Binding and default ids
    /// are bounded by the tables; ad-hoc ids are evicted via `retired`.
    states: HashMap<CommandId, CommandState>,
    retired: Deque<CommandId, RETIRED_ADHOC>,
    events: Vec<SchedulerEvent>,
    next_adhoc: u32,
    enabled: bool,
    tick_count: u64,
}

impl<C> CommandScheduler<C> {
    /// Build the scheduler, validating every binding against the
    /// registered subsystems.
    pub fn new(subsystems: SubsystemTable<C>, mut bindings: BindingTable<C>) -> Result<Self> {
        bindings.validate(&subsystems)?;
        info!(
            "Scheduler: {} subsystems, {} bindings",
            subsystems.len(),
            bindings.len()
        );
        Ok(Self {
            subsystems,
            bindings,
            running: Vec::new(),
            states: HashMap::new(),
            retired: Deque::new(),
            events: Vec::new(),
            next_adhoc: 0,
            enabled: true,
            tick_count: 0,
        })
    }

    /// Run one tick.  See the module docs for the phase order.
    pub fn run(&mut self, ctx: &mut C, snapshot: &Snapshot) {
        self.tick_count += 1;
        self.enabled = snapshot.mode.is_enabled();

        // 1. Triggers.
        let running = &self.running;
        let requests = self
            .bindings
            .evaluate(snapshot, |id| running.iter().any(|r| r.id == id));

        let mut queue = VecDeque::new();
        let mut cancels = Vec::new();
        for request in requests {
            match request {
                Request::Schedule { id, command } => queue.push_back(Pending::Command { id, command }),
                Request::Cancel(id) => cancels.push(id),
            }
        }

        // 2. Cancels first.
        for id in cancels {
            self.cancel_inner(id, None, ctx, Some(&mut queue));
        }

        // 3. Schedules in order, then anything left idle gets its default.
        self.queue_idle_defaults(&mut queue);
        self.drain(ctx, &mut queue);

        // 4. Advance.
        self.advance(ctx);
    }

    /// Schedule a command outside the binding table (e.g. autonomous).
    ///
    /// Runs arbitration immediately.  Intended to be called by the tick
    /// driver inside its tick, never from another thread.
    pub fn schedule(
        &mut self,
        ctx: &mut C,
        command: BoxedCommand<C>,
    ) -> Result<(CommandId, ScheduleOutcome)> {
        self.subsystems.validate(command.requirements())?;
        let id = CommandId::Adhoc(self.next_adhoc);
        self.next_adhoc = self.next_adhoc.wrapping_add(1);

        let mut queue = VecDeque::new();
        let outcome = self.try_start(id, command, ctx, &mut queue);
        self.drain(ctx, &mut queue);
        Ok((id, outcome))
    }

    /// Cancel one running command.  Returns `false` if it was not running.
    /// Defaults of released subsystems are re-armed on the next tick.
    pub fn cancel(&mut self, id: CommandId, ctx: &mut C) -> bool {
        self.cancel_inner(id, None, ctx, None)
    }

    /// Cancel every running command.
    pub fn cancel_all(&mut self, ctx: &mut C) -> usize {
        self.cancel_where(ctx, |_, _| true)
    }

    /// Cancel every running command for which `predicate(id, runs_when_disabled)`
    /// holds.  Returns how many were cancelled.
    pub fn cancel_where(&mut self, ctx: &mut C, predicate: impl Fn(CommandId, bool) -> bool) -> usize {
        let doomed: Vec<CommandId> = self
            .running
            .iter()
            .filter(|r| predicate(r.id, r.command.runs_when_disabled()))
            .map(|r| r.id)
            .collect();
        for id in &doomed {
            self.cancel_inner(*id, None, ctx, None);
        }
        doomed.len()
    }

    /// Update the enable flag ahead of [`run`](Self::run), so that
    /// commands scheduled before the tick's trigger phase see it.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn is_running(&self, id: CommandId) -> bool {
        self.running.iter().any(|r| r.id == id)
    }

    /// Last known lifecycle state of `id`.  `Idle` if never seen, or for an
    /// ad-hoc id that ended more than 16 ad-hoc commands ago.
    pub fn state_of(&self, id: CommandId) -> CommandState {
        self.states.get(&id).copied().unwrap_or(CommandState::Idle)
    }

    pub fn owner_of(&self, subsystem: SubsystemId) -> Option<CommandId> {
        self.subsystems.owner(subsystem)
    }

    /// Running commands as `(id, name)` in start order.
    pub fn running(&self) -> impl Iterator<Item = (CommandId, &'static str)> + '_ {
        self.running.iter().map(|r| (r.id, r.command.name()))
    }

    pub fn running_count(&self) -> usize {
        self.running.len()
    }

    pub fn subsystems(&self) -> &SubsystemTable<C> {
        &self.subsystems
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Hand buffered lifecycle events to `handler` in FIFO order.
    pub fn drain_events(&mut self, mut handler: impl FnMut(SchedulerEvent)) {
        for event in self.events.drain(..) {
            handler(event);
        }
    }

    pub fn telemetry(&self) -> SchedulerTelemetry {
        SchedulerTelemetry {
            tick: self.tick_count,
            running: self
                .running
                .iter()
                .map(|r| RunningInfo {
                    id: r.id,
                    name: r.command.name(),
                })
                .collect(),
            owners: self
                .subsystems
                .ids()
                .map(|s| OwnerInfo {
                    subsystem: self.subsystems.name(s),
                    owner: self.subsystems.owner(s),
                })
                .collect(),
        }
    }

    // ───────────────────────────────────────────────────────────
    //  Internal
    // ───────────────────────────────────────────────────────────

    fn drain(&mut self, ctx: &mut C, queue: &mut VecDeque<Pending<C>>) {
        while let Some(pending) = queue.pop_front() {
            match pending {
                Pending::Command { id, command } => {
                    self.try_start(id, command, ctx, queue);
                }
                Pending::Default(subsystem) => self.start_default(subsystem, ctx, queue),
            }
        }
    }

    /// Arbitrate one candidate against the current owners and start it.
    fn try_start(
        &mut self,
        id: CommandId,
        command: BoxedCommand<C>,
        ctx: &mut C,
        queue: &mut VecDeque<Pending<C>>,
    ) -> ScheduleOutcome {
        let name = command.name();

        if self.is_running(id) {
            return ScheduleOutcome::AlreadyRunning;
        }

        if !self.enabled && !command.runs_when_disabled() {
            return self.reject(id, name, Rejection::Disabled);
        }

        let requirements = match subsystem::requirements(command.requirements()) {
            Ok(reqs) => reqs,
            Err(Error::Binding(e)) => return self.reject(id, name, Rejection::Invalid(e)),
            Err(_) => return self.reject(id, name, Rejection::Invalid(BindingError::TooManyRequirements)),
        };
        if let Err(Error::Binding(e)) = self.subsystems.validate(&requirements) {
            return self.reject(id, name, Rejection::Invalid(e));
        }

        // Collect distinct holders; any CancelIncoming holder vetoes.
        let mut holders: heapless::Vec<CommandId, { subsystem::MAX_REQUIREMENTS }> = heapless::Vec::new();
        for &s in &requirements {
            let Some(holder) = self.subsystems.owner(s) else {
                continue;
            };
            if self.interruption_of(holder) == Interruption::CancelIncoming {
                return self.reject(id, name, Rejection::Conflict { subsystem: s, holder });
            }
            if !holders.contains(&holder) {
                // Capacity equals the requirement count, so this cannot overflow.
                let _ = holders.push(holder);
            }
        }
        for holder in holders {
            self.cancel_inner(holder, Some(id), ctx, Some(queue));
        }

        self.set_state(id, CommandState::Scheduled);
        self.subsystems.claim(&requirements, id);
        self.running.push(RunningCommand {
            id,
            requirements,
            command,
        });

        let entry = self.running.last_mut().map(|r| &mut r.command);
        let init = match entry {
            Some(command) => guarded(|| command.initialize(ctx)),
            None => Ok(()),
        };
        if let Err(reason) = init {
            let pos = self.running.len() - 1;
            self.fault(pos, reason, ctx);
            return ScheduleOutcome::Faulted(reason);
        }

        self.set_state(id, CommandState::Running);
        info!("Scheduler: started '{}' ({})", name, id);
        self.events.push(SchedulerEvent::Started { id, name });
        ScheduleOutcome::Started
    }

    fn start_default(&mut self, subsystem: SubsystemId, ctx: &mut C, queue: &mut VecDeque<Pending<C>>) {
        let id = CommandId::Default(subsystem);
        if self.subsystems.owner(subsystem).is_some() || self.is_running(id) {
            return;
        }
        if !self.enabled && !self.subsystems.default_runs_when_disabled(subsystem) {
            return;
        }
        let Some(command) = self.subsystems.build_default(subsystem) else {
            return;
        };
        // A default never interrupts anyone: every requirement must be free.
        if command
            .requirements()
            .iter()
            .any(|s| self.subsystems.owner(*s).is_some())
        {
            return;
        }
        self.try_start(id, command, ctx, queue);
    }

    /// Queue a default request for every idle subsystem that has one.
    fn queue_idle_defaults(&self, queue: &mut VecDeque<Pending<C>>) {
        for s in self.subsystems.ids() {
            if self.subsystems.owner(s).is_none() && self.subsystems.has_default(s) {
                push_default(queue, s);
            }
        }
    }

    fn advance(&mut self, ctx: &mut C) {
        let mut i = 0;
        while i < self.running.len() {
            let command = &mut self.running[i].command;
            let step = guarded(|| {
                command.execute(ctx)?;
                command.is_finished(ctx)
            });
            match step {
                Ok(false) => i += 1,
                Ok(true) => self.finish(i, ctx),
                Err(reason) => self.fault(i, reason, ctx),
            }
        }
    }

    /// Normal completion of the command at `pos`.
    fn finish(&mut self, pos: usize, ctx: &mut C) {
        let mut entry = self.running.remove(pos);
        let name = entry.command.name();
        let id = entry.id;
        if let Err(reason) = guarded(|| entry.command.end(ctx, false)) {
            warn!("Scheduler: '{}' ({}) end hook failed: {}", name, id, reason);
        }
        self.subsystems.release(&entry.requirements, id);
        self.set_state(id, CommandState::Finished);
        info!("Scheduler: finished '{}' ({})", name, id);
        self.events.push(SchedulerEvent::Finished { id, name });
    }

    /// Forced cancellation of the command at `pos` after a hook failure.
    fn fault(&mut self, pos: usize, reason: FaultReason, ctx: &mut C) {
        let mut entry = self.running.remove(pos);
        let name = entry.command.name();
        let id = entry.id;
        error!("Scheduler: '{}' ({}) faulted: {} - cancelling", name, id, reason);
        if let Err(e) = guarded(|| entry.command.end(ctx, true)) {
            warn!("Scheduler: '{}' ({}) end hook failed: {}", name, id, e);
        }
        self.subsystems.release(&entry.requirements, id);
        self.set_state(id, CommandState::Cancelled);
        self.events.push(SchedulerEvent::Faulted { id, name, reason });
    }

    /// Cancel `id` if running.  The end hook runs before ownership is
    /// released.  With a queue, released subsystems get their defaults
    /// queued for this tick.
    fn cancel_inner(
        &mut self,
        id: CommandId,
        by: Option<CommandId>,
        ctx: &mut C,
        queue: Option<&mut VecDeque<Pending<C>>>,
    ) -> bool {
        let Some(pos) = self.running.iter().position(|r| r.id == id) else {
            return false;
        };
        let mut entry = self.running.remove(pos);
        let name = entry.command.name();
        if let Err(reason) = guarded(|| entry.command.end(ctx, true)) {
            warn!("Scheduler: '{}' ({}) end hook failed: {}", name, id, reason);
        }
        self.subsystems.release(&entry.requirements, id);
        self.set_state(id, CommandState::Cancelled);
        match by {
            Some(by) => info!("Scheduler: '{}' ({}) interrupted by {}", name, id, by),
            None => info!("Scheduler: cancelled '{}' ({})", name, id),
        }
        self.events.push(SchedulerEvent::Interrupted { id, name, by });

        if let Some(queue) = queue {
            for &s in &entry.requirements {
                if self.subsystems.has_default(s) {
                    push_default(queue, s);
                }
            }
        }
        true
    }

    fn set_state(&mut self, id: CommandId, state: CommandState) {
        self.states.insert(id, state);
        let ended = matches!(state, CommandState::Finished | CommandState::Cancelled);
        if ended && matches!(id, CommandId::Adhoc(_)) {
            if self.retired.is_full() {
                if let Some(oldest) = self.retired.pop_front() {
                    self.states.remove(&oldest);
                }
            }
            let _ = self.retired.push_back(id);
        }
    }

    fn reject(&mut self, id: CommandId, name: &'static str, reason: Rejection) -> ScheduleOutcome {
        match reason {
            Rejection::Conflict { subsystem, holder } => info!(
                "Scheduler: rejected '{}' ({}): {} held by {}",
                name,
                id,
                self.subsystems.name(subsystem),
                holder
            ),
            Rejection::Disabled => info!("Scheduler: rejected '{}' ({}): disabled", name, id),
            Rejection::Invalid(e) => error!("Scheduler: rejected '{}' ({}): {}", name, id, e),
        }
        self.events.push(SchedulerEvent::Rejected { id, name, reason });
        ScheduleOutcome::Rejected(reason)
    }

    fn interruption_of(&self, id: CommandId) -> Interruption {
        self.running
            .iter()
            .find(|r| r.id == id)
            .map_or(Interruption::CancelSelf, |r| r.command.interruption())
    }
}

fn push_default<C>(queue: &mut VecDeque<Pending<C>>, subsystem: SubsystemId) {
    let queued = queue
        .iter()
        .any(|p| matches!(p, Pending::Default(s) if *s == subsystem));
    if !queued {
        queue.push_back(Pending::Default(subsystem));
    }
}

/// Run a command hook, turning both `Err` and panics into a [`FaultReason`].
fn guarded<T>(hook: impl FnOnce() -> Result<T>) -> core::result::Result<T, FaultReason> {
    match panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(FaultReason::Error(e)),
        Err(_) => Err(FaultReason::Panic),
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
