//! Control service: the per-tick orchestration around the scheduler.
//!
//! [`ControlService`] owns the scheduler, the mode controller and the
//! autonomous chooser.  It exposes a hardware-agnostic tick API; all output
//! flows through port traits injected at call sites, so the whole service
//! is testable with in-memory sinks.
//!
//! ```text
//!  Snapshot ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!               │        ControlService        │
//!  ctx (C) ◀──▶ │ Modes · Scheduler · Chooser  │ ──▶ TelemetrySink
//!               └──────────────────────────────┘
//! ```

use log::info;

use crate::chooser::AutoChooser;
use crate::input::Snapshot;
use crate::mode::{ModeController, RobotMode};
use crate::scheduler::CommandScheduler;

use super::events::{AppEvent, TelemetryFrame};
use super::ports::{EventSink, TelemetrySink, TelemetrySource};

// ───────────────────────────────────────────────────────────────
// ControlService
// ───────────────────────────────────────────────────────────────

/// Drives one scheduler through mode changes, one tick at a time.
pub struct ControlService<C, A> {
    scheduler: CommandScheduler<C>,
    modes: ModeController,
    chooser: A,
    /// Publish telemetry every this many ticks (0 disables it).
    telemetry_interval: u32,
    tick_count: u64,
}

impl<C, A> ControlService<C, A>
where
    C: TelemetrySource,
    A: AutoChooser<C>,
{
    pub fn new(scheduler: CommandScheduler<C>, chooser: A, telemetry_interval: u32) -> Self {
        Self {
            scheduler,
            modes: ModeController::new(),
            chooser,
            telemetry_interval,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started(self.modes.current()));
        info!("ControlService started in {}", self.modes.current());
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one full tick: mode entry → scheduler → Disabled sweep → events.
    ///
    /// `snapshot` must be the single tick-start sample; `ctx` is handed to
    /// every command hook.
    pub fn tick(
        &mut self,
        ctx: &mut C,
        snapshot: &Snapshot,
        sink: &mut (impl EventSink + TelemetrySink),
    ) {
        self.tick_count += 1;

        // 1. Mode transitions that precede trigger evaluation
        let transition = self
            .modes
            .begin_tick(snapshot.mode, &mut self.scheduler, ctx, &mut self.chooser);
        if let Some(t) = transition {
            sink.emit(&AppEvent::ModeChanged { from: t.from, to: t.to });
        }

        // 2. Triggers, arbitration, execution
        self.scheduler.run(ctx, snapshot);

        // 3. The Disabled sweep overrides whatever the tick did
        self.modes.end_tick(transition, &mut self.scheduler, ctx);

        // 4. Lifecycle events, FIFO
        self.scheduler
            .drain_events(|event| sink.emit(&AppEvent::Command(event)));

        // 5. Periodic telemetry
        if self.telemetry_interval > 0 && self.tick_count % u64::from(self.telemetry_interval) == 0 {
            sink.publish(&self.build_telemetry(ctx));
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn build_telemetry(&self, ctx: &C) -> TelemetryFrame {
        TelemetryFrame {
            mode: self.modes.current(),
            scheduler: self.scheduler.telemetry(),
            values: ctx.telemetry_values(),
        }
    }

    pub fn mode(&self) -> RobotMode {
        self.modes.current()
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn scheduler(&self) -> &CommandScheduler<C> {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut CommandScheduler<C> {
        &mut self.scheduler
    }

    pub fn chooser_mut(&mut self) -> &mut A {
        &mut self.chooser
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }
}
