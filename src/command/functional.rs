//! Closure-backed command.
//!
//! Most robot actions are a couple of subsystem calls; writing a struct and
//! a trait impl for each is noise.  [`FunctionalCommand`] assembles a
//! command from optional closures plus a handful of builder flags.

use crate::command::{BoxedCommand, Command, Interruption};
use crate::error::Result;
use crate::subsystem::SubsystemId;

type Action<C> = Box<dyn FnMut(&mut C) -> Result<()>>;
type EndAction<C> = Box<dyn FnMut(&mut C, bool) -> Result<()>>;
type Predicate<C> = Box<dyn Fn(&C) -> bool>;

/// A command whose hooks are closures.
pub struct FunctionalCommand<C> {
    name: &'static str,
    requirements: Vec<SubsystemId>,
    init: Option<Action<C>>,
    execute: Option<Action<C>>,
    end: Option<EndAction<C>>,
    finished: Option<Predicate<C>>,
    interruption: Interruption,
    runs_when_disabled: bool,
    /// Finish after this many `execute` calls.
    timeout_ticks: Option<u32>,
    executed: u32,
}

impl<C> FunctionalCommand<C> {
    /// A command with no behaviour that never finishes on its own.
    pub fn new(name: &'static str, requirements: &[SubsystemId]) -> Self {
        Self {
            name,
            requirements: requirements.to_vec(),
            init: None,
            execute: None,
            end: None,
            finished: None,
            interruption: Interruption::CancelSelf,
            runs_when_disabled: false,
            timeout_ticks: None,
            executed: 0,
        }
    }

    /// Run `action` once on start and finish in the same tick.
    pub fn instant(
        name: &'static str,
        requirements: &[SubsystemId],
        action: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> Self {
        Self::new(name, requirements).on_init(action).until(|_| true)
    }

    /// Run `action` every tick until cancelled.
    pub fn run(
        name: &'static str,
        requirements: &[SubsystemId],
        action: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> Self {
        Self::new(name, requirements).on_execute(action)
    }

    /// Run `start` once on start and `stop` once when ended for any reason.
    pub fn start_end(
        name: &'static str,
        requirements: &[SubsystemId],
        start: impl FnMut(&mut C) -> Result<()> + 'static,
        mut stop: impl FnMut(&mut C) -> Result<()> + 'static,
    ) -> Self {
        Self::new(name, requirements)
            .on_init(start)
            .on_end(move |ctx, _| stop(ctx))
    }

    pub fn named(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn on_init(mut self, f: impl FnMut(&mut C) -> Result<()> + 'static) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    pub fn on_execute(mut self, f: impl FnMut(&mut C) -> Result<()> + 'static) -> Self {
        self.execute = Some(Box::new(f));
        self
    }

    pub fn on_end(mut self, f: impl FnMut(&mut C, bool) -> Result<()> + 'static) -> Self {
        self.end = Some(Box::new(f));
        self
    }

    /// Finish once `predicate` holds.
    pub fn until(mut self, predicate: impl Fn(&C) -> bool + 'static) -> Self {
        self.finished = Some(Box::new(predicate));
        self
    }

    /// Finish after `ticks` executions, whatever the predicate says.
    pub fn with_timeout(mut self, ticks: u32) -> Self {
        self.timeout_ticks = Some(ticks);
        self
    }

    pub fn with_interruption(mut self, interruption: Interruption) -> Self {
        self.interruption = interruption;
        self
    }

    pub fn ignoring_disable(mut self, runs_when_disabled: bool) -> Self {
        self.runs_when_disabled = runs_when_disabled;
        self
    }

    pub fn boxed(self) -> BoxedCommand<C>
    where
        C: 'static,
    {
        Box::new(self)
    }
}

impl<C> Command<C> for FunctionalCommand<C> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requirements(&self) -> &[SubsystemId] {
        &self.requirements
    }

    fn initialize(&mut self, ctx: &mut C) -> Result<()> {
        self.executed = 0;
        match self.init.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn execute(&mut self, ctx: &mut C) -> Result<()> {
        self.executed = self.executed.saturating_add(1);
        match self.execute.as_mut() {
            Some(f) => f(ctx),
            None => Ok(()),
        }
    }

    fn is_finished(&self, ctx: &C) -> Result<bool> {
        if self.timeout_ticks.is_some_and(|t| self.executed >= t) {
            return Ok(true);
        }
        Ok(self.finished.as_ref().is_some_and(|f| f(ctx)))
    }

    fn end(&mut self, ctx: &mut C, interrupted: bool) -> Result<()> {
        match self.end.as_mut() {
            Some(f) => f(ctx, interrupted),
            None => Ok(()),
        }
    }

    fn interruption(&self) -> Interruption {
        self.interruption
    }

    fn runs_when_disabled(&self) -> bool {
        self.runs_when_disabled
    }
}
