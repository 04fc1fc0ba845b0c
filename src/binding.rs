//! Binding table: trigger → activation policy → command factory.
//!
//! The table is assembled at startup and handed to the scheduler by value;
//! after that nothing can add or remove bindings.  Each tick the scheduler
//! asks the table to sample its triggers and turn the resulting edges into
//! an ordered list of [`Request`]s (declaration order, stable).

use log::debug;

use crate::command::{BoxedCommand, CommandFactory, CommandId};
use crate::error::Result;
use crate::input::Snapshot;
use crate::subsystem::SubsystemTable;
use crate::trigger::{Edge, Trigger};

/// How a binding reacts to its trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationPolicy {
    /// Schedule on the rising edge.
    OnTrue,
    /// Schedule on the falling edge.
    OnFalse,
    /// Schedule on the rising edge, cancel on the falling edge.
    WhileTrue,
    /// On the rising edge, cancel if running, otherwise schedule.
    ToggleOnTrue,
}

/// A scheduling decision produced by trigger evaluation.
pub enum Request<C> {
    Schedule { id: CommandId, command: BoxedCommand<C> },
    Cancel(CommandId),
}

impl<C> core::fmt::Debug for Request<C> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Schedule { id, command } => write!(f, "Schedule({id}, {})", command.name()),
            Self::Cancel(id) => write!(f, "Cancel({id})"),
        }
    }
}

struct Binding<C> {
    id: CommandId,
    trigger: Trigger,
    policy: ActivationPolicy,
    factory: CommandFactory<C>,
}

/// Ordered set of bindings.
pub struct BindingTable<C> {
    bindings: Vec<Binding<C>>,
}

impl<C> BindingTable<C> {
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a binding.  Returns the id every command it creates will carry.
    pub fn bind(
        &mut self,
        trigger: Trigger,
        policy: ActivationPolicy,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) -> CommandId {
        let id = CommandId::Binding(self.bindings.len() as u16);
        self.bindings.push(Binding {
            id,
            trigger,
            policy,
            factory: Box::new(factory),
        });
        id
    }

    pub fn on_true(
        &mut self,
        trigger: Trigger,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) -> CommandId {
        self.bind(trigger, ActivationPolicy::OnTrue, factory)
    }

    pub fn on_false(
        &mut self,
        trigger: Trigger,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) -> CommandId {
        self.bind(trigger, ActivationPolicy::OnFalse, factory)
    }

    pub fn while_true(
        &mut self,
        trigger: Trigger,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) -> CommandId {
        self.bind(trigger, ActivationPolicy::WhileTrue, factory)
    }

    pub fn toggle_on_true(
        &mut self,
        trigger: Trigger,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) -> CommandId {
        self.bind(trigger, ActivationPolicy::ToggleOnTrue, factory)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Bind-time contract check: every factory must build commands that
    /// require only registered subsystems, each at most once.
    pub(crate) fn validate(&mut self, subsystems: &SubsystemTable<C>) -> Result<()> {
        for binding in &mut self.bindings {
            let instance = (binding.factory)();
            subsystems.validate(instance.requirements()).inspect_err(|e| {
                log::error!(
                    "Binding {} ({:?} {:?} -> '{}') rejected: {}",
                    binding.id,
                    binding.policy,
                    binding.trigger,
                    instance.name(),
                    e
                );
            })?;
        }
        Ok(())
    }

    /// Sample every trigger once and translate edges into requests.
    ///
    /// `is_running` reports whether a command id is currently running; it
    /// is consulted by `ToggleOnTrue` only.
    pub(crate) fn evaluate(
        &mut self,
        snapshot: &Snapshot,
        is_running: impl Fn(CommandId) -> bool,
    ) -> Vec<Request<C>> {
        for binding in &mut self.bindings {
            binding.trigger.sample(snapshot);
        }

        let mut requests = Vec::new();
        for binding in &mut self.bindings {
            let edge = binding.trigger.edge();
            let request = match (binding.policy, edge) {
                (ActivationPolicy::OnTrue | ActivationPolicy::WhileTrue, Edge::Rising)
                | (ActivationPolicy::OnFalse, Edge::Falling) => Some(Request::Schedule {
                    id: binding.id,
                    command: (binding.factory)(),
                }),
                (ActivationPolicy::WhileTrue, Edge::Falling) => Some(Request::Cancel(binding.id)),
                (ActivationPolicy::ToggleOnTrue, Edge::Rising) => {
                    if is_running(binding.id) {
                        Some(Request::Cancel(binding.id))
                    } else {
                        Some(Request::Schedule {
                            id: binding.id,
                            command: (binding.factory)(),
                        })
                    }
                }
                _ => None,
            };
            if let Some(request) = request {
                debug!("Binding {:?} {:?}: {:?}", binding.trigger, edge, request);
                requests.push(request);
            }
        }
        requests
    }
}

impl<C> Default for BindingTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
