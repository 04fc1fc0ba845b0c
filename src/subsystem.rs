//! Subsystem registry and ownership map.
//!
//! The [`SubsystemTable`] is the single source of truth for "who drives
//! what": each registered subsystem has at most one owning command, and
//! optionally a default command that is re-armed whenever the subsystem
//! falls idle.  Commands refer to subsystems only by [`SubsystemId`]; the
//! physical actuators themselves live in the caller's context type.

use core::fmt;

use log::info;
use serde::Serialize;

use crate::command::{BoxedCommand, CommandFactory, CommandId};
use crate::error::{BindingError, Result};

/// Maximum number of subsystems one scheduler can arbitrate.
pub const MAX_SUBSYSTEMS: usize = 16;

/// Maximum number of subsystems a single command may require.
pub const MAX_REQUIREMENTS: usize = 4;

/// Handle to a registered subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SubsystemId(u8);

impl SubsystemId {
    pub const fn new(raw: u8) -> Self {
        Self(raw)
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SubsystemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ordered, duplicate-free set of subsystems a command needs exclusively.
pub type Requirements = heapless::Vec<SubsystemId, MAX_REQUIREMENTS>;

/// Build a [`Requirements`] set, rejecting duplicates and overflow.
pub fn requirements(ids: &[SubsystemId]) -> Result<Requirements> {
    let mut set = Requirements::new();
    for &id in ids {
        if set.contains(&id) {
            return Err(BindingError::DuplicateRequirement(id).into());
        }
        set.push(id).map_err(|_| BindingError::TooManyRequirements)?;
    }
    Ok(set)
}

// ---------------------------------------------------------------------------
// Subsystem table
// ---------------------------------------------------------------------------

struct SubsystemSlot<C> {
    name: &'static str,
    owner: Option<CommandId>,
    default: Option<CommandFactory<C>>,
    default_runs_when_disabled: bool,
}

/// Registry of every subsystem plus the live ownership map.
pub struct SubsystemTable<C> {
    slots: Vec<SubsystemSlot<C>>,
}

impl<C> SubsystemTable<C> {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Register a subsystem.  Call once per physical resource at startup.
    pub fn register(&mut self, name: &'static str) -> Result<SubsystemId> {
        if self.slots.len() >= MAX_SUBSYSTEMS {
            return Err(BindingError::TooManySubsystems.into());
        }
        let id = SubsystemId::new(self.slots.len() as u8);
        info!("Subsystem {} registered as {}", name, id);
        self.slots.push(SubsystemSlot {
            name,
            owner: None,
            default: None,
            default_runs_when_disabled: false,
        });
        Ok(id)
    }

    /// Attach a default command to `id`.
    ///
    /// The factory is invoked once here to check that the command it builds
    /// actually requires `id` and only registered subsystems.
    pub fn set_default(
        &mut self,
        id: SubsystemId,
        mut factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) -> Result<()> {
        let instance = factory();
        self.validate(instance.requirements())?;
        if !instance.requirements().contains(&id) {
            return Err(BindingError::DefaultMissingRequirement(id).into());
        }
        let slot = &mut self.slots[id.index()];
        info!("Subsystem {}: default command '{}'", slot.name, instance.name());
        slot.default_runs_when_disabled = instance.runs_when_disabled();
        slot.default = Some(Box::new(factory));
        Ok(())
    }

    /// Check that `reqs` is a well-formed set of registered subsystems.
    pub fn validate(&self, reqs: &[SubsystemId]) -> Result<()> {
        if reqs.len() > MAX_REQUIREMENTS {
            return Err(BindingError::TooManyRequirements.into());
        }
        for (i, id) in reqs.iter().enumerate() {
            if id.index() >= self.slots.len() {
                return Err(BindingError::UnknownSubsystem(*id).into());
            }
            if reqs[..i].contains(id) {
                return Err(BindingError::DuplicateRequirement(*id).into());
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// All registered subsystem ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = SubsystemId> + '_ {
        (0..self.slots.len()).map(|i| SubsystemId::new(i as u8))
    }

    pub fn name(&self, id: SubsystemId) -> &'static str {
        self.slots.get(id.index()).map_or("?", |s| s.name)
    }

    /// The command currently owning `id`, if any.
    pub fn owner(&self, id: SubsystemId) -> Option<CommandId> {
        self.slots.get(id.index()).and_then(|s| s.owner)
    }

    pub fn has_default(&self, id: SubsystemId) -> bool {
        self.slots.get(id.index()).is_some_and(|s| s.default.is_some())
    }

    /// Whether the default of `id` may start while the robot is disabled.
    pub fn default_runs_when_disabled(&self, id: SubsystemId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|s| s.default_runs_when_disabled)
    }

    /// Build a fresh instance of the default command of `id`.
    pub(crate) fn build_default(&mut self, id: SubsystemId) -> Option<BoxedCommand<C>> {
        self.slots
            .get_mut(id.index())
            .and_then(|s| s.default.as_mut())
            .map(|factory| factory())
    }

    /// Assign every subsystem in `reqs` to `owner`.
    pub(crate) fn claim(&mut self, reqs: &[SubsystemId], owner: CommandId) {
        for id in reqs {
            if let Some(slot) = self.slots.get_mut(id.index()) {
                debug_assert!(slot.owner.is_none(), "{} claimed while owned", slot.name);
                slot.owner = Some(owner);
            }
        }
    }

    /// Release every subsystem in `reqs` that is still owned by `owner`.
    pub(crate) fn release(&mut self, reqs: &[SubsystemId], owner: CommandId) {
        for id in reqs {
            if let Some(slot) = self.slots.get_mut(id.index()) {
                if slot.owner == Some(owner) {
                    slot.owner = None;
                }
            }
        }
    }
}

impl<C> Default for SubsystemTable<C> {
    fn default() -> Self {
        Self::new()
    }
}
