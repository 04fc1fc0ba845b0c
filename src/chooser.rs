//! Autonomous routine selection.
//!
//! The mode controller consults an [`AutoChooser`] exactly once, on entry
//! to Autonomous.  [`NamedChooser`] is the stock implementation: a list of
//! named factories plus a default, selectable by name from a dashboard or
//! the config file.

use log::{info, warn};

use crate::command::{BoxedCommand, CommandFactory};

/// Source of the autonomous command.
pub trait AutoChooser<C> {
    /// Build the currently selected routine, or `None` if nothing is
    /// selected.
    fn selected(&mut self) -> Option<BoxedCommand<C>>;
}

struct AutoOption<C> {
    name: &'static str,
    factory: CommandFactory<C>,
}

/// Named autonomous routines with an optional default.
pub struct NamedChooser<C> {
    options: Vec<AutoOption<C>>,
    default: Option<&'static str>,
    selection: Option<&'static str>,
}

impl<C> NamedChooser<C> {
    pub fn new() -> Self {
        Self {
            options: Vec::new(),
            default: None,
            selection: None,
        }
    }

    /// Register a routine.  Re-registering a name replaces its factory.
    pub fn add_option(
        &mut self,
        name: &'static str,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) {
        match self.options.iter_mut().find(|o| o.name == name) {
            Some(option) => option.factory = Box::new(factory),
            None => self.options.push(AutoOption {
                name,
                factory: Box::new(factory),
            }),
        }
    }

    /// Register a routine and make it the fallback when nothing is selected.
    pub fn set_default_option(
        &mut self,
        name: &'static str,
        factory: impl FnMut() -> BoxedCommand<C> + 'static,
    ) {
        self.add_option(name, factory);
        self.default = Some(name);
    }

    /// Select a routine by name.  Unknown names leave the selection alone.
    pub fn select(&mut self, name: &str) -> bool {
        match self.options.iter().find(|o| o.name == name) {
            Some(option) => {
                info!("Auto chooser: selected '{}'", option.name);
                self.selection = Some(option.name);
                true
            }
            None => {
                warn!("Auto chooser: no routine named '{}'", name);
                false
            }
        }
    }

    /// Name of the routine [`selected`](AutoChooser::selected) would build.
    pub fn selected_name(&self) -> Option<&'static str> {
        self.selection.or(self.default)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.options.iter().map(|o| o.name)
    }
}

impl<C> Default for NamedChooser<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> AutoChooser<C> for NamedChooser<C> {
    fn selected(&mut self) -> Option<BoxedCommand<C>> {
        let name = self.selected_name()?;
        self.options
            .iter_mut()
            .find(|o| o.name == name)
            .map(|o| (o.factory)())
    }
}
