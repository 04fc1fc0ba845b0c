//! Reactive command-scheduling core for periodically ticked robot
//! controllers.
//!
//! Exposes the pure-logic modules (triggers, bindings, scheduler, modes)
//! plus the example robot wiring and its simulated platform, so the whole
//! stack can be exercised from integration tests on a host machine.

#![deny(unused_must_use)]

pub mod binding;
pub mod chooser;
pub mod command;
pub mod config;
pub mod error;
pub mod input;
pub mod mode;
pub mod scheduler;
pub mod subsystem;
pub mod trigger;

pub mod adapters;
pub mod app;
pub mod control;
pub mod robot;
pub mod subsystems;

pub use error::{Error, Result};
