//! Application layer: tick orchestration around the command core.
//!
//! The scheduler, triggers and mode controller are pure logic.  This layer
//! sequences them once per tick and pushes their output through the
//! **port traits** defined in [`ports`], keeping everything testable without
//! real peripherals.

pub mod events;
pub mod ports;
pub mod service;
