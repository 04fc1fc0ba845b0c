//! Outbound application events.
//!
//! The [`ControlService`](super::service::ControlService) emits these
//! through the [`EventSink`](super::ports::EventSink) port and publishes
//! [`TelemetryFrame`]s through the
//! [`TelemetrySink`](super::ports::TelemetrySink) port.

use serde::Serialize;

use crate::mode::RobotMode;
use crate::scheduler::{SchedulerEvent, SchedulerTelemetry};

/// Structured events emitted by the control core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(RobotMode),

    /// The platform-reported mode changed.
    ModeChanged { from: RobotMode, to: RobotMode },

    /// A command changed lifecycle state.
    Command(SchedulerEvent),
}

/// One dashboard entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryValue {
    pub title: String,
    pub value: f32,
}

impl TelemetryValue {
    pub fn new(title: impl Into<String>, value: f32) -> Self {
        Self {
            title: title.into(),
            value,
        }
    }

    pub fn flag(title: impl Into<String>, on: bool) -> Self {
        Self::new(title, if on { 1.0 } else { 0.0 })
    }
}

/// A point-in-time snapshot suitable for logging or transmission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryFrame {
    pub mode: RobotMode,
    pub scheduler: SchedulerTelemetry,
    pub values: Vec<TelemetryValue>,
}

impl TelemetryFrame {
    /// Look a dashboard value up by title.
    pub fn value(&self, title: &str) -> Option<f32> {
        self.values.iter().find(|v| v.title == title).map(|v| v.value)
    }
}
