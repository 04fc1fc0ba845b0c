//! Log-based event and telemetry sink adapter.
//!
//! Implements [`EventSink`] and [`TelemetrySink`] by writing structured
//! application events to the `log` facade (stderr via `env_logger` in the
//! binary).  A network-table adapter would implement the same traits.

use log::{info, warn};

use crate::app::events::{AppEvent, TelemetryFrame};
use crate::app::ports::{EventSink, TelemetrySink};
use crate::scheduler::SchedulerEvent;

/// Adapter that logs every [`AppEvent`] and telemetry frame.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | mode={}", mode);
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE  | {} -> {}", from, to);
            }
            AppEvent::Command(e) => match e {
                SchedulerEvent::Started { id, name } => info!("CMD   | start {} ({})", name, id),
                SchedulerEvent::Finished { id, name } => info!("CMD   | done {} ({})", name, id),
                SchedulerEvent::Interrupted { id, name, by } => match by {
                    Some(by) => info!("CMD   | interrupt {} ({}) by {}", name, id, by),
                    None => info!("CMD   | cancel {} ({})", name, id),
                },
                SchedulerEvent::Rejected { id, name, reason } => {
                    info!("CMD   | reject {} ({}): {:?}", name, id, reason);
                }
                SchedulerEvent::Faulted { id, name, reason } => {
                    warn!("FAULT | {} ({}): {}", name, id, reason);
                }
            },
        }
    }
}

impl TelemetrySink for LogEventSink {
    fn publish(&mut self, frame: &TelemetryFrame) {
        match serde_json::to_string(frame) {
            Ok(json) => info!("TELEM | {}", json),
            Err(e) => warn!("TELEM | encode failed: {}", e),
        }
    }
}
