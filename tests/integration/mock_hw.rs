//! Mock hardware for integration tests.
//!
//! Records every actuator call so tests can assert on the full command
//! history without touching a PWM peripheral or a CAN bus.  The CAN motor
//! can be told to start failing after a number of writes.

use embedded_hal::pwm::{self, ErrorKind, ErrorType, SetDutyCycle};

use robocmd::app::events::{AppEvent, TelemetryFrame};
use robocmd::app::ports::{EncodedMotorPort, EventSink, SwervePort, TelemetrySink};
use robocmd::config::ControllerConfig;
use robocmd::error::{ActuatorError, Result};
use robocmd::robot::{Hardware, Platform};
use robocmd::scheduler::SchedulerEvent;
use robocmd::subsystems::drivetrain::SwerveRequest;

/// 20 ms frame at 1 µs resolution.
pub const FRAME_US: u16 = 20_000;

// ── MockPwm ───────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPwmError;

impl pwm::Error for MockPwmError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Debug, Default)]
pub struct MockPwm {
    pub duties: Vec<u16>,
}

#[allow(dead_code)]
impl MockPwm {
    pub fn last_duty(&self) -> Option<u16> {
        self.duties.last().copied()
    }
}

impl ErrorType for MockPwm {
    type Error = MockPwmError;
}

impl SetDutyCycle for MockPwm {
    fn max_duty_cycle(&self) -> u16 {
        FRAME_US
    }

    fn set_duty_cycle(&mut self, duty: u16) -> core::result::Result<(), MockPwmError> {
        self.duties.push(duty);
        Ok(())
    }
}

// ── MockCan ───────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockCan {
    pub outputs: Vec<f32>,
    pub position: f32,
    /// Every write after this many succeeds fails.
    pub fail_after: Option<usize>,
}

#[allow(dead_code)]
impl MockCan {
    pub fn failing_after(writes: usize) -> Self {
        Self {
            fail_after: Some(writes),
            ..Self::default()
        }
    }

    pub fn last_output(&self) -> Option<f32> {
        self.outputs.last().copied()
    }
}

impl EncodedMotorPort for MockCan {
    fn set_output(&mut self, percent: f32) -> Result<()> {
        if self.fail_after.is_some_and(|n| self.outputs.len() >= n) {
            return Err(ActuatorError::CanWriteFailed.into());
        }
        self.outputs.push(percent);
        self.position += percent * 0.5;
        Ok(())
    }

    fn position(&self) -> f32 {
        self.position
    }
}

// ── MockSwerve ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockSwerve {
    pub requests: Vec<SwerveRequest>,
    pub seeds: u32,
}

#[allow(dead_code)]
impl MockSwerve {
    pub fn last(&self) -> Option<SwerveRequest> {
        self.requests.last().copied()
    }
}

impl SwervePort for MockSwerve {
    fn apply(&mut self, request: &SwerveRequest) -> Result<()> {
        self.requests.push(*request);
        Ok(())
    }

    fn seed_field_centric(&mut self) {
        self.seeds += 1;
    }
}

// ── MockPlatform ──────────────────────────────────────────────

pub struct MockPlatform;

impl Platform for MockPlatform {
    type Pwm = MockPwm;
    type Can = MockCan;
    type Swerve = MockSwerve;
}

#[allow(dead_code)]
pub fn mock_hardware(can: MockCan) -> Hardware<MockPlatform> {
    Hardware {
        general_motor: MockPwm::default(),
        general_servo: MockPwm::default(),
        encoded_motor: can,
        drivetrain: MockSwerve::default(),
    }
}

/// Defaults with telemetry on every tick.
#[allow(dead_code)]
pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        telemetry_interval_ticks: 1,
        ..ControllerConfig::default()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
    pub frames: Vec<TelemetryFrame>,
}

#[allow(dead_code)]
impl RecordingSink {
    /// Scheduler events only, in emission order.
    pub fn command_events(&self) -> Vec<SchedulerEvent> {
        self.events
            .iter()
            .filter_map(|e| match e {
                AppEvent::Command(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    pub fn faults(&self) -> usize {
        self.command_events()
            .iter()
            .filter(|e| matches!(e, SchedulerEvent::Faulted { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.frames.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

impl TelemetrySink for RecordingSink {
    fn publish(&mut self, frame: &TelemetryFrame) {
        self.frames.push(frame.clone());
    }
}
