//! The competition robot: concrete subsystems, bindings and autonomous
//! routines wired onto the command core.
//!
//! ```text
//!  ┌──────────────────────── Robot<P> ─────────────────────────┐
//!  │  RobotContext<P>               ControlService             │
//!  │  ├─ controller sample          ├─ ModeController          │
//!  │  ├─ GeneralMotor  (PWM 4)      ├─ CommandScheduler        │
//!  │  ├─ GeneralServo  (PWM 9)      │   ├─ SubsystemTable      │
//!  │  ├─ EncodedMotor  (CAN 5)      │   └─ BindingTable        │
//!  │  └─ Drivetrain    (swerve)     └─ NamedChooser            │
//!  └───────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything hardware-specific comes in through a [`Platform`], so the
//! same wiring runs against real ports or the simulator.

pub mod bindings;

use embedded_hal::pwm::SetDutyCycle;
use log::info;

use crate::app::events::TelemetryValue;
use crate::app::ports::{EncodedMotorPort, EventSink, SwervePort, TelemetrySink, TelemetrySource};
use crate::app::service::ControlService;
use crate::chooser::NamedChooser;
use crate::config::{ControllerConfig, DashboardTitles};
use crate::error::Result;
use crate::input::{ControllerState, Snapshot};
use crate::scheduler::CommandScheduler;
use crate::subsystem::{SubsystemId, SubsystemTable};
use crate::subsystems::drivetrain::Drivetrain;
use crate::subsystems::encoded_motor::EncodedMotor;
use crate::subsystems::general_motor::GeneralMotor;
use crate::subsystems::general_servo::GeneralServo;

// ───────────────────────────────────────────────────────────────
// Platform
// ───────────────────────────────────────────────────────────────

/// The set of port types a deployment provides.
pub trait Platform: 'static {
    type Pwm: SetDutyCycle + 'static;
    type Can: EncodedMotorPort + 'static;
    type Swerve: SwervePort + 'static;
}

/// Port instances handed to [`Robot::new`].
pub struct Hardware<P: Platform> {
    pub general_motor: P::Pwm,
    pub general_servo: P::Pwm,
    pub encoded_motor: P::Can,
    pub drivetrain: P::Swerve,
}

// ───────────────────────────────────────────────────────────────
// Command context
// ───────────────────────────────────────────────────────────────

/// Handed to every command hook: the tick's controller sample plus every
/// subsystem.
pub struct RobotContext<P: Platform> {
    pub controller: ControllerState,
    pub general_motor: GeneralMotor<P::Pwm>,
    pub general_servo: GeneralServo<P::Pwm>,
    pub encoded_motor: EncodedMotor<P::Can>,
    pub drivetrain: Drivetrain<P::Swerve>,
    titles: DashboardTitles,
}

impl<P: Platform> TelemetrySource for RobotContext<P> {
    fn telemetry_values(&self) -> Vec<TelemetryValue> {
        let t = &self.titles;
        vec![
            TelemetryValue::flag(&t.general_motor_running, self.general_motor.is_running()),
            TelemetryValue::new(&t.general_servo_position, self.general_servo.position()),
            TelemetryValue::new(&t.general_servo_destination, self.general_servo.destination()),
            TelemetryValue::flag(&t.encoded_motor_running, self.encoded_motor.is_running()),
            TelemetryValue::new(&t.encoded_motor_position, self.encoded_motor.position()),
        ]
    }
}

/// Scheduler handles of the four subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubsystemIds {
    pub general_motor: SubsystemId,
    pub general_servo: SubsystemId,
    pub encoded_motor: SubsystemId,
    pub drivetrain: SubsystemId,
}

// ───────────────────────────────────────────────────────────────
// Robot
// ───────────────────────────────────────────────────────────────

pub struct Robot<P: Platform> {
    service: ControlService<RobotContext<P>, NamedChooser<RobotContext<P>>>,
    ctx: RobotContext<P>,
    ids: SubsystemIds,
}

impl<P: Platform> Robot<P> {
    /// Register subsystems, declare bindings and autonomous routines, and
    /// validate the lot.  Fails only on an invalid configuration or a
    /// binding that names an unknown subsystem.
    pub fn new(config: &ControllerConfig, hw: Hardware<P>) -> Result<Self> {
        config.validate()?;
        let ch = config.channels;

        let ctx = RobotContext {
            controller: ControllerState::NEUTRAL,
            general_motor: GeneralMotor::new(hw.general_motor, ch.general_motor_pwm),
            general_servo: GeneralServo::new(hw.general_servo, ch.general_servo_pwm),
            encoded_motor: EncodedMotor::new(hw.encoded_motor, ch.encoded_motor_can, &config.encoded_motor),
            drivetrain: Drivetrain::new(hw.drivetrain, config.swerve),
            titles: config.dashboard.clone(),
        };

        let mut subsystems = SubsystemTable::new();
        let ids = SubsystemIds {
            general_motor: subsystems.register("general_motor")?,
            general_servo: subsystems.register("general_servo")?,
            encoded_motor: subsystems.register("encoded_motor")?,
            drivetrain: subsystems.register("drivetrain")?,
        };

        bindings::set_defaults(&mut subsystems, ids)?;
        let table = bindings::controller_bindings(config, ids);
        let binding_count = table.len();
        let scheduler = CommandScheduler::new(subsystems, table)?;

        let mut chooser = bindings::autonomous_chooser(config, ids);
        chooser.select(&config.default_autonomous);

        info!(
            "Robot ready: {} bindings, autonomous '{}'",
            binding_count,
            chooser.selected_name().unwrap_or("none")
        );

        Ok(Self {
            service: ControlService::new(scheduler, chooser, config.telemetry_interval_ticks),
            ctx,
            ids,
        })
    }

    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.service.start(sink);
    }

    /// One tick on the tick-start `snapshot`.
    pub fn tick(&mut self, snapshot: &Snapshot, sink: &mut (impl EventSink + TelemetrySink)) {
        self.ctx.controller = snapshot.controller;
        self.service.tick(&mut self.ctx, snapshot, sink);
    }

    pub fn context(&self) -> &RobotContext<P> {
        &self.ctx
    }

    pub fn ids(&self) -> SubsystemIds {
        self.ids
    }

    pub fn service(&self) -> &ControlService<RobotContext<P>, NamedChooser<RobotContext<P>>> {
        &self.service
    }

    pub fn chooser_mut(&mut self) -> &mut NamedChooser<RobotContext<P>> {
        self.service.chooser_mut()
    }
}
