//! Operator bindings, default commands and autonomous routines.
//!
//! | Input                 | Policy     | Command                          |
//! |-----------------------|------------|----------------------------------|
//! | X                     | while true | general motor forward            |
//! | A / B / Y             | on false   | servo to min / max / A position  |
//! | right / left bumper   | while true | servo adjust ahead / reverse     |
//! | POV up                | while true | encoded motor forward            |
//! | POV down              | on true    | encoded motor stop               |
//! | POV left / right      | on true    | encoded motor to destination A/B |
//! | Start + POV           | while true | robot-centric nudge              |
//! | Back + Start          | on true    | seed field-centric heading       |
//! | robot disabled        | while true | drivetrain idle (runs disabled)  |
//! | Back + B              | while true | drivetrain brake                 |
//! | Back + A              | while true | point wheels along left stick    |
//!
//! The drivetrain's default command is field-centric joystick drive.

use crate::binding::BindingTable;
use crate::chooser::NamedChooser;
use crate::command::{BoxedCommand, FunctionalCommand};
use crate::config::ControllerConfig;
use crate::error::Result;
use crate::input::{Button, pov};
use crate::subsystem::{SubsystemId, SubsystemTable};
use crate::subsystems::drivetrain::SwerveRequest;
use crate::trigger::Trigger;

use super::{Platform, RobotContext, SubsystemIds};

type Ctx<P> = RobotContext<P>;
type Cmd<P> = BoxedCommand<RobotContext<P>>;

// ───────────────────────────────────────────────────────────────
// Wiring
// ───────────────────────────────────────────────────────────────

pub fn set_defaults<P: Platform>(subsystems: &mut SubsystemTable<Ctx<P>>, ids: SubsystemIds) -> Result<()> {
    let drive = ids.drivetrain;
    subsystems.set_default(drive, move || field_centric_drive::<P>(drive))
}

pub fn controller_bindings<P: Platform>(config: &ControllerConfig, ids: SubsystemIds) -> BindingTable<Ctx<P>> {
    let mut table = BindingTable::new();
    let SubsystemIds {
        general_motor,
        general_servo,
        encoded_motor,
        drivetrain,
    } = ids;

    // General motor
    let forward = config.general_motor_forward_percent;
    table.while_true(Trigger::button(Button::X), move || {
        general_motor_forward::<P>(general_motor, forward)
    });

    // General servo
    let servo = config.servo;
    table.on_false(Trigger::button(Button::A), move || {
        servo_to::<P>("servo_to_min", general_servo, servo.min_position, servo.step_per_tick)
    });
    table.on_false(Trigger::button(Button::B), move || {
        servo_to::<P>("servo_to_max", general_servo, servo.max_position, servo.step_per_tick)
    });
    table.on_false(Trigger::button(Button::Y), move || {
        servo_to::<P>("servo_to_a", general_servo, servo.a_position, servo.step_per_tick)
    });
    table.while_true(Trigger::button(Button::RightBumper), move || {
        servo_adjust::<P>("servo_adjust_ahead", general_servo, servo.step_per_tick)
    });
    table.while_true(Trigger::button(Button::LeftBumper), move || {
        servo_adjust::<P>("servo_adjust_reverse", general_servo, -servo.step_per_tick)
    });

    // Encoded motor
    let motor = config.encoded_motor;
    let dt = config.tick_secs();
    table.while_true(Trigger::pov_up(), move || {
        encoded_motor_forward::<P>(encoded_motor, motor.forward_percent)
    });
    table.on_true(Trigger::pov_down(), move || encoded_motor_stop::<P>(encoded_motor));
    table.on_true(Trigger::pov_left(), move || {
        encoded_motor_to::<P>("encoded_motor_to_a", encoded_motor, motor.destination_a, dt)
    });
    table.on_true(Trigger::pov_right(), move || {
        encoded_motor_to::<P>("encoded_motor_to_b", encoded_motor, motor.destination_b, dt)
    });

    // Drivetrain
    for angle in [pov::UP, pov::DOWN, pov::RIGHT, pov::LEFT] {
        table.while_true(Trigger::button(Button::Start) & Trigger::pov(angle), move || {
            pov_nudge::<P>(drivetrain, angle)
        });
    }
    table.on_true(
        Trigger::button(Button::Back) & Trigger::button(Button::Start),
        move || seed_field_centric::<P>(drivetrain),
    );
    table.while_true(Trigger::disabled(), move || drivetrain_idle::<P>(drivetrain));
    table.while_true(
        Trigger::button(Button::Back) & Trigger::button(Button::B),
        move || drivetrain_brake::<P>(drivetrain),
    );
    table.while_true(
        Trigger::button(Button::Back) & Trigger::button(Button::A),
        move || point_wheels::<P>(drivetrain),
    );

    table
}

/// Autonomous routines.  `"Tests"` is the default.
pub fn autonomous_chooser<P: Platform>(config: &ControllerConfig, ids: SubsystemIds) -> NamedChooser<Ctx<P>> {
    let mut chooser = NamedChooser::new();
    let drive = ids.drivetrain;
    let speed = config.swerve.max_pov_speed * config.swerve.max_speed_mps;
    let ticks = 2_000 / config.tick_period_ms.max(1);
    chooser.set_default_option("Tests", move || drive_forward_timed::<P>(drive, speed, ticks));
    chooser.add_option("Do Nothing", || {
        FunctionalCommand::instant("do_nothing", &[], |_: &mut Ctx<P>| Ok(())).boxed()
    });
    chooser
}

// ───────────────────────────────────────────────────────────────
// Command builders
// ───────────────────────────────────────────────────────────────

pub fn general_motor_forward<P: Platform>(motor: SubsystemId, percent: f32) -> Cmd<P> {
    FunctionalCommand::run("general_motor_forward", &[motor], move |ctx: &mut Ctx<P>| {
        ctx.general_motor.set(percent)
    })
    .on_end(|ctx, _| ctx.general_motor.stop())
    .boxed()
}

/// Slew the servo to `position`; finishes on arrival.
pub fn servo_to<P: Platform>(name: &'static str, servo: SubsystemId, position: f32, step: f32) -> Cmd<P> {
    FunctionalCommand::<Ctx<P>>::new(name, &[servo])
        .on_init(move |ctx| {
            ctx.general_servo.set_destination(position);
            Ok(())
        })
        .on_execute(move |ctx| ctx.general_servo.step_toward_destination(step).map(|_| ()))
        .until(|ctx| ctx.general_servo.at_destination())
        .boxed()
}

/// Nudge the servo destination by `delta` every tick.
pub fn servo_adjust<P: Platform>(name: &'static str, servo: SubsystemId, delta: f32) -> Cmd<P> {
    FunctionalCommand::run(name, &[servo], move |ctx: &mut Ctx<P>| {
        ctx.general_servo.adjust_destination(delta);
        ctx.general_servo.step_toward_destination(delta.abs()).map(|_| ())
    })
    .boxed()
}

pub fn encoded_motor_forward<P: Platform>(motor: SubsystemId, percent: f32) -> Cmd<P> {
    FunctionalCommand::run("encoded_motor_forward", &[motor], move |ctx: &mut Ctx<P>| {
        ctx.encoded_motor.set(percent)
    })
    .on_end(|ctx, _| ctx.encoded_motor.stop())
    .boxed()
}

pub fn encoded_motor_stop<P: Platform>(motor: SubsystemId) -> Cmd<P> {
    FunctionalCommand::instant("encoded_motor_stop", &[motor], |ctx: &mut Ctx<P>| {
        ctx.encoded_motor.stop()
    })
    .boxed()
}

/// Closed-loop move to `destination`; finishes within tolerance.
pub fn encoded_motor_to<P: Platform>(name: &'static str, motor: SubsystemId, destination: f32, dt: f32) -> Cmd<P> {
    FunctionalCommand::<Ctx<P>>::new(name, &[motor])
        .on_init(move |ctx| {
            ctx.encoded_motor.go_to(destination);
            Ok(())
        })
        .on_execute(move |ctx| ctx.encoded_motor.step_to_destination(dt).map(|_| ()))
        .until(|ctx| ctx.encoded_motor.at_destination())
        .on_end(|ctx, _| ctx.encoded_motor.stop())
        .boxed()
}

pub fn field_centric_drive<P: Platform>(drive: SubsystemId) -> Cmd<P> {
    FunctionalCommand::run("field_centric_drive", &[drive], |ctx: &mut Ctx<P>| {
        let request = ctx.drivetrain.field_centric_from(&ctx.controller);
        ctx.drivetrain.apply(request)
    })
    .boxed()
}

pub fn pov_nudge<P: Platform>(drive: SubsystemId, angle: u16) -> Cmd<P> {
    FunctionalCommand::run("pov_nudge", &[drive], move |ctx: &mut Ctx<P>| {
        match ctx.drivetrain.pov_nudge(angle) {
            Some(request) => ctx.drivetrain.apply(request),
            None => Ok(()),
        }
    })
    .boxed()
}

pub fn seed_field_centric<P: Platform>(drive: SubsystemId) -> Cmd<P> {
    FunctionalCommand::instant("seed_field_centric", &[drive], |ctx: &mut Ctx<P>| {
        ctx.drivetrain.seed_field_centric();
        Ok(())
    })
    .boxed()
}

pub fn drivetrain_idle<P: Platform>(drive: SubsystemId) -> Cmd<P> {
    FunctionalCommand::run("drivetrain_idle", &[drive], |ctx: &mut Ctx<P>| {
        ctx.drivetrain.apply(SwerveRequest::Idle)
    })
    .ignoring_disable(true)
    .boxed()
}

pub fn drivetrain_brake<P: Platform>(drive: SubsystemId) -> Cmd<P> {
    FunctionalCommand::run("drivetrain_brake", &[drive], |ctx: &mut Ctx<P>| {
        ctx.drivetrain.apply(SwerveRequest::Brake)
    })
    .boxed()
}

pub fn point_wheels<P: Platform>(drive: SubsystemId) -> Cmd<P> {
    FunctionalCommand::run("point_wheels", &[drive], |ctx: &mut Ctx<P>| {
        let request = ctx.drivetrain.point_along_stick(&ctx.controller);
        ctx.drivetrain.apply(request)
    })
    .boxed()
}

/// Robot-centric forward at `speed` for `ticks`, then idle.
pub fn drive_forward_timed<P: Platform>(drive: SubsystemId, speed: f32, ticks: u32) -> Cmd<P> {
    FunctionalCommand::run("drive_forward_timed", &[drive], move |ctx: &mut Ctx<P>| {
        ctx.drivetrain.apply(SwerveRequest::RobotCentric {
            vx: speed,
            vy: 0.0,
            omega: 0.0,
        })
    })
    .with_timeout(ticks)
    .on_end(|ctx, _| ctx.drivetrain.apply(SwerveRequest::Idle))
    .boxed()
}
