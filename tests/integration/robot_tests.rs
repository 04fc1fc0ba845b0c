//! Integration tests for the robot wiring: bindings → commands →
//! subsystems → mock ports.

use crate::mock_hw::{MockCan, MockPlatform, RecordingSink, mock_hardware, test_config};

use robocmd::command::CommandId;
use robocmd::error::Error;
use robocmd::input::{Axis, Button, ControllerState, Snapshot, pov};
use robocmd::mode::RobotMode;
use robocmd::robot::Robot;
use robocmd::subsystems::drivetrain::SwerveRequest;

fn make_robot(can: MockCan) -> (Robot<MockPlatform>, RecordingSink) {
    let config = test_config();
    let mut robot = Robot::new(&config, mock_hardware(can)).unwrap();
    let mut sink = RecordingSink::default();
    robot.start(&mut sink);
    (robot, sink)
}

fn teleop(controller: ControllerState) -> Snapshot {
    Snapshot::new(RobotMode::Teleop, controller)
}

fn running_names(robot: &Robot<MockPlatform>) -> Vec<&'static str> {
    robot.service().scheduler().running().map(|(_, name)| name).collect()
}

// ── Drivetrain ───────────────────────────────────────────────

#[test]
fn disabled_robot_holds_drivetrain_idle() {
    let (mut robot, mut sink) = make_robot(MockCan::default());

    robot.tick(&Snapshot::DISABLED, &mut sink);

    assert_eq!(running_names(&robot), ["drivetrain_idle"]);
    assert_eq!(robot.context().drivetrain.port().last(), Some(SwerveRequest::Idle));
}

#[test]
fn teleop_entry_hands_drivetrain_to_joystick_drive() {
    let (mut robot, mut sink) = make_robot(MockCan::default());
    let drive = robot.ids().drivetrain;

    robot.tick(&Snapshot::DISABLED, &mut sink);
    robot.tick(
        &teleop(ControllerState::NEUTRAL.with_axis(Axis::LeftY, -0.6)),
        &mut sink,
    );

    assert_eq!(
        robot.service().scheduler().owner_of(drive),
        Some(CommandId::Default(drive))
    );
    let Some(SwerveRequest::FieldCentric { vx, vy, omega }) = robot.context().drivetrain.port().last() else {
        panic!("expected a field-centric request");
    };
    // Stick past the 0.1 deadband: (0.6 - 0.1) / 0.9 of 4.5 m/s.
    assert!((vx - 2.5).abs() < 1e-4, "vx = {vx}");
    assert_eq!(vy, 0.0);
    assert_eq!(omega, 0.0);
}

#[test]
fn back_and_start_seed_heading_once() {
    let (mut robot, mut sink) = make_robot(MockCan::default());
    let drive = robot.ids().drivetrain;
    let combo = ControllerState::NEUTRAL
        .with_button(Button::Back)
        .with_button(Button::Start);

    robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    for _ in 0..3 {
        robot.tick(&teleop(combo), &mut sink);
    }

    assert_eq!(robot.context().drivetrain.port().seeds, 1);
    assert_eq!(
        robot.service().scheduler().owner_of(drive),
        Some(CommandId::Default(drive))
    );
}

#[test]
fn back_and_b_brake_while_held() {
    let (mut robot, mut sink) = make_robot(MockCan::default());
    let combo = ControllerState::NEUTRAL
        .with_button(Button::Back)
        .with_button(Button::B);

    robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    robot.tick(&teleop(combo), &mut sink);
    robot.tick(&teleop(combo), &mut sink);
    assert_eq!(robot.context().drivetrain.port().last(), Some(SwerveRequest::Brake));

    // Released: joystick drive takes over again in the same tick.
    robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    assert!(matches!(
        robot.context().drivetrain.port().last(),
        Some(SwerveRequest::FieldCentric { .. })
    ));
}

#[test]
fn start_and_pov_nudge_robot_centric() {
    let (mut robot, mut sink) = make_robot(MockCan::default());
    let combo = ControllerState::NEUTRAL
        .with_button(Button::Start)
        .with_pov(Some(pov::LEFT));

    robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    robot.tick(&teleop(combo), &mut sink);

    let Some(SwerveRequest::RobotCentric { vx, vy, .. }) = robot.context().drivetrain.port().last() else {
        panic!("expected a robot-centric request");
    };
    assert_eq!(vx, 0.0);
    assert!((vy + 0.9).abs() < 1e-5, "vy = {vy}");
}

// ── General motor and servo ──────────────────────────────────

#[test]
fn x_runs_general_motor_only_while_held() {
    let (mut robot, mut sink) = make_robot(MockCan::default());
    let x = ControllerState::NEUTRAL.with_button(Button::X);

    for _ in 0..3 {
        robot.tick(&teleop(x), &mut sink);
    }
    let motor = &robot.context().general_motor;
    assert!(motor.is_running());
    assert_eq!(motor.output(), 0.5);
    // Half forward: 1.75 ms pulse.
    assert_eq!(motor.pwm().last_duty(), Some(1_750));

    robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    let motor = &robot.context().general_motor;
    assert!(!motor.is_running());
    assert_eq!(motor.pwm().last_duty(), Some(1_500));
}

#[test]
fn releasing_a_slews_servo_to_min() {
    let (mut robot, mut sink) = make_robot(MockCan::default());

    robot.tick(&teleop(ControllerState::NEUTRAL.with_button(Button::A)), &mut sink);
    assert_eq!(robot.context().general_servo.destination(), 0.5);

    robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    let servo = &robot.context().general_servo;
    assert_eq!(servo.destination(), 0.0);
    assert!((servo.position() - 0.48).abs() < 1e-6);
    assert!(running_names(&robot).contains(&"servo_to_min"));

    for _ in 0..30 {
        robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    }
    let servo = &robot.context().general_servo;
    assert_eq!(servo.position(), 0.0);
    assert_eq!(servo.pwm().last_duty(), Some(1_000));
    assert!(!running_names(&robot).contains(&"servo_to_min"));
}

// ── Encoded motor ────────────────────────────────────────────

#[test]
fn pov_left_drives_encoded_motor_to_destination_a() {
    let (mut robot, mut sink) = make_robot(MockCan::default());

    robot.tick(&teleop(ControllerState::NEUTRAL.with_pov(Some(pov::LEFT))), &mut sink);
    assert!(running_names(&robot).contains(&"encoded_motor_to_a"));

    for _ in 0..200 {
        robot.tick(&teleop(ControllerState::NEUTRAL), &mut sink);
    }

    let motor = &robot.context().encoded_motor;
    assert!((motor.position() - 10.0).abs() <= 0.25, "position = {}", motor.position());
    assert_eq!(motor.port().last_output(), Some(0.0));
    assert!(!running_names(&robot).contains(&"encoded_motor_to_a"));
    assert_eq!(sink.faults(), 0);
}

#[test]
fn can_failure_faults_the_command_and_ticking_continues() {
    let (mut robot, mut sink) = make_robot(MockCan::failing_after(2));
    let up = ControllerState::NEUTRAL.with_pov(Some(pov::UP));

    for _ in 0..5 {
        robot.tick(&teleop(up), &mut sink);
    }

    assert_eq!(sink.faults(), 1);
    assert!(!running_names(&robot).contains(&"encoded_motor_forward"));
    assert_eq!(robot.context().encoded_motor.port().outputs, [0.3, 0.3]);
    assert!(running_names(&robot).contains(&"field_centric_drive"));
    assert_eq!(robot.service().tick_count(), 5);
}

// ── Telemetry and setup ──────────────────────────────────────

#[test]
fn telemetry_frames_carry_dashboard_values() {
    let (mut robot, mut sink) = make_robot(MockCan::default());

    robot.tick(&teleop(ControllerState::NEUTRAL.with_button(Button::X)), &mut sink);

    let frame = sink.frames.last().unwrap();
    assert_eq!(frame.mode, RobotMode::Teleop);
    assert_eq!(frame.value("General Motor Running"), Some(1.0));
    assert_eq!(frame.value("General Servo Position"), Some(0.5));
    assert_eq!(frame.value("General Servo Destination"), Some(0.5));
    assert_eq!(frame.value("Encoded Motor Running"), Some(0.0));
    assert_eq!(frame.value("Encoded Motor Position"), Some(0.0));
    let motor_owner = frame
        .scheduler
        .owners
        .iter()
        .find(|o| o.subsystem == "general_motor")
        .and_then(|o| o.owner);
    assert!(motor_owner.is_some());
}

#[test]
fn invalid_config_is_rejected_at_setup() {
    let mut config = test_config();
    config.tick_period_ms = 0;
    let err = Robot::<MockPlatform>::new(&config, mock_hardware(MockCan::default()))
        .err()
        .unwrap();
    assert_eq!(err, Error::Config("tick period must be non-zero"));
}
