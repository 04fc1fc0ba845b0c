//! Integration tests for the ControlService → ModeController → scheduler
//! pipeline on a bare context, without any robot wiring.

use crate::mock_hw::RecordingSink;

use robocmd::app::events::AppEvent;
use robocmd::app::ports::TelemetrySource;
use robocmd::app::service::ControlService;
use robocmd::binding::BindingTable;
use robocmd::chooser::NamedChooser;
use robocmd::command::{CommandId, CommandState, FunctionalCommand, Interruption};
use robocmd::error::Error;
use robocmd::input::{Button, ControllerState, Snapshot};
use robocmd::mode::RobotMode;
use robocmd::scheduler::{CommandScheduler, FaultReason, SchedulerEvent};
use robocmd::subsystem::{SubsystemId, SubsystemTable};
use robocmd::trigger::Trigger;

/// Command context: a journal of hook calls.
#[derive(Default)]
struct Bench {
    log: Vec<String>,
}

impl Bench {
    fn count(&self, entry: &str) -> usize {
        self.log.iter().filter(|e| *e == entry).count()
    }
}

impl TelemetrySource for Bench {}

type Service = ControlService<Bench, NamedChooser<Bench>>;

fn tracked(name: &'static str, reqs: &[SubsystemId]) -> FunctionalCommand<Bench> {
    FunctionalCommand::new(name, reqs)
        .on_init(move |b: &mut Bench| {
            b.log.push(format!("init:{name}"));
            Ok(())
        })
        .on_end(move |b: &mut Bench, interrupted| {
            b.log.push(format!("end:{name}:{interrupted}"));
            Ok(())
        })
}

fn snap(mode: RobotMode, buttons: &[Button]) -> Snapshot {
    let mut c = ControllerState::NEUTRAL;
    for b in buttons {
        c.press(*b);
    }
    Snapshot::new(mode, c)
}

struct Rig {
    service: Service,
    bench: Bench,
    sink: RecordingSink,
}

impl Rig {
    fn new(scheduler: CommandScheduler<Bench>, chooser: NamedChooser<Bench>) -> Self {
        let mut rig = Self {
            service: ControlService::new(scheduler, chooser, 0),
            bench: Bench::default(),
            sink: RecordingSink::default(),
        };
        rig.service.start(&mut rig.sink);
        rig
    }

    fn tick(&mut self, mode: RobotMode, buttons: &[Button]) {
        self.service
            .tick(&mut self.bench, &snap(mode, buttons), &mut self.sink);
    }

    fn scheduler(&self) -> &CommandScheduler<Bench> {
        self.service.scheduler()
    }
}

// ── Mode transitions ─────────────────────────────────────────

#[test]
fn test_entry_cancels_every_running_command() {
    let mut subsystems = SubsystemTable::new();
    let s1 = subsystems.register("s1").unwrap();
    let s2 = subsystems.register("s2").unwrap();
    let mut bindings = BindingTable::new();
    let guard = bindings.on_true(Trigger::button(Button::A), move || {
        tracked("guard", &[s1])
            .with_interruption(Interruption::CancelIncoming)
            .boxed()
    });
    let mover = bindings.on_true(Trigger::button(Button::B), move || tracked("mover", &[s2]).boxed());
    let scheduler = CommandScheduler::new(subsystems, bindings).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    rig.tick(RobotMode::Teleop, &[]);
    rig.tick(RobotMode::Teleop, &[Button::A, Button::B]);
    assert!(rig.scheduler().is_running(guard));
    assert!(rig.scheduler().is_running(mover));

    // Buttons stay held, so nothing re-fires on the transition tick.
    rig.tick(RobotMode::Test, &[Button::A, Button::B]);

    assert_eq!(rig.scheduler().state_of(guard), CommandState::Cancelled);
    assert_eq!(rig.scheduler().state_of(mover), CommandState::Cancelled);
    assert_eq!(rig.scheduler().owner_of(s1), None);
    assert_eq!(rig.scheduler().owner_of(s2), None);
    assert_eq!(rig.bench.count("end:guard:true"), 1);
    assert_eq!(rig.bench.count("end:mover:true"), 1);
    assert_eq!(rig.service.mode(), RobotMode::Test);
}

#[test]
fn autonomous_command_is_cancelled_on_teleop_entry() {
    let mut subsystems = SubsystemTable::new();
    let drive = subsystems.register("drive").unwrap();
    let scheduler = CommandScheduler::new(subsystems, BindingTable::new()).unwrap();
    let mut chooser = NamedChooser::new();
    chooser.set_default_option("Tests", move || tracked("auto", &[drive]).boxed());
    let mut rig = Rig::new(scheduler, chooser);

    rig.tick(RobotMode::Disabled, &[]);
    rig.tick(RobotMode::Autonomous, &[]);

    let auto = rig.service.modes().autonomous_command().unwrap();
    assert!(rig.scheduler().is_running(auto));
    assert_eq!(rig.scheduler().owner_of(drive), Some(auto));

    rig.sink.clear();
    rig.tick(RobotMode::Teleop, &[]);

    assert_eq!(rig.scheduler().state_of(auto), CommandState::Cancelled);
    assert_eq!(rig.scheduler().owner_of(drive), None);
    assert_eq!(rig.bench.count("end:auto:true"), 1);
    assert_eq!(
        rig.sink.events.first(),
        Some(&AppEvent::ModeChanged {
            from: RobotMode::Autonomous,
            to: RobotMode::Teleop,
        })
    );
    assert!(rig.sink.command_events().contains(&SchedulerEvent::Interrupted {
        id: auto,
        name: "auto",
        by: None,
    }));
}

#[test]
fn autonomous_entry_without_selection_is_a_noop() {
    let mut subsystems = SubsystemTable::new();
    subsystems.register("drive").unwrap();
    let scheduler = CommandScheduler::new(subsystems, BindingTable::new()).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    rig.tick(RobotMode::Autonomous, &[]);
    rig.tick(RobotMode::Autonomous, &[]);

    assert_eq!(rig.service.modes().autonomous_command(), None);
    assert_eq!(rig.scheduler().running_count(), 0);
    assert_eq!(rig.service.tick_count(), 2);
}

#[test]
fn disabled_entry_keeps_only_commands_that_run_disabled() {
    let mut subsystems = SubsystemTable::new();
    let s1 = subsystems.register("s1").unwrap();
    let s2 = subsystems.register("s2").unwrap();
    let scheduler = CommandScheduler::new(subsystems, BindingTable::new()).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    rig.tick(RobotMode::Teleop, &[]);
    let (normal, _) = rig
        .service
        .scheduler_mut()
        .schedule(&mut rig.bench, tracked("normal", &[s1]).boxed())
        .unwrap();
    let (safe, _) = rig
        .service
        .scheduler_mut()
        .schedule(&mut rig.bench, tracked("safe", &[s2]).ignoring_disable(true).boxed())
        .unwrap();

    rig.tick(RobotMode::Disabled, &[]);

    assert_eq!(rig.scheduler().state_of(normal), CommandState::Cancelled);
    assert!(rig.scheduler().is_running(safe));
    assert_eq!(rig.scheduler().owner_of(s1), None);
    assert_eq!(rig.scheduler().owner_of(s2), Some(safe));
    assert!(!rig.scheduler().is_enabled());
}

// ── Scheduling behaviour through the service ─────────────────

#[test]
fn default_is_running_the_tick_after_an_external_cancel() {
    let mut subsystems = SubsystemTable::new();
    let s1 = subsystems.register("s1").unwrap();
    subsystems
        .set_default(s1, move || tracked("idle", &[s1]).boxed())
        .unwrap();
    let scheduler = CommandScheduler::new(subsystems, BindingTable::new()).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    rig.tick(RobotMode::Teleop, &[]);
    let (job, _) = rig
        .service
        .scheduler_mut()
        .schedule(&mut rig.bench, tracked("job", &[s1]).boxed())
        .unwrap();
    assert_eq!(rig.scheduler().owner_of(s1), Some(job));

    assert!(rig.service.scheduler_mut().cancel(job, &mut rig.bench));
    assert_eq!(rig.scheduler().owner_of(s1), None);

    rig.tick(RobotMode::Teleop, &[]);
    assert_eq!(rig.scheduler().owner_of(s1), Some(CommandId::Default(s1)));
    assert_eq!(rig.bench.count("init:idle"), 2);
}

#[test]
fn interrupt_events_precede_the_newcomer_start() {
    let mut subsystems = SubsystemTable::new();
    let s1 = subsystems.register("s1").unwrap();
    let mut bindings = BindingTable::new();
    let x = bindings.on_true(Trigger::button(Button::X), move || tracked("cmd_x", &[s1]).boxed());
    let y = bindings.on_true(Trigger::button(Button::Y), move || tracked("cmd_y", &[s1]).boxed());
    let scheduler = CommandScheduler::new(subsystems, bindings).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    rig.tick(RobotMode::Teleop, &[Button::X]);
    rig.sink.clear();
    rig.tick(RobotMode::Teleop, &[Button::Y]);

    assert_eq!(
        rig.sink.command_events(),
        vec![
            SchedulerEvent::Interrupted {
                id: x,
                name: "cmd_x",
                by: Some(y),
            },
            SchedulerEvent::Started { id: y, name: "cmd_y" },
        ]
    );
}

#[test]
fn faulting_command_does_not_disturb_its_neighbours() {
    let mut subsystems = SubsystemTable::new();
    let s1 = subsystems.register("s1").unwrap();
    let s2 = subsystems.register("s2").unwrap();
    let mut bindings = BindingTable::new();
    let flaky = bindings.on_true(Trigger::button(Button::A), move || {
        let mut steps = 0;
        FunctionalCommand::run("flaky", &[s1], move |_: &mut Bench| {
            steps += 1;
            if steps >= 3 {
                Err(Error::Command("jammed"))
            } else {
                Ok(())
            }
        })
        .boxed()
    });
    let steady = bindings.on_true(Trigger::button(Button::A), move || tracked("steady", &[s2]).boxed());
    let scheduler = CommandScheduler::new(subsystems, bindings).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    for _ in 0..6 {
        rig.tick(RobotMode::Teleop, &[Button::A]);
    }

    assert_eq!(rig.scheduler().state_of(flaky), CommandState::Cancelled);
    assert_eq!(rig.scheduler().owner_of(s1), None);
    assert!(rig.scheduler().is_running(steady));
    assert_eq!(rig.service.tick_count(), 6);
    let faults: Vec<_> = rig
        .sink
        .command_events()
        .into_iter()
        .filter_map(|e| match e {
            SchedulerEvent::Faulted { id, reason, .. } => Some((id, reason)),
            _ => None,
        })
        .collect();
    assert_eq!(faults, vec![(flaky, FaultReason::Error(Error::Command("jammed")))]);
}

#[test]
fn inverted_trigger_held_from_the_first_tick_does_not_fire() {
    let mut subsystems = SubsystemTable::new();
    let s1 = subsystems.register("s1").unwrap();
    let s2 = subsystems.register("s2").unwrap();
    let mut bindings = BindingTable::new();
    let composite = bindings.on_false(!Trigger::button(Button::A), move || tracked("composite", &[s1]).boxed());
    let leaf = bindings.on_false(
        Trigger::new("not_a", |s| !s.controller.is_pressed(Button::A)),
        move || tracked("leaf", &[s2]).boxed(),
    );
    let scheduler = CommandScheduler::new(subsystems, bindings).unwrap();
    let mut rig = Rig::new(scheduler, NamedChooser::new());

    rig.tick(RobotMode::Teleop, &[Button::A]);
    assert!(!rig.scheduler().is_running(composite));
    assert!(!rig.scheduler().is_running(leaf));

    // Release then press again: both see the same falling edge.
    rig.tick(RobotMode::Teleop, &[]);
    rig.tick(RobotMode::Teleop, &[Button::A]);
    assert!(rig.scheduler().is_running(composite));
    assert!(rig.scheduler().is_running(leaf));
}
