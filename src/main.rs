//! robocmd: simulated robot controller entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  operator thread ──publish──▶ InputLatch (static)            │
//! │                                   │ sample once per tick     │
//! │                                   ▼                          │
//! │  tick loop ──▶ Robot<SimPlatform> ──▶ LogEventSink           │
//! │  (fixed period; overrun → next tick starts immediately)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `robocmd [config.json]`.  Log level via `RUST_LOG`.
#![deny(unused_must_use)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};

use robocmd::adapters::log_sink::LogEventSink;
use robocmd::adapters::sim::SimPlatform;
use robocmd::config::ControllerConfig;
use robocmd::input::{Axis, Button, ControllerState, InputLatch, Snapshot, pov};
use robocmd::mode::RobotMode;
use robocmd::robot::Robot;

/// Written by the operator thread, sampled by the tick loop.
static LATCH: InputLatch = InputLatch::new();

/// Set by the operator thread when its script is exhausted.
static SCRIPT_DONE: AtomicBool = AtomicBool::new(false);

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("robocmd v{}", env!("CARGO_PKG_VERSION"));

    // ── 1. Configuration ──────────────────────────────────────
    let config = load_config(std::env::args().nth(1))?;
    config
        .validate()
        .map_err(anyhow::Error::new)
        .context("invalid configuration")?;

    // ── 2. Robot on the simulated platform ────────────────────
    let hw = SimPlatform::hardware(&config);
    let mut robot = Robot::<SimPlatform>::new(&config, hw)
        .map_err(anyhow::Error::new)
        .context("robot setup failed")?;
    let mut sink = LogEventSink::new();
    robot.start(&mut sink);

    // ── 3. Operator input ─────────────────────────────────────
    let operator = thread::Builder::new()
        .name("operator".into())
        .spawn(run_operator_script)
        .context("failed to spawn operator thread")?;

    // ── 4. Tick loop ──────────────────────────────────────────
    let period = Duration::from_millis(u64::from(config.tick_period_ms));
    let mut deadline = Instant::now() + period;
    let mut overruns: u64 = 0;

    info!("Entering tick loop ({} ms period)", config.tick_period_ms);
    while !SCRIPT_DONE.load(Ordering::Acquire) {
        let started = Instant::now();
        let snapshot = LATCH.sample();
        robot.tick(&snapshot, &mut sink);

        let now = Instant::now();
        if now > deadline {
            overruns += 1;
            warn!(
                "Tick overrun: {:?} (period {:?})",
                now.duration_since(started),
                period
            );
            deadline = now;
        } else {
            thread::sleep(deadline - now);
        }
        deadline += period;
    }

    if operator.join().is_err() {
        warn!("Operator thread panicked");
    }
    info!(
        "Script finished after {} ticks ({} overruns)",
        robot.service().tick_count(),
        overruns
    );
    Ok(())
}

fn load_config(path: Option<String>) -> Result<ControllerConfig> {
    let Some(path) = path else {
        info!("No config file given, using defaults");
        return Ok(ControllerConfig::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let config: ControllerConfig =
                serde_json::from_str(&text).with_context(|| format!("parsing {path}"))?;
            info!("Config loaded from {}", path);
            Ok(config)
        }
        Err(e) => {
            warn!("Config {} unreadable ({}), using defaults", path, e);
            Ok(ControllerConfig::default())
        }
    }
}

/// Drive the latch through a short match: disabled, autonomous, teleop
/// with a few button sequences, test, disabled.
fn run_operator_script() {
    let neutral = ControllerState::NEUTRAL;
    let script: [(RobotMode, ControllerState, u64); 12] = [
        (RobotMode::Disabled, neutral, 500),
        (RobotMode::Autonomous, neutral, 2_500),
        (RobotMode::Teleop, neutral.with_axis(Axis::LeftY, -0.6), 500),
        (RobotMode::Teleop, neutral.with_button(Button::X), 400),
        (RobotMode::Teleop, neutral.with_button(Button::B), 100),
        (RobotMode::Teleop, neutral, 1_200),
        (RobotMode::Teleop, neutral.with_pov(Some(pov::LEFT)), 100),
        (RobotMode::Teleop, neutral, 1_500),
        (
            RobotMode::Teleop,
            neutral.with_button(Button::Start).with_pov(Some(pov::UP)),
            300,
        ),
        (RobotMode::Teleop, neutral.with_button(Button::Back).with_button(Button::B), 300),
        (RobotMode::Test, neutral, 300),
        (RobotMode::Disabled, neutral, 300),
    ];

    for (mode, controller, hold_ms) in script {
        LATCH.publish(Snapshot::new(mode, controller));
        thread::sleep(Duration::from_millis(hold_ms));
    }
    SCRIPT_DONE.store(true, Ordering::Release);
}
