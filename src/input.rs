//! Operator input model and the tick-start input latch.
//!
//! Input sources (gamepad polling, driver-station packets) run on their own
//! threads and may update at any time.  They publish into an
//! [`InputLatch`]; the tick driver samples the latch exactly once at the
//! start of every tick, so every trigger in that tick sees the same
//! [`Snapshot`].
//!
//! ```text
//! ┌──────────────┐ publish  ┌──────────────┐  sample (1x/tick) ┌────────────┐
//! │ Gamepad poll │────────▶ │  InputLatch  │ ────────────────▶ │ Tick loop  │
//! │ Mode source  │────────▶ │ (CS mutex)   │                   │ (triggers) │
//! └──────────────┘          └──────────────┘                   └────────────┘
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use serde::{Deserialize, Serialize};

use crate::mode::RobotMode;

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// Digital buttons of an Xbox-style controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Button {
    A = 1 << 0,
    B = 1 << 1,
    X = 1 << 2,
    Y = 1 << 3,
    LeftBumper = 1 << 4,
    RightBumper = 1 << 5,
    Back = 1 << 6,
    Start = 1 << 7,
    LeftStick = 1 << 8,
    RightStick = 1 << 9,
}

impl Button {
    pub const fn mask(self) -> u16 {
        self as u16
    }
}

/// Analog axes, each in `-1.0..=1.0` (triggers in `0.0..=1.0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Axis {
    LeftX = 0,
    LeftY = 1,
    RightX = 2,
    RightY = 3,
    LeftTrigger = 4,
    RightTrigger = 5,
}

impl Axis {
    pub const COUNT: usize = 6;
}

/// Directional-pad angles in degrees, clockwise from up.
pub mod pov {
    pub const UP: u16 = 0;
    pub const RIGHT: u16 = 90;
    pub const DOWN: u16 = 180;
    pub const LEFT: u16 = 270;
}

/// One sample of the whole controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControllerState {
    /// Bitmask of pressed [`Button`]s.
    pub buttons: u16,
    /// Directional pad angle, `None` when released.
    pub pov: Option<u16>,
    /// Indexed by `Axis as usize`.
    pub axes: [f32; Axis::COUNT],
}

impl ControllerState {
    /// Nothing pressed, sticks centred.
    pub const NEUTRAL: Self = Self {
        buttons: 0,
        pov: None,
        axes: [0.0; Axis::COUNT],
    };

    pub fn is_pressed(&self, button: Button) -> bool {
        self.buttons & button.mask() != 0
    }

    pub fn press(&mut self, button: Button) {
        self.buttons |= button.mask();
    }

    pub fn release(&mut self, button: Button) {
        self.buttons &= !button.mask();
    }

    pub fn with_button(mut self, button: Button) -> Self {
        self.press(button);
        self
    }

    pub fn with_pov(mut self, angle: Option<u16>) -> Self {
        self.pov = angle;
        self
    }

    pub fn axis(&self, axis: Axis) -> f32 {
        self.axes[axis as usize]
    }

    pub fn set_axis(&mut self, axis: Axis, value: f32) {
        self.axes[axis as usize] = value.clamp(-1.0, 1.0);
    }

    pub fn with_axis(mut self, axis: Axis, value: f32) -> Self {
        self.set_axis(axis, value);
        self
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Everything the tick samples from the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub mode: RobotMode,
    pub controller: ControllerState,
}

impl Snapshot {
    pub const DISABLED: Self = Self {
        mode: RobotMode::Disabled,
        controller: ControllerState::NEUTRAL,
    };

    pub fn new(mode: RobotMode, controller: ControllerState) -> Self {
        Self { mode, controller }
    }
}

/// Zero out `value` inside `±deadband` and rescale the rest to keep the
/// output continuous over the full `-1.0..=1.0` range.
pub fn apply_deadband(value: f32, deadband: f32) -> f32 {
    if value.abs() <= deadband {
        return 0.0;
    }
    let scaled = (value.abs() - deadband) / (1.0 - deadband);
    scaled.copysign(value)
}

// ---------------------------------------------------------------------------
// Latch
// ---------------------------------------------------------------------------

/// Cross-thread mailbox holding the most recent [`Snapshot`].
///
/// Later publishes overwrite earlier ones; the tick only ever sees the
/// newest complete sample.
pub struct InputLatch {
    inner: Mutex<CriticalSectionRawMutex, Cell<Snapshot>>,
}

impl InputLatch {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Snapshot::DISABLED)),
        }
    }

    /// Replace the whole snapshot.
    pub fn publish(&self, snapshot: Snapshot) {
        self.inner.lock(|cell| cell.set(snapshot));
    }

    /// Read-modify-write under the lock.
    pub fn update(&self, f: impl FnOnce(&mut Snapshot)) {
        self.inner.lock(|cell| {
            let mut snap = cell.get();
            f(&mut snap);
            cell.set(snap);
        });
    }

    /// Take the tick-start sample.
    pub fn sample(&self) -> Snapshot {
        self.inner.lock(Cell::get)
    }
}

impl Default for InputLatch {
    fn default() -> Self {
        Self::new()
    }
}
