//! Edge-detecting boolean triggers.
//!
//! A [`Trigger`] is a tree whose leaves are pure sampling functions over the
//! tick's [`Snapshot`].  Only leaves keep history: each stores its current
//! and previous sample.  Composite nodes (`&`, `|`, `!`) are recomputed
//! from their operands, and a composite's *previous* value is the same
//! expression evaluated over the leaves' previous samples.  Edges of any
//! tree therefore fall out of leaf history alone.
//!
//! Until every leaf has been sampled twice there is no previous value, and
//! the whole tree is classified as if it had been `false`.  `!a` with `a`
//! held on the first tick is therefore `Low`, exactly like a leaf sampling
//! `!a` directly.
//!
//! | previous | current | [`Edge`]   |
//! |----------|---------|------------|
//! | false    | true    | `Rising`   |
//! | true     | false   | `Falling`  |
//! | true     | true    | `High`     |
//! | false    | false   | `Low`      |

use core::fmt;
use core::ops::{BitAnd, BitOr, Not};

use crate::input::{Axis, Button, Snapshot, pov};
use crate::mode::RobotMode;

type Sampler = Box<dyn Fn(&Snapshot) -> bool>;

/// Edge/level classification of a trigger for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Rising,
    Falling,
    High,
    Low,
}

impl Edge {
    fn classify(previous: bool, current: bool) -> Self {
        match (previous, current) {
            (false, true) => Self::Rising,
            (true, false) => Self::Falling,
            (true, true) => Self::High,
            (false, false) => Self::Low,
        }
    }
}

/// What a leaf reads, for log lines.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Label {
    Named(&'static str),
    Pov(u16),
    AxisAbove(Axis, f32),
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => f.write_str(name),
            Self::Pov(angle) => write!(f, "pov({angle})"),
            Self::AxisAbove(axis, threshold) => write!(f, "{axis:?}>{threshold}"),
        }
    }
}

/// Leaf condition plus its two-sample history.  `None` means not sampled.
pub struct Leaf {
    label: Label,
    sampler: Sampler,
    current: Option<bool>,
    previous: Option<bool>,
}

/// A boolean condition over the input snapshot.
pub enum Trigger {
    Leaf(Leaf),
    And(Box<Trigger>, Box<Trigger>),
    Or(Box<Trigger>, Box<Trigger>),
    Not(Box<Trigger>),
}

impl Trigger {
    /// Leaf trigger from an arbitrary pure predicate.
    pub fn new(label: &'static str, sampler: impl Fn(&Snapshot) -> bool + 'static) -> Self {
        Self::labelled(Label::Named(label), sampler)
    }

    fn labelled(label: Label, sampler: impl Fn(&Snapshot) -> bool + 'static) -> Self {
        Self::Leaf(Leaf {
            label,
            sampler: Box::new(sampler),
            current: None,
            previous: None,
        })
    }

    pub fn button(button: Button) -> Self {
        Self::new(button_label(button), move |s| s.controller.is_pressed(button))
    }

    /// True while the directional pad reports exactly `angle`.
    pub fn pov(angle: u16) -> Self {
        Self::labelled(Label::Pov(angle), move |s| s.controller.pov == Some(angle))
    }

    pub fn pov_up() -> Self {
        Self::pov(pov::UP)
    }

    pub fn pov_down() -> Self {
        Self::pov(pov::DOWN)
    }

    pub fn pov_left() -> Self {
        Self::pov(pov::LEFT)
    }

    pub fn pov_right() -> Self {
        Self::pov(pov::RIGHT)
    }

    /// True while `axis` is strictly above `threshold`.
    pub fn axis_above(axis: Axis, threshold: f32) -> Self {
        Self::labelled(Label::AxisAbove(axis, threshold), move |s| {
            s.controller.axis(axis) > threshold
        })
    }

    /// True while the platform reports `mode`.
    pub fn mode(mode: RobotMode) -> Self {
        Self::new(mode.name(), move |s| s.mode == mode)
    }

    pub fn disabled() -> Self {
        Self::mode(RobotMode::Disabled)
    }

    /// Take this tick's sample.  Every leaf shifts current into previous,
    /// then samples afresh.  Call exactly once per tick.
    pub fn sample(&mut self, snapshot: &Snapshot) {
        match self {
            Self::Leaf(leaf) => {
                leaf.previous = leaf.current.replace((leaf.sampler)(snapshot));
            }
            Self::And(a, b) | Self::Or(a, b) => {
                a.sample(snapshot);
                b.sample(snapshot);
            }
            Self::Not(a) => a.sample(snapshot),
        }
    }

    /// Value as of the latest sample.
    pub fn current(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.current.unwrap_or(false),
            Self::And(a, b) => a.current() && b.current(),
            Self::Or(a, b) => a.current() || b.current(),
            Self::Not(a) => !a.current(),
        }
    }

    /// Value as of the sample before the latest one; `false` while any
    /// leaf lacks a previous sample.
    pub fn previous(&self) -> bool {
        self.prior().unwrap_or(false)
    }

    fn prior(&self) -> Option<bool> {
        match self {
            Self::Leaf(leaf) => leaf.previous,
            Self::And(a, b) => {
                let (a, b) = (a.prior()?, b.prior()?);
                Some(a && b)
            }
            Self::Or(a, b) => {
                let (a, b) = (a.prior()?, b.prior()?);
                Some(a || b)
            }
            Self::Not(a) => a.prior().map(|v| !v),
        }
    }

    pub fn edge(&self) -> Edge {
        Edge::classify(self.previous(), self.current())
    }
}

fn button_label(button: Button) -> &'static str {
    match button {
        Button::A => "a",
        Button::B => "b",
        Button::X => "x",
        Button::Y => "y",
        Button::LeftBumper => "left_bumper",
        Button::RightBumper => "right_bumper",
        Button::Back => "back",
        Button::Start => "start",
        Button::LeftStick => "left_stick",
        Button::RightStick => "right_stick",
    }
}

impl BitAnd for Trigger {
    type Output = Trigger;

    fn bitand(self, rhs: Trigger) -> Trigger {
        Trigger::And(Box::new(self), Box::new(rhs))
    }
}

impl BitOr for Trigger {
    type Output = Trigger;

    fn bitor(self, rhs: Trigger) -> Trigger {
        Trigger::Or(Box::new(self), Box::new(rhs))
    }
}

impl Not for Trigger {
    type Output = Trigger;

    fn not(self) -> Trigger {
        Trigger::Not(Box::new(self))
    }
}

impl fmt::Debug for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Leaf(leaf) => write!(f, "{}", leaf.label),
            Self::And(a, b) => write!(f, "({a:?} & {b:?})"),
            Self::Or(a, b) => write!(f, "({a:?} | {b:?})"),
            Self::Not(a) => write!(f, "!{a:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::ControllerState;

    fn teleop(controller: ControllerState) -> Snapshot {
        Snapshot::new(RobotMode::Teleop, controller)
    }

    fn pressed(buttons: &[Button]) -> Snapshot {
        let mut c = ControllerState::NEUTRAL;
        for b in buttons {
            c.press(*b);
        }
        teleop(c)
    }

    #[test]
    fn leaf_edges_follow_samples() {
        let mut t = Trigger::button(Button::A);
        t.sample(&pressed(&[]));
        assert_eq!(t.edge(), Edge::Low);
        t.sample(&pressed(&[Button::A]));
        assert_eq!(t.edge(), Edge::Rising);
        t.sample(&pressed(&[Button::A]));
        assert_eq!(t.edge(), Edge::High);
        t.sample(&pressed(&[]));
        assert_eq!(t.edge(), Edge::Falling);
    }

    #[test]
    fn first_sample_while_held_is_rising() {
        let mut t = Trigger::button(Button::B);
        t.sample(&pressed(&[Button::B]));
        assert_eq!(t.edge(), Edge::Rising);
    }

    #[test]
    fn chord_rises_only_when_both_held() {
        let mut chord = Trigger::button(Button::Back) & Trigger::button(Button::Start);
        chord.sample(&pressed(&[Button::Back]));
        assert_eq!(chord.edge(), Edge::Low);
        chord.sample(&pressed(&[Button::Back, Button::Start]));
        assert_eq!(chord.edge(), Edge::Rising);
        chord.sample(&pressed(&[Button::Start]));
        assert_eq!(chord.edge(), Edge::Falling);
    }

    #[test]
    fn composite_edges_derive_from_leaf_history() {
        // Switching which operand holds an OR true is not an edge.
        let mut either = Trigger::button(Button::X) | Trigger::button(Button::Y);
        either.sample(&pressed(&[Button::X]));
        assert_eq!(either.edge(), Edge::Rising);
        either.sample(&pressed(&[Button::Y]));
        assert_eq!(either.edge(), Edge::High);
    }

    #[test]
    fn not_inverts_both_samples() {
        let mut released = !Trigger::button(Button::A);
        released.sample(&pressed(&[Button::A]));
        assert!(!released.current());
        assert_eq!(released.edge(), Edge::Low);
        released.sample(&pressed(&[]));
        assert_eq!(released.edge(), Edge::Rising);
        released.sample(&pressed(&[Button::A]));
        assert_eq!(released.edge(), Edge::Falling);
    }

    #[test]
    fn composites_classify_like_an_equivalent_leaf() {
        let script: [&[Button]; 6] = [
            &[Button::A],
            &[Button::A],
            &[],
            &[Button::A, Button::B],
            &[Button::B],
            &[],
        ];
        let mut not_a = !Trigger::button(Button::A);
        let mut not_a_leaf = Trigger::new("not_a", |s| !s.controller.is_pressed(Button::A));
        let mut b_not_a = Trigger::button(Button::B) & !Trigger::button(Button::A);
        let mut b_not_a_leaf = Trigger::new("b_not_a", |s| {
            s.controller.is_pressed(Button::B) && !s.controller.is_pressed(Button::A)
        });

        for buttons in script {
            let snap = pressed(buttons);
            for t in [&mut not_a, &mut not_a_leaf, &mut b_not_a, &mut b_not_a_leaf] {
                t.sample(&snap);
            }
            assert_eq!(not_a.edge(), not_a_leaf.edge(), "{buttons:?}");
            assert_eq!(b_not_a.edge(), b_not_a_leaf.edge(), "{buttons:?}");
        }
    }

    #[test]
    fn pov_matches_exact_angle() {
        let mut up = Trigger::pov_up();
        up.sample(&teleop(ControllerState::NEUTRAL.with_pov(Some(pov::UP))));
        assert!(up.current());
        up.sample(&teleop(ControllerState::NEUTRAL.with_pov(Some(45))));
        assert!(!up.current());
    }

    #[test]
    fn mode_trigger_reads_snapshot_mode() {
        let mut t = Trigger::disabled();
        t.sample(&Snapshot::DISABLED);
        assert_eq!(t.edge(), Edge::Rising);
        t.sample(&teleop(ControllerState::NEUTRAL));
        assert_eq!(t.edge(), Edge::Falling);
    }

    #[test]
    fn debug_renders_tree() {
        let t = (Trigger::button(Button::Start) & Trigger::pov_up()) | !Trigger::button(Button::A);
        assert_eq!(format!("{t:?}"), "((start & pov(0)) | !a)");
    }

    #[test]
    fn leaf_labels_name_angle_and_axis() {
        let left = Trigger::button(Button::Start) & Trigger::pov(pov::LEFT);
        let down = Trigger::button(Button::Start) & Trigger::pov(pov::DOWN);
        assert_eq!(format!("{left:?}"), "(start & pov(270))");
        assert_eq!(format!("{down:?}"), "(start & pov(180))");
        let throttle = Trigger::axis_above(Axis::RightTrigger, 0.5);
        assert_eq!(format!("{throttle:?}"), "RightTrigger>0.5");
    }
}
