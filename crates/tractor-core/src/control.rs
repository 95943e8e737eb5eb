//! Control state for the machine's controller.
//!
//! Pedal and brake are mutually exclusive: asserting one releases the other.
//! Every transition goes through the `with_*` methods, so no reachable
//! `ControlState` has both set.

use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operating mode of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlMode {
    /// Observation only; controls are not actionable.
    #[default]
    Dashboard,
    /// Pedal and brake may be driven by the user.
    Manual,
}

impl ControlMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Manual => "manual",
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dashboard" => Ok(Self::Dashboard),
            "manual" => Ok(Self::Manual),
            other => Err(CoreError::InvalidMode(other.to_string())),
        }
    }
}

/// Current {mode, pedal, brake} of the controller.
///
/// Serialized exactly as the `POST /api/control` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ControlState {
    pub mode: ControlMode,
    pub pedal: bool,
    pub brake: bool,
}

impl ControlState {
    /// Switch mode. Pedal and brake are left untouched.
    #[must_use]
    pub fn with_mode(self, mode: ControlMode) -> Self {
        Self { mode, ..self }
    }

    /// Press or release the pedal. Pressing releases the brake.
    #[must_use]
    pub fn with_pedal(self, pressed: bool) -> Self {
        Self {
            pedal: pressed,
            brake: if pressed { false } else { self.brake },
            ..self
        }
    }

    /// Press or release the brake. Pressing releases the pedal.
    #[must_use]
    pub fn with_brake(self, pressed: bool) -> Self {
        Self {
            brake: pressed,
            pedal: if pressed { false } else { self.pedal },
            ..self
        }
    }

    /// Whether the user may drive pedal/brake in this mode.
    pub fn controls_enabled(&self) -> bool {
        self.mode == ControlMode::Manual
    }

    pub fn is_consistent(&self) -> bool {
        !(self.pedal && self.brake)
    }

    /// Release both controls if an external source reported both pressed.
    #[must_use]
    pub fn normalized(self) -> Self {
        if self.is_consistent() {
            self
        } else {
            Self {
                pedal: false,
                brake: false,
                ..self
            }
        }
    }
}

impl fmt::Display for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "mode={} pedal={} brake={}",
            self.mode,
            if self.pedal { "on" } else { "off" },
            if self.brake { "on" } else { "off" }
        )
    }
}

/// A user action against the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlIntent {
    SwitchMode(ControlMode),
    Pedal(bool),
    Brake(bool),
}

impl ControlIntent {
    /// Next state after applying this intent to `state`.
    pub fn apply(self, state: ControlState) -> ControlState {
        match self {
            Self::SwitchMode(mode) => state.with_mode(mode),
            Self::Pedal(pressed) => state.with_pedal(pressed),
            Self::Brake(pressed) => state.with_brake(pressed),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::SwitchMode(_) => "mode",
            Self::Pedal(_) => "pedal",
            Self::Brake(_) => "brake",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn all_states() -> Vec<ControlState> {
        let mut states = Vec::new();
        for mode in [ControlMode::Dashboard, ControlMode::Manual] {
            for (pedal, brake) in [(false, false), (true, false), (false, true)] {
                states.push(ControlState { mode, pedal, brake });
            }
        }
        states
    }

    fn all_intents() -> Vec<ControlIntent> {
        vec![
            ControlIntent::SwitchMode(ControlMode::Dashboard),
            ControlIntent::SwitchMode(ControlMode::Manual),
            ControlIntent::Pedal(true),
            ControlIntent::Pedal(false),
            ControlIntent::Brake(true),
            ControlIntent::Brake(false),
        ]
    }

    #[test]
    fn test_default_state() {
        let state = ControlState::default();
        assert_eq!(state.mode, ControlMode::Dashboard);
        assert!(!state.pedal);
        assert!(!state.brake);
        assert!(!state.controls_enabled());
    }

    #[test]
    fn test_pedal_press_releases_brake() {
        let braking = ControlState::default()
            .with_mode(ControlMode::Manual)
            .with_brake(true);
        let next = braking.with_pedal(true);
        assert!(next.pedal);
        assert!(!next.brake);
    }

    #[test]
    fn test_brake_press_releases_pedal() {
        let accelerating = ControlState::default()
            .with_mode(ControlMode::Manual)
            .with_pedal(true);
        let next = accelerating.with_brake(true);
        assert!(next.brake);
        assert!(!next.pedal);
    }

    #[test]
    fn test_release_leaves_other_control() {
        let braking = ControlState::default().with_brake(true);
        let next = braking.with_pedal(false);
        assert!(!next.pedal);
        assert!(next.brake);

        let accelerating = ControlState::default().with_pedal(true);
        let next = accelerating.with_brake(false);
        assert!(next.pedal);
        assert!(!next.brake);
    }

    #[test]
    fn test_mode_switch_never_touches_controls() {
        for state in all_states() {
            for mode in [ControlMode::Dashboard, ControlMode::Manual] {
                let next = state.with_mode(mode);
                assert_eq!(next.mode, mode);
                assert_eq!(next.pedal, state.pedal);
                assert_eq!(next.brake, state.brake);
            }
        }
    }

    #[test]
    fn test_mutual_exclusion_holds_across_intent_sequences() {
        // Every sequence of up to three intents from every reachable start.
        let intents = all_intents();
        for start in all_states() {
            for a in &intents {
                for b in &intents {
                    for c in &intents {
                        let end = c.apply(b.apply(a.apply(start)));
                        assert!(end.is_consistent(), "{start} -> {a:?},{b:?},{c:?} = {end}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_normalized_releases_conflicting_controls() {
        let bad = ControlState {
            mode: ControlMode::Manual,
            pedal: true,
            brake: true,
        };
        let fixed = bad.normalized();
        assert_eq!(fixed.mode, ControlMode::Manual);
        assert!(!fixed.pedal && !fixed.brake);

        let good = ControlState::default().with_pedal(true);
        assert_eq!(good.normalized(), good);
    }

    #[test]
    fn test_wire_format() {
        let state = ControlState::default()
            .with_mode(ControlMode::Manual)
            .with_pedal(true);
        assert_eq!(
            serde_json::to_value(state).unwrap(),
            json!({"mode": "manual", "pedal": true, "brake": false})
        );

        let parsed: ControlState = serde_json::from_value(json!({
            "mode": "dashboard",
            "pedal": false,
            "brake": true,
            "timestamp": "2025-01-01T00:00:00"
        }))
        .unwrap();
        assert_eq!(parsed.mode, ControlMode::Dashboard);
        assert!(parsed.brake);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("Manual".parse::<ControlMode>().unwrap(), ControlMode::Manual);
        assert_eq!(
            " dashboard ".parse::<ControlMode>().unwrap(),
            ControlMode::Dashboard
        );
        assert!("auto".parse::<ControlMode>().is_err());
    }
}
