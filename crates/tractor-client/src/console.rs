//! Interactive console commands for `watch`.

use std::str::FromStr;
use tractor_core::{ControlIntent, ControlMode, ControlState};

pub const HELP: &str = "\
commands:
  manual | dashboard     switch control mode
  pedal on|off           press or release the pedal (manual mode)
  brake on|off           press or release the brake (manual mode)
  show                   print the current state
  export                 download the CSV export
  quit                   stop watching";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    Intent(ControlIntent),
    Show,
    Export,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Refuse pedal and brake while the controller is in dashboard mode.
    ///
    /// Mode switches are always allowed.
    pub fn check_allowed(&self, control: &ControlState) -> Result<(), String> {
        match self {
            Self::Intent(ControlIntent::Pedal(_) | ControlIntent::Brake(_))
                if !control.controls_enabled() =>
            {
                Err(format!(
                    "controls are disabled in {} mode, switch to manual first",
                    control.mode
                ))
            }
            _ => Ok(()),
        }
    }
}

impl FromStr for ConsoleCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim().to_ascii_lowercase();
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".to_string());
        };
        let arg = words.next();
        if words.next().is_some() {
            return Err(format!("too many arguments: {line}"));
        }

        let command = match (verb, arg) {
            ("manual" | "dashboard", None) => Self::Intent(ControlIntent::SwitchMode(parse_mode(verb)?)),
            ("mode", Some(mode)) => Self::Intent(ControlIntent::SwitchMode(parse_mode(mode)?)),
            ("pedal", Some(arg)) => Self::Intent(ControlIntent::Pedal(parse_switch(arg)?)),
            ("brake", Some(arg)) => Self::Intent(ControlIntent::Brake(parse_switch(arg)?)),
            ("show" | "state", None) => Self::Show,
            ("export", None) => Self::Export,
            ("help" | "?", None) => Self::Help,
            ("quit" | "exit" | "q", None) => Self::Quit,
            _ => return Err(format!("unknown command: {line}")),
        };
        Ok(command)
    }
}

fn parse_mode(word: &str) -> Result<ControlMode, String> {
    word.parse().map_err(|e: tractor_core::CoreError| e.to_string())
}

fn parse_switch(arg: &str) -> Result<bool, String> {
    match arg {
        "on" | "press" | "1" | "true" => Ok(true),
        "off" | "release" | "0" | "false" => Ok(false),
        other => Err(format!("expected on/off, got {other}")),
    }
}
