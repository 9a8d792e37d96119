/// Gamepad input tracker using gilrs.
///
/// Button mapping comes from the `[gamepad]` table of config.toml.
/// Default mapping:
///   D-pad / Left Stick    →  Movement, menu cursor
///   A                     →  Confirm
///   B / Select            →  Cancel
///   Start                 →  Pause
///   Y                     →  Retry level
///
/// `connected` is sampled once per `update`. `was_connected` latches once
/// a pad has been seen, so an unplugged pad keeps reporting as lost until
/// it comes back, even on frames where nothing is listening.

#[cfg(feature = "gamepad")]
use gilrs::{Axis, Button, EventType, Gilrs};
use tracing::{info, warn};

use crate::config::GamepadConfig;
use crate::domain::entity::MoveDir;
use crate::ui::input::DeviceActions;

#[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
const STICK_DEADZONE: f32 = 0.25;

/// Logical button identifiers (one per physical button).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Btn {
    A,       // South
    B,       // East
    X,       // West
    Y,       // North
    L1,
    R1,
    Start,
    Select,
}

const BTN_COUNT: usize = 8;

impl Btn {
    fn from_name(s: &str) -> Option<Btn> {
        match s.to_uppercase().as_str() {
            "A" | "SOUTH" => Some(Btn::A),
            "B" | "EAST" => Some(Btn::B),
            "X" | "WEST" => Some(Btn::X),
            "Y" | "NORTH" => Some(Btn::Y),
            "L1" | "LB" => Some(Btn::L1),
            "R1" | "RB" => Some(Btn::R1),
            "START" => Some(Btn::Start),
            "SELECT" | "BACK" => Some(Btn::Select),
            _ => None,
        }
    }

    #[cfg(feature = "gamepad")]
    fn from_gilrs(btn: Button) -> Option<Btn> {
        match btn {
            Button::South => Some(Btn::A),
            Button::East => Some(Btn::B),
            Button::West => Some(Btn::X),
            Button::North => Some(Btn::Y),
            Button::LeftTrigger => Some(Btn::L1),
            Button::RightTrigger => Some(Btn::R1),
            Button::Start => Some(Btn::Start),
            Button::Select => Some(Btn::Select),
            _ => None,
        }
    }
}

/// Per-button state: held (continuous) and just_pressed (edge).
#[derive(Clone, Copy, Debug, Default)]
struct BtnState {
    held: bool,
    just_pressed: bool,
}

impl BtnState {
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn set(&mut self, held: bool) {
        if held && !self.held {
            self.just_pressed = true;
        }
        self.held = held;
    }
}

/// Action-to-button mapping.
#[derive(Debug, PartialEq)]
struct ActionMap {
    confirm: Vec<Btn>,
    cancel: Vec<Btn>,
    pause: Vec<Btn>,
    retry: Vec<Btn>,
}

impl Default for ActionMap {
    fn default() -> Self {
        ActionMap {
            confirm: vec![Btn::A],
            cancel: vec![Btn::B, Btn::Select],
            pause: vec![Btn::Start],
            retry: vec![Btn::Y],
        }
    }
}

impl ActionMap {
    /// Unknown names are skipped; an action whose list ends up empty keeps
    /// its default.
    fn from_config(cfg: &GamepadConfig) -> Self {
        fn parse_list(action: &str, names: &[String], fallback: Vec<Btn>) -> Vec<Btn> {
            let mut out = vec![];
            for name in names {
                match Btn::from_name(name) {
                    Some(b) => out.push(b),
                    None => warn!(action, button = %name, "unknown gamepad button"),
                }
            }
            if out.is_empty() { fallback } else { out }
        }
        let d = ActionMap::default();
        ActionMap {
            confirm: parse_list("confirm", &cfg.confirm, d.confirm),
            cancel: parse_list("cancel", &cfg.cancel, d.cancel),
            pause: parse_list("pause", &cfg.pause, d.pause),
            retry: parse_list("retry", &cfg.retry, d.retry),
        }
    }
}

pub struct GamepadState {
    #[cfg(feature = "gamepad")]
    gilrs: Option<Gilrs>,

    buttons: [BtnState; BTN_COUNT],

    dpad_up: BtnState,
    dpad_down: BtnState,
    dpad_left: BtnState,
    dpad_right: BtnState,

    stick_up: BtnState,
    stick_down: BtnState,
    stick_left: BtnState,
    stick_right: BtnState,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_x: f32,
    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    stick_y: f32,

    action_map: ActionMap,

    connected: bool,
    was_connected: bool,
}

impl GamepadState {
    pub fn new(cfg: &GamepadConfig) -> Self {
        #[cfg(feature = "gamepad")]
        let (gilrs, connected) = match Gilrs::new() {
            Ok(g) => {
                let has_pad = g.gamepads().next().is_some();
                (Some(g), has_pad)
            }
            Err(e) => {
                warn!(error = %e, "gamepad support unavailable");
                (None, false)
            }
        };
        #[cfg(not(feature = "gamepad"))]
        let connected = false;

        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs,
            connected,
            was_connected: connected,
            ..GamepadState::detached(ActionMap::from_config(cfg))
        }
    }

    /// A tracker with no backend and nothing connected.
    fn detached(action_map: ActionMap) -> Self {
        GamepadState {
            #[cfg(feature = "gamepad")]
            gilrs: None,
            buttons: [BtnState::default(); BTN_COUNT],
            dpad_up: BtnState::default(),
            dpad_down: BtnState::default(),
            dpad_left: BtnState::default(),
            dpad_right: BtnState::default(),
            stick_up: BtnState::default(),
            stick_down: BtnState::default(),
            stick_left: BtnState::default(),
            stick_right: BtnState::default(),
            stick_x: 0.0,
            stick_y: 0.0,
            action_map,
            connected: false,
            was_connected: false,
        }
    }

    pub fn connected(&self) -> bool { self.connected }
    pub fn was_connected(&self) -> bool { self.was_connected }

    /// Poll the backend. Call once per frame.
    pub fn update(&mut self) {
        let before = self.connected;
        self.clear_just_pressed();

        #[cfg(feature = "gamepad")]
        self.poll_gilrs();

        self.was_connected |= self.connected;
        if self.connected != before {
            info!(connected = self.connected, "gamepad connection changed");
        }
    }

    #[cfg(feature = "gamepad")]
    fn poll_gilrs(&mut self) {
        let gilrs = match &mut self.gilrs {
            Some(g) => g,
            None => return,
        };

        let events: Vec<_> = std::iter::from_fn(|| gilrs.next_event()).collect();

        for event in events {
            match event.event {
                EventType::ButtonPressed(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, true);
                }
                EventType::ButtonReleased(btn, _) => {
                    self.connected = true;
                    self.set_button(btn, false);
                }
                EventType::AxisChanged(axis, value, _) => {
                    self.connected = true;
                    match axis {
                        Axis::LeftStickX => self.stick_x = value,
                        Axis::LeftStickY => self.stick_y = value,
                        _ => {}
                    }
                }
                EventType::Connected => self.connected = true,
                EventType::Disconnected => self.disconnect(),
                _ => {}
            }
        }

        self.stick_left.set(self.stick_x < -STICK_DEADZONE);
        self.stick_right.set(self.stick_x > STICK_DEADZONE);
        self.stick_up.set(self.stick_y > STICK_DEADZONE);
        self.stick_down.set(self.stick_y < -STICK_DEADZONE);
    }

    #[cfg(feature = "gamepad")]
    fn set_button(&mut self, gilrs_btn: Button, held: bool) {
        match gilrs_btn {
            Button::DPadUp => self.dpad_up.set(held),
            Button::DPadDown => self.dpad_down.set(held),
            Button::DPadLeft => self.dpad_left.set(held),
            Button::DPadRight => self.dpad_right.set(held),
            other => {
                if let Some(btn) = Btn::from_gilrs(other) {
                    self.buttons[btn as usize].set(held);
                }
            }
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn disconnect(&mut self) {
        self.connected = false;
        self.release_all();
    }

    // ── Action queries ──

    fn any_just_pressed(&self, btns: &[Btn]) -> bool {
        btns.iter().any(|&b| self.buttons[b as usize].just_pressed)
    }

    pub fn actions(&self) -> DeviceActions {
        let up = self.dpad_up.held || self.stick_up.held;
        let down = self.dpad_down.held || self.stick_down.held;
        let left = self.dpad_left.held || self.stick_left.held;
        let right = self.dpad_right.held || self.stick_right.held;
        let movement = if left {
            Some(MoveDir::Left)
        } else if right {
            Some(MoveDir::Right)
        } else if up {
            Some(MoveDir::Up)
        } else if down {
            Some(MoveDir::Down)
        } else {
            None
        };

        DeviceActions {
            movement,
            menu_up: self.dpad_up.just_pressed || self.stick_up.just_pressed,
            menu_down: self.dpad_down.just_pressed || self.stick_down.just_pressed,
            confirm: self.any_just_pressed(&self.action_map.confirm),
            cancel: self.any_just_pressed(&self.action_map.cancel),
            pause: self.any_just_pressed(&self.action_map.pause),
            retry: self.any_just_pressed(&self.action_map.retry),
        }
    }

    // ── Internal ──

    fn clear_just_pressed(&mut self) {
        for b in &mut self.buttons {
            b.just_pressed = false;
        }
        for s in [
            &mut self.dpad_up, &mut self.dpad_down, &mut self.dpad_left, &mut self.dpad_right,
            &mut self.stick_up, &mut self.stick_down, &mut self.stick_left, &mut self.stick_right,
        ] {
            s.just_pressed = false;
        }
    }

    #[cfg_attr(not(feature = "gamepad"), allow(dead_code))]
    fn release_all(&mut self) {
        self.buttons = [BtnState::default(); BTN_COUNT];
        self.dpad_up = BtnState::default();
        self.dpad_down = BtnState::default();
        self.dpad_left = BtnState::default();
        self.dpad_right = BtnState::default();
        self.stick_up = BtnState::default();
        self.stick_down = BtnState::default();
        self.stick_left = BtnState::default();
        self.stick_right = BtnState::default();
        self.stick_x = 0.0;
        self.stick_y = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(confirm: &[&str]) -> GamepadConfig {
        GamepadConfig {
            confirm: confirm.iter().map(|s| s.to_string()).collect(),
            cancel: vec![],
            pause: vec!["start".into()],
            retry: vec!["North".into()],
        }
    }

    #[test]
    fn button_names_are_case_insensitive() {
        assert_eq!(Btn::from_name("a"), Some(Btn::A));
        assert_eq!(Btn::from_name("Back"), Some(Btn::Select));
        assert_eq!(Btn::from_name("rb"), Some(Btn::R1));
        assert_eq!(Btn::from_name("turbo"), None);
    }

    #[test]
    fn empty_or_unknown_lists_keep_defaults() {
        let map = ActionMap::from_config(&cfg(&["bogus"]));
        let d = ActionMap::default();
        assert_eq!(map.confirm, d.confirm);
        assert_eq!(map.cancel, d.cancel);
        assert_eq!(map.pause, vec![Btn::Start]);
        assert_eq!(map.retry, vec![Btn::Y]);

        let map = ActionMap::from_config(&cfg(&["X"]));
        assert_eq!(map.confirm, vec![Btn::X]);
    }

    #[test]
    fn presses_are_edges_and_held_dpad_moves() {
        let mut pad = GamepadState::detached(ActionMap::default());
        pad.buttons[Btn::Start as usize].set(true);
        pad.dpad_down.set(true);

        let a = pad.actions();
        assert!(a.pause && a.menu_down);
        assert_eq!(a.movement, Some(MoveDir::Down));

        pad.update();
        let a = pad.actions();
        assert!(!a.pause && !a.menu_down);
        assert_eq!(a.movement, Some(MoveDir::Down));
    }

    #[test]
    fn unplug_is_remembered_until_reconnect() {
        let mut pad = GamepadState::detached(ActionMap::default());
        pad.update();
        assert!(!pad.connected() && !pad.was_connected());

        pad.connected = true;
        pad.update();
        assert!(pad.connected() && pad.was_connected());

        pad.dpad_left.set(true);
        pad.disconnect();
        assert!(!pad.connected() && pad.was_connected());
        assert_eq!(pad.actions().movement, None);

        for _ in 0..30 {
            pad.update();
            assert!(!pad.connected() && pad.was_connected());
        }

        pad.connected = true;
        pad.update();
        assert!(pad.connected() && pad.was_connected());
    }

    #[test]
    fn start_pauses_but_does_not_confirm() {
        let mut pad = GamepadState::detached(ActionMap::default());
        pad.buttons[Btn::Start as usize].set(true);
        let a = pad.actions();
        assert!(a.pause && !a.confirm);

        pad.update();
        pad.buttons[Btn::A as usize].set(true);
        assert!(pad.actions().confirm);
    }
}
