/// Keyboard tracker and per-frame input assembly.
///
/// Tracks which keys are currently held down, enabling:
///   - Continuous movement while a key is held
///   - Edge-triggered menu and screen actions (only fire on initial press)
///
/// Uses crossterm's keyboard enhancement for Release events when available.
/// Falls back to timeout-based release detection on terminals that don't support it.
///
/// Keyboard and gamepad each produce a `DeviceActions`; `snapshot` merges
/// them into the `InputSnapshot` the screens see.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use crossterm::event::{self, poll, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::domain::entity::{InputSnapshot, MoveDir};

/// After this duration without a Press/Repeat event, consider the key released.
/// Only used when the terminal doesn't report Release events.
const HOLD_TIMEOUT: Duration = Duration::from_millis(160);

// ── Key bindings ──

const KEYS_LEFT: &[KeyCode] = &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')];
const KEYS_RIGHT: &[KeyCode] = &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')];
const KEYS_UP: &[KeyCode] = &[KeyCode::Up, KeyCode::Char('w'), KeyCode::Char('W')];
const KEYS_DOWN: &[KeyCode] = &[KeyCode::Down, KeyCode::Char('s'), KeyCode::Char('S')];
const KEYS_CONFIRM: &[KeyCode] = &[KeyCode::Enter, KeyCode::Char(' ')];
const KEYS_CANCEL: &[KeyCode] = &[KeyCode::Esc];
const KEYS_PAUSE: &[KeyCode] = &[KeyCode::Char('p'), KeyCode::Char('P')];
const KEYS_RETRY: &[KeyCode] = &[KeyCode::Char('r'), KeyCode::Char('R')];

/// What one device asked for this frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DeviceActions {
    pub movement: Option<MoveDir>,
    pub menu_up: bool,
    pub menu_down: bool,
    pub confirm: bool,
    pub cancel: bool,
    pub pause: bool,
    pub retry: bool,
}

/// Merge keyboard and gamepad. Keyboard movement wins when both steer.
pub fn snapshot(
    keys: DeviceActions,
    pad: DeviceActions,
    gamepad_connected: bool,
    gamepad_was_connected: bool,
) -> InputSnapshot {
    InputSnapshot {
        movement: keys.movement.or(pad.movement),
        menu_up: keys.menu_up || pad.menu_up,
        menu_down: keys.menu_down || pad.menu_down,
        confirm: keys.confirm || pad.confirm,
        cancel: keys.cancel || pad.cancel,
        pause: keys.pause || pad.pause,
        retry: keys.retry || pad.retry,
        gamepad_connected,
        gamepad_was_connected,
    }
}

pub struct InputState {
    /// Timestamp of last Press/Repeat event for each key.
    last_active: HashMap<KeyCode, Instant>,

    /// Keys that transitioned from "not held" → "held" during the
    /// most recent drain_events() call.
    fresh_presses: Vec<KeyCode>,

    /// Raw key events collected during drain, for meta-key handling.
    raw_events: Vec<KeyEvent>,

    /// Whether to honor Release events. Only true when keyboard
    /// enhancement is confirmed working.
    pub honor_release: bool,
}

impl InputState {
    pub fn new() -> Self {
        InputState {
            last_active: HashMap::with_capacity(16),
            fresh_presses: Vec::with_capacity(8),
            raw_events: Vec::with_capacity(8),
            honor_release: false,
        }
    }

    /// Drain all pending terminal events and update key states.
    /// Call this once per frame, before the screens see input.
    pub fn drain_events(&mut self) {
        self.fresh_presses.clear();
        self.raw_events.clear();

        // Read all available events without blocking
        while poll(Duration::ZERO).unwrap_or(false) {
            if let Ok(Event::Key(key)) = event::read() {
                self.record(key, Instant::now());
            }
        }

        // Expire keys that have timed out (fallback for terminals without Release)
        let now = Instant::now();
        self.last_active.retain(|_, t| now.duration_since(*t) < HOLD_TIMEOUT);
    }

    fn record(&mut self, key: KeyEvent, now: Instant) {
        self.raw_events.push(key);
        match key.kind {
            KeyEventKind::Release if self.honor_release => {
                self.last_active.remove(&key.code);
            }
            // Without enhancement, releases are inferred from the timeout.
            KeyEventKind::Release => {}
            _ => {
                let was_held = self.is_held(key.code);
                self.last_active.insert(key.code, now);
                if !was_held {
                    self.fresh_presses.push(key.code);
                }
            }
        }
    }

    /// Is this key currently held down?
    pub fn is_held(&self, code: KeyCode) -> bool {
        self.last_active
            .get(&code)
            .map(|t| t.elapsed() < HOLD_TIMEOUT)
            .unwrap_or(false)
    }

    pub fn any_held(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.is_held(*c))
    }

    /// Was this key freshly pressed this frame? (edge trigger)
    pub fn was_pressed(&self, code: KeyCode) -> bool {
        self.fresh_presses.contains(&code)
    }

    pub fn any_pressed(&self, codes: &[KeyCode]) -> bool {
        codes.iter().any(|c| self.was_pressed(*c))
    }

    pub fn ctrl_c_pressed(&self) -> bool {
        self.raw_events.iter().any(|k| {
            k.modifiers.contains(KeyModifiers::CONTROL)
                && (k.code == KeyCode::Char('c') || k.code == KeyCode::Char('C'))
        })
    }

    pub fn actions(&self) -> DeviceActions {
        let movement = if self.any_held(KEYS_LEFT) {
            Some(MoveDir::Left)
        } else if self.any_held(KEYS_RIGHT) {
            Some(MoveDir::Right)
        } else if self.any_held(KEYS_UP) {
            Some(MoveDir::Up)
        } else if self.any_held(KEYS_DOWN) {
            Some(MoveDir::Down)
        } else {
            None
        };

        DeviceActions {
            movement,
            menu_up: self.any_pressed(KEYS_UP),
            menu_down: self.any_pressed(KEYS_DOWN),
            confirm: self.any_pressed(KEYS_CONFIRM),
            cancel: self.any_pressed(KEYS_CANCEL),
            pause: self.any_pressed(KEYS_PAUSE),
            retry: self.any_pressed(KEYS_RETRY),
        }
    }
}
