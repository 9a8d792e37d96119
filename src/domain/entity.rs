/// Entities and per-frame input shared by the simulation and the screens.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Facing {
    Left,
    Right,
}

/// Movement direction (continuous while key held)
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MoveDir {
    Left,
    Right,
    Up,
    Down,
}

impl MoveDir {
    pub fn delta(self) -> (i32, i32) {
        match self {
            MoveDir::Left => (-1, 0),
            MoveDir::Right => (1, 0),
            MoveDir::Up => (0, -1),
            MoveDir::Down => (0, 1),
        }
    }
}

/// One frame of input, merged from keyboard and gamepad.
///
/// Movement is continuous (held), every other action is edge-triggered
/// (fresh press this frame). The two gamepad flags let a screen notice a
/// controller being unplugged mid-run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputSnapshot {
    pub movement: Option<MoveDir>,
    pub menu_up: bool,
    pub menu_down: bool,
    pub confirm: bool,
    pub cancel: bool,
    pub pause: bool,
    pub retry: bool,
    pub gamepad_connected: bool,
    pub gamepad_was_connected: bool,
}

impl InputSnapshot {
    /// A gamepad was in use and has gone away. Keyboard-only players
    /// (no gamepad ever seen) never trip this.
    pub fn gamepad_disconnected(&self) -> bool {
        !self.gamepad_connected && self.gamepad_was_connected
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub x: usize,
    pub y: usize,
    pub facing: Facing,
    /// Seconds until the next step is allowed.
    pub move_cooldown: f32,
}

impl Player {
    pub fn new(x: usize, y: usize) -> Self {
        Player {
            x, y,
            facing: Facing::Right,
            move_cooldown: 0.0,
        }
    }
}
