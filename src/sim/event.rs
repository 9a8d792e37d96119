/// Events emitted during a simulation step.

/// Progression signal returned by `Level::update`.
///
/// Edge-triggered: a level reports `JustCompleted` on exactly one tick and
/// `None` on every tick after, so the caller never has to clear a flag.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LevelEvent {
    #[default]
    None,
    JustCompleted,
}

/// Cues for the presentation layer (sound) collected during a frame.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum GameEvent {
    GemCollected { x: usize, y: usize },
    LevelCleared,
    RunComplete,
}
