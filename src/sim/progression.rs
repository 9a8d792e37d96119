/// Level progression and score presentation.
///
/// `ProgressionController` owns the live level, decides when to move on
/// to the next one or end the run, carries the score across level
/// boundaries and animates the displayed score toward the level's true
/// score.
///
/// ## Lifecycle
///   `on_load` → level 0 is built, `level_index` becomes 1.
///   Each level-up disposes the finished level and builds the next one,
///   seeded with the finished level's score truncated to whole points.
///   Reaching `max_level_index` ends the run: the last level is disposed
///   and a transition back to the title flow is requested.
///
/// ## Frame order
///   `update` ticks the level, checks its `LevelEvent`, replaces the level
///   on `JustCompleted`, then animates the score. `draw` only renders.
///   Nothing animates while the screen is inactive.
///
/// ## Preconditions
///   `update`, `handle_input` and `draw` before `on_load` are programmer
///   errors: they trip a `debug_assert!` in debug builds and are no-ops in
///   release builds.

use crossterm::style::Color;
use tracing::{debug, info};

use crate::domain::entity::InputSnapshot;
use crate::error::GameResult;
use crate::sim::event::{GameEvent, LevelEvent};
use crate::sim::level::{Level, LevelFactory};
use crate::ui::screen::{Flow, ScreenKind, ScreenRequest};
use crate::ui::surface::Surface;

/// Default last level index of a run (two indices, 0 and 1).
pub const MAX_LEVEL_INDEX: usize = 1;

/// Displayed score catches up with the true score at this many points per second.
pub const SCORE_RAMP_PER_SECOND: f32 = 500.0;

#[derive(Clone, Copy, PartialEq, Debug)]
pub enum RunState {
    NotLoaded,
    Running,
    RunComplete { final_score: f32 },
}

/// Where the next level's starting score comes from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Carry {
    /// Normal advance: whatever the outgoing level scored.
    FromCurrentLevel,
    /// Reload: the baseline the outgoing level was itself seeded with.
    Baseline,
}

/// Whole points handed to the next level. Fractions are dropped, not rounded.
pub fn truncate_score(score: f32) -> u32 {
    score as u32
}

/// Readout of the animated score, rounded to the nearest point.
pub fn display_score(score: f32) -> u32 {
    score.round() as u32
}

pub struct ProgressionController<F: LevelFactory> {
    factory: F,
    max_level_index: usize,
    /// Index the next advance will build.
    level_index: usize,
    current_level: Option<F::Level>,
    carried_score: f32,
    displayed_score: f32,
    state: RunState,
    requests: Vec<ScreenRequest>,
    events: Vec<GameEvent>,
}

impl<F: LevelFactory> ProgressionController<F> {
    pub fn new(factory: F, max_level_index: usize) -> Self {
        ProgressionController {
            factory,
            max_level_index,
            level_index: 0,
            current_level: None,
            carried_score: 0.0,
            displayed_score: 0.0,
            state: RunState::NotLoaded,
            requests: vec![],
            events: vec![],
        }
    }

    // ── Queries ──

    pub fn level_index(&self) -> usize { self.level_index }
    pub fn max_level_index(&self) -> usize { self.max_level_index }
    pub fn carried_score(&self) -> f32 { self.carried_score }
    pub fn displayed_score(&self) -> f32 { self.displayed_score }
    pub fn state(&self) -> RunState { self.state }
    pub fn current_level(&self) -> Option<&F::Level> { self.current_level.as_ref() }

    pub fn is_running(&self) -> bool {
        self.state == RunState::Running
    }

    /// Screen-stack requests raised since the last call.
    pub fn drain_requests(&mut self) -> Vec<ScreenRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Sound cues raised since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ── Lifecycle ──

    pub fn on_load(&mut self) -> GameResult<()> {
        self.level_index = 0;
        self.carried_score = 0.0;
        self.displayed_score = 0.0;
        self.state = RunState::Running;
        self.advance(Carry::FromCurrentLevel)
    }

    /// Rebuild the level at the current index from the score it started
    /// with. Offered to retry flows; nothing inside the controller calls it.
    pub fn reload_current_level(&mut self) -> GameResult<()> {
        if !self.is_running() || self.level_index == 0 {
            return Ok(());
        }
        info!(level = self.level_index - 1, baseline = self.carried_score, "reloading level");
        self.level_index -= 1;
        self.advance(Carry::Baseline)
    }

    fn advance(&mut self, carry: Carry) -> GameResult<()> {
        if !self.is_running() {
            return Ok(());
        }

        if self.level_index == self.max_level_index {
            if let Some(level) = self.current_level.take() {
                self.carried_score = level.true_score();
                level.dispose();
            }
            let final_score = self.carried_score;
            self.state = RunState::RunComplete { final_score };
            self.requests.push(ScreenRequest::Transition(Flow::Title {
                final_score: Some(truncate_score(final_score)),
            }));
            self.events.push(GameEvent::RunComplete);
            info!(final_score, levels = self.level_index, "run complete");
            return Ok(());
        }

        // Dispose before constructing: never two live levels.
        let outgoing = self.current_level.take();
        self.carried_score = match (carry, outgoing) {
            (Carry::FromCurrentLevel, Some(level)) => {
                let score = level.true_score();
                level.dispose();
                score
            }
            (Carry::FromCurrentLevel, None) => 0.0,
            (Carry::Baseline, Some(level)) => {
                level.dispose();
                self.carried_score
            }
            (Carry::Baseline, None) => self.carried_score,
        };

        let level = self
            .factory
            .create_level(self.level_index, truncate_score(self.carried_score))?;
        self.current_level = Some(level);
        self.displayed_score = 0.0;
        debug!(level = self.level_index, carried = self.carried_score, "level started");
        self.level_index += 1;
        Ok(())
    }

    // ── Per-frame hooks ──

    pub fn update(&mut self, dt: f32, is_active: bool) -> GameResult<()> {
        if !is_active {
            return Ok(());
        }
        debug_assert!(self.state != RunState::NotLoaded, "update called before on_load");

        let level = match (self.state, self.current_level.as_mut()) {
            (RunState::Running, Some(level)) => level,
            _ => return Ok(()),
        };

        let event = level.update(dt);
        self.events.extend(level.drain_events());

        let leveled_up = event == LevelEvent::JustCompleted;
        if leveled_up {
            self.advance(Carry::FromCurrentLevel)?;
            if self.is_running() {
                self.requests.push(ScreenRequest::Overlay(ScreenKind::LevelUp));
            }
        }

        self.animate_score(dt, leveled_up);
        Ok(())
    }

    /// Snap on a level-up frame, otherwise ramp at `SCORE_RAMP_PER_SECOND`,
    /// never past the true score.
    fn animate_score(&mut self, dt: f32, snap: bool) {
        let target = match &self.current_level {
            Some(level) => level.true_score(),
            None => return,
        };
        self.displayed_score = if snap {
            target
        } else {
            (self.displayed_score + SCORE_RAMP_PER_SECOND * dt).min(target)
        };
    }

    pub fn handle_input(&mut self, input: &InputSnapshot) {
        debug_assert!(self.state != RunState::NotLoaded, "handle_input called before on_load");
        if !self.is_running() {
            return;
        }
        if let Some(level) = self.current_level.as_mut() {
            level.handle_input(input);
        }
    }

    pub fn draw(&self, surface: &mut Surface) {
        debug_assert!(self.state != RunState::NotLoaded, "draw called before on_load");
        let shown = match (self.state, &self.current_level) {
            (RunState::Running, Some(level)) => {
                level.render(surface);
                display_score(self.displayed_score)
            }
            // The last level is gone; the tally stays up while the screen fades out.
            (RunState::RunComplete { final_score }, _) => truncate_score(final_score),
            _ => return,
        };

        let row = surface.height().saturating_sub(2);
        let text = format!(
            "Level {}/{}    Score {:09}",
            self.level_index, self.max_level_index, shown,
        );
        surface.put_centered(row, &text, Color::Yellow, Color::Reset);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::error::GameError;

    /// Knobs and counters shared between a test and the fake levels it spawns.
    #[derive(Default)]
    struct Script {
        /// Added to the live level's score on each update.
        gain: f32,
        /// Report `JustCompleted` on the next update (one-shot).
        complete_next: bool,
        created: Vec<(usize, u32)>,
        live: usize,
        disposed: usize,
        updates: usize,
        inputs: usize,
    }

    struct FakeLevel {
        score: f32,
        script: Rc<RefCell<Script>>,
    }

    impl Level for FakeLevel {
        fn update(&mut self, _dt: f32) -> LevelEvent {
            let mut s = self.script.borrow_mut();
            s.updates += 1;
            self.score += s.gain;
            if std::mem::take(&mut s.complete_next) {
                LevelEvent::JustCompleted
            } else {
                LevelEvent::None
            }
        }

        fn handle_input(&mut self, _input: &InputSnapshot) {
            self.script.borrow_mut().inputs += 1;
        }

        fn render(&self, surface: &mut Surface) {
            surface.put_str(0, 0, "level", Color::White, Color::Reset);
        }

        fn true_score(&self) -> f32 {
            self.score
        }

        fn dispose(self) {
            let mut s = self.script.borrow_mut();
            s.live -= 1;
            s.disposed += 1;
        }

        fn drain_events(&mut self) -> Vec<GameEvent> {
            vec![GameEvent::GemCollected { x: 0, y: 0 }]
        }
    }

    struct FakeFactory {
        script: Rc<RefCell<Script>>,
    }

    impl LevelFactory for FakeFactory {
        type Level = FakeLevel;

        fn create_level(&mut self, index: usize, starting_score: u32) -> GameResult<FakeLevel> {
            let mut s = self.script.borrow_mut();
            assert_eq!(s.live, 0, "previous level still live");
            if index > 10 {
                return Err(GameError::LevelOutOfRange { index, available: 10 });
            }
            s.live += 1;
            s.created.push((index, starting_score));
            Ok(FakeLevel { score: starting_score as f32, script: Rc::clone(&self.script) })
        }
    }

    fn controller(max: usize) -> (ProgressionController<FakeFactory>, Rc<RefCell<Script>>) {
        let script = Rc::new(RefCell::new(Script::default()));
        let factory = FakeFactory { script: Rc::clone(&script) };
        (ProgressionController::new(factory, max), script)
    }

    fn loaded(max: usize) -> (ProgressionController<FakeFactory>, Rc<RefCell<Script>>) {
        let (mut c, script) = controller(max);
        c.on_load().unwrap();
        (c, script)
    }

    /// Next update adds `gain` to the live level and completes it.
    fn finish_level(c: &mut ProgressionController<FakeFactory>, script: &Rc<RefCell<Script>>, gain: f32) {
        {
            let mut s = script.borrow_mut();
            s.gain = gain;
            s.complete_next = true;
        }
        c.update(0.016, true).unwrap();
        script.borrow_mut().gain = 0.0;
    }

    fn true_score(c: &ProgressionController<FakeFactory>) -> f32 {
        c.current_level().map(|l| l.true_score()).unwrap_or(f32::NAN)
    }

    #[test]
    fn load_builds_first_level() {
        let (c, script) = loaded(MAX_LEVEL_INDEX);
        assert_eq!(c.state(), RunState::Running);
        assert_eq!(c.level_index(), 1);
        assert_eq!(c.carried_score(), 0.0);
        assert_eq!(c.displayed_score(), 0.0);
        assert_eq!(script.borrow().created, vec![(0, 0)]);
        assert_eq!(script.borrow().live, 1);
    }

    #[test]
    fn displayed_score_never_overshoots() {
        let (mut c, script) = loaded(5);
        for (i, dt) in [0.0, 0.016, 0.5, 3.0, 0.001, 10.0, 0.25].iter().enumerate() {
            script.borrow_mut().gain = 37.0 * i as f32;
            c.update(*dt, true).unwrap();
            assert!(c.displayed_score() <= true_score(&c));
        }
    }

    #[test]
    fn score_converges_at_ramp_rate_and_holds() {
        let (mut c, script) = loaded(5);
        script.borrow_mut().gain = 1000.0;
        c.update(0.1, true).unwrap();
        script.borrow_mut().gain = 0.0;
        assert_eq!(true_score(&c), 1000.0);

        let mut frames = 1;
        while c.displayed_score() < 1000.0 && frames < 100 {
            c.update(0.1, true).unwrap();
            frames += 1;
        }
        // 1000 / 500 = 2.0 s = 20 frames of 0.1, one frame of slack for clamping
        assert!(frames <= 21, "took {frames} frames");
        assert_eq!(c.displayed_score(), 1000.0);

        for _ in 0..10 {
            c.update(0.1, true).unwrap();
            assert_eq!(c.displayed_score(), 1000.0);
        }
    }

    #[test]
    fn level_up_snaps_displayed_score() {
        let (mut c, script) = loaded(3);
        finish_level(&mut c, &script, 4200.0);

        assert_eq!(c.level_index(), 2);
        assert_eq!(c.displayed_score(), true_score(&c));
        assert_eq!(c.displayed_score(), 4200.0);
        assert_eq!(c.drain_requests(), vec![ScreenRequest::Overlay(ScreenKind::LevelUp)]);
    }

    #[test]
    fn carried_score_is_truncated_and_display_resets() {
        let (mut c, script) = loaded(3);
        script.borrow_mut().gain = 4200.75;
        c.update(1.0, true).unwrap();
        script.borrow_mut().gain = 0.0;
        assert!(c.displayed_score() > 0.0);

        c.advance(Carry::FromCurrentLevel).unwrap();
        assert_eq!(script.borrow().created, vec![(0, 0), (1, 4200)]);
        assert_eq!(c.carried_score(), 4200.75);
        assert_eq!(true_score(&c), 4200.0);
        assert_eq!(c.displayed_score(), 0.0);
    }

    #[test]
    fn truncation_drops_fractions() {
        assert_eq!(truncate_score(4200.0), 4200);
        assert_eq!(truncate_score(4200.99), 4200);
        assert_eq!(truncate_score(0.5), 0);
        assert_eq!(truncate_score(-3.0), 0);
    }

    #[test]
    fn two_advances_complete_the_run_and_third_is_ignored() {
        let (mut c, script) = loaded(MAX_LEVEL_INDEX);
        finish_level(&mut c, &script, 1234.5);

        assert_eq!(c.state(), RunState::RunComplete { final_score: 1234.5 });
        assert_eq!(c.carried_score(), 1234.5);
        assert!(c.current_level().is_none());
        assert_eq!(
            c.drain_requests(),
            vec![ScreenRequest::Transition(Flow::Title { final_score: Some(1234) })]
        );
        assert!(c.drain_events().contains(&GameEvent::RunComplete));

        c.advance(Carry::FromCurrentLevel).unwrap();
        c.update(0.1, true).unwrap();
        assert_eq!(script.borrow().created.len(), 1);
        assert_eq!(script.borrow().live, 0);
        assert_eq!(script.borrow().disposed, 1);
        assert!(c.drain_requests().is_empty());
        assert_eq!(c.level_index(), MAX_LEVEL_INDEX);
    }

    #[test]
    fn zero_max_index_completes_on_load() {
        let (c, script) = loaded(0);
        assert_eq!(c.state(), RunState::RunComplete { final_score: 0.0 });
        assert!(script.borrow().created.is_empty());
    }

    #[test]
    fn reload_reseeds_with_carried_in_baseline() {
        let (mut c, script) = loaded(3);
        finish_level(&mut c, &script, 1000.0);
        assert_eq!(c.level_index(), 2);

        // Level 1 earns more before the retry.
        script.borrow_mut().gain = 500.0;
        c.update(0.1, true).unwrap();
        script.borrow_mut().gain = 0.0;
        assert_eq!(true_score(&c), 1500.0);

        c.reload_current_level().unwrap();
        assert_eq!(c.level_index(), 2);
        assert_eq!(script.borrow().created.last(), Some(&(1, 1000)));
        assert_eq!(true_score(&c), 1000.0);
        assert_eq!(c.displayed_score(), 0.0);
        assert_eq!(script.borrow().live, 1);
    }

    #[test]
    fn reload_after_run_complete_is_ignored() {
        let (mut c, script) = loaded(MAX_LEVEL_INDEX);
        finish_level(&mut c, &script, 10.0);
        c.reload_current_level().unwrap();
        assert_eq!(script.borrow().created.len(), 1);
    }

    #[test]
    fn inactive_updates_freeze_everything() {
        let (mut c, script) = loaded(3);
        script.borrow_mut().gain = 300.0;
        c.update(0.1, true).unwrap();
        let updates = script.borrow().updates;
        let displayed = c.displayed_score();
        let score = true_score(&c);

        script.borrow_mut().complete_next = true;
        for _ in 0..20 {
            c.update(0.5, false).unwrap();
        }
        assert_eq!(script.borrow().updates, updates);
        assert_eq!(c.displayed_score(), displayed);
        assert_eq!(true_score(&c), score);
        assert_eq!(c.level_index(), 1);
    }

    #[test]
    fn input_reaches_level_only_while_running() {
        let (mut c, script) = loaded(MAX_LEVEL_INDEX);
        c.handle_input(&InputSnapshot::default());
        assert_eq!(script.borrow().inputs, 1);

        finish_level(&mut c, &script, 0.0);
        c.handle_input(&InputSnapshot::default());
        assert_eq!(script.borrow().inputs, 1);
    }

    #[test]
    fn level_events_are_forwarded() {
        let (mut c, _script) = loaded(3);
        c.update(0.1, true).unwrap();
        assert_eq!(c.drain_events(), vec![GameEvent::GemCollected { x: 0, y: 0 }]);
        assert!(c.drain_events().is_empty());
    }

    #[test]
    fn draw_renders_level_then_score() {
        let (mut c, script) = loaded(3);
        script.borrow_mut().gain = 50.0;
        c.update(0.1, true).unwrap();

        let mut surface = Surface::new(60, 10);
        c.draw(&mut surface);
        assert_eq!(surface.get(0, 0).ch, 'l');
        let row: String = (0..60).map(|x| surface.get(x, 8).ch).collect();
        assert!(row.contains("Score 000000050"), "row was {row:?}");
        assert!(row.contains("Level 1/3"));
    }

    #[test]
    fn mid_ramp_readout_rounds() {
        let (mut c, script) = loaded(3);
        script.borrow_mut().gain = 1000.0;
        c.update(0.0019, true).unwrap();
        // 500 * 0.0019 = 0.95 points shown
        let mut surface = Surface::new(60, 10);
        c.draw(&mut surface);
        let row: String = (0..60).map(|x| surface.get(x, 8).ch).collect();
        assert!(row.contains("Score 000000001"), "row was {row:?}");

        assert_eq!(display_score(0.95), 1);
        assert_eq!(display_score(41.49), 41);
        assert_eq!(truncate_score(0.95), 0);
    }

    #[test]
    fn final_score_stays_on_screen_after_run_complete() {
        let (mut c, script) = loaded(MAX_LEVEL_INDEX);
        finish_level(&mut c, &script, 1234.5);
        assert!(c.current_level().is_none());

        let mut surface = Surface::new(60, 10);
        c.draw(&mut surface);
        let row: String = (0..60).map(|x| surface.get(x, 8).ch).collect();
        assert!(row.contains("Score 000001234"), "row was {row:?}");
        assert!(row.contains("Level 1/1"));
    }

    #[test]
    fn factory_errors_propagate() {
        let (mut c, script) = loaded(20);
        for _ in 0..10 {
            finish_level(&mut c, &script, 1.0);
        }
        assert_eq!(c.level_index(), 11);
        script.borrow_mut().complete_next = true;
        assert!(matches!(c.update(0.1, true), Err(GameError::LevelOutOfRange { index: 11, .. })));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "before on_load")]
    fn update_before_load_is_a_programmer_error() {
        let (mut c, _script) = controller(MAX_LEVEL_INDEX);
        c.update(0.1, true).unwrap();
    }

    #[test]
    fn inactive_update_before_load_is_harmless() {
        let (mut c, script) = controller(MAX_LEVEL_INDEX);
        c.update(0.1, false).unwrap();
        assert!(script.borrow().created.is_empty());
    }
}
