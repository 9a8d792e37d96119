/// Screen stack.
///
/// Every screen (title menu, gameplay, overlays) implements `Screen`. The
/// `ScreenManager` owns the stack and decides, each frame:
///   - which screen gets input: only the topmost one
///   - which screen is active: the topmost one, unless the stack is
///     fading out toward a new flow
///   - which screens are drawn: from the topmost non-popup screen upward
///
/// Screens never touch the stack directly. They push `ScreenRequest`s into
/// the `FrameContext`, and the manager applies them after input and after
/// update.

use tracing::{debug, info};

use crate::domain::entity::InputSnapshot;
use crate::error::GameResult;
use crate::sim::event::GameEvent;
use crate::ui::surface::Surface;

/// Frame timing handed to every screen, in seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GameTime {
    /// Simulated time since the previous frame (clamped by the driver).
    pub elapsed: f32,
    /// Wall-clock time since the previous frame. Only feeds the fps readout.
    pub elapsed_real: f32,
}

/// Screens that can be layered on top of the current one.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScreenKind {
    LevelUp,
    Pause,
}

/// Top-level flows. Transitioning to a flow replaces the whole stack.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Flow {
    Title { final_score: Option<u32> },
    Gameplay,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScreenRequest {
    Overlay(ScreenKind),
    /// Remove the topmost screen.
    Dismiss,
    Transition(Flow),
    /// Close popups and ask the topmost full screen to restart its level.
    RetryLevel,
    Quit,
}

/// Outputs a screen produces during one call.
#[derive(Default, Debug)]
pub struct FrameContext {
    pub requests: Vec<ScreenRequest>,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Transition
// ══════════════════════════════════════════════════════════════

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TransitionState {
    On,
    Active,
    Off,
    Hidden,
}

/// Fade in/out bookkeeping. `position` is 1.0 when fully faded out
/// (black) and 0.0 when fully visible.
#[derive(Clone, Debug)]
pub struct Transition {
    on_time: f32,
    off_time: f32,
    position: f32,
    state: TransitionState,
}

impl Transition {
    pub fn new(on_time: f32, off_time: f32) -> Self {
        let mut t = Transition { on_time, off_time, position: 1.0, state: TransitionState::On };
        t.update(0.0);
        t
    }

    /// No fading at all.
    pub fn instant() -> Self {
        Transition::new(0.0, 0.0)
    }

    pub fn state(&self) -> TransitionState { self.state }
    pub fn position(&self) -> f32 { self.position }

    pub fn is_hidden(&self) -> bool {
        self.state == TransitionState::Hidden
    }

    pub fn begin_exit(&mut self) {
        if self.state != TransitionState::Hidden {
            self.state = TransitionState::Off;
        }
    }

    pub fn update(&mut self, dt: f32) {
        match self.state {
            TransitionState::On => {
                self.position = step(self.position, dt, self.on_time, -1.0);
                if self.position <= 0.0 {
                    self.state = TransitionState::Active;
                }
            }
            TransitionState::Off => {
                self.position = step(self.position, dt, self.off_time, 1.0);
                if self.position >= 1.0 {
                    self.state = TransitionState::Hidden;
                }
            }
            TransitionState::Active | TransitionState::Hidden => {}
        }
    }
}

fn step(position: f32, dt: f32, duration: f32, direction: f32) -> f32 {
    if duration <= 0.0 {
        return if direction > 0.0 { 1.0 } else { 0.0 };
    }
    (position + direction * dt / duration).clamp(0.0, 1.0)
}

// ══════════════════════════════════════════════════════════════
// Screen trait
// ══════════════════════════════════════════════════════════════

pub trait Screen {
    fn name(&self) -> &'static str;

    /// Popups leave the screen below them visible.
    fn is_popup(&self) -> bool {
        false
    }

    fn transition(&self) -> &Transition;
    fn transition_mut(&mut self) -> &mut Transition;

    /// Called every frame for every screen on the stack.
    fn update(&mut self, time: &GameTime, is_active: bool, ctx: &mut FrameContext) -> GameResult<()>;

    /// Called only for the topmost screen.
    fn handle_input(&mut self, input: &InputSnapshot, ctx: &mut FrameContext) -> GameResult<()>;

    fn draw(&self, surface: &mut Surface, time: &GameTime);

    /// Restart the current level, if this screen has one.
    fn retry(&mut self) -> GameResult<()> {
        Ok(())
    }
}

/// Builds the concrete screens the manager asks for.
pub trait ScreenBuilder {
    fn overlay(&self, kind: ScreenKind) -> Box<dyn Screen>;
    fn flow(&self, flow: Flow) -> GameResult<Box<dyn Screen>>;
}

// ══════════════════════════════════════════════════════════════
// ScreenManager
// ══════════════════════════════════════════════════════════════

pub struct ScreenManager {
    builder: Box<dyn ScreenBuilder>,
    screens: Vec<Box<dyn Screen>>,
    /// Set while the stack fades out before being replaced.
    pending_flow: Option<Flow>,
    events: Vec<GameEvent>,
    quit: bool,
}

impl ScreenManager {
    pub fn new(builder: Box<dyn ScreenBuilder>) -> Self {
        ScreenManager {
            builder,
            screens: vec![],
            pending_flow: None,
            events: vec![],
            quit: false,
        }
    }

    /// Replace the stack immediately, without a fade-out.
    pub fn start(&mut self, flow: Flow) -> GameResult<()> {
        let screen = self.builder.flow(flow)?;
        info!(screen = screen.name(), "flow started");
        self.screens.clear();
        self.screens.push(screen);
        self.pending_flow = None;
        Ok(())
    }

    pub fn should_quit(&self) -> bool {
        self.quit || (self.screens.is_empty() && self.pending_flow.is_none())
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn top_name(&self) -> Option<&'static str> {
        self.screens.last().map(|s| s.name())
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn handle_input(&mut self, input: &InputSnapshot) -> GameResult<()> {
        if self.pending_flow.is_some() {
            return Ok(());
        }
        let mut ctx = FrameContext::default();
        if let Some(top) = self.screens.last_mut() {
            top.handle_input(input, &mut ctx)?;
        }
        self.apply(ctx)
    }

    pub fn update(&mut self, time: &GameTime) -> GameResult<()> {
        let exiting = self.pending_flow.is_some();
        let top = self.screens.len().saturating_sub(1);
        let mut ctx = FrameContext::default();

        for (i, screen) in self.screens.iter_mut().enumerate().rev() {
            if exiting {
                screen.transition_mut().begin_exit();
            }
            screen.transition_mut().update(time.elapsed);
            let is_active = i == top && !exiting;
            screen.update(time, is_active, &mut ctx)?;
        }
        self.apply(ctx)?;

        if let Some(flow) = self.pending_flow {
            if self.screens.iter().all(|s| s.transition().is_hidden()) {
                self.start(flow)?;
            }
        }
        Ok(())
    }

    pub fn draw(&self, surface: &mut Surface, time: &GameTime) {
        let base = self.screens.iter().rposition(|s| !s.is_popup()).unwrap_or(0);
        for screen in self.screens.iter().skip(base) {
            if screen.transition().state() == TransitionState::Hidden {
                continue;
            }
            screen.draw(surface, time);
            let fade = screen.transition().position();
            if fade > 0.0 {
                surface.fade(fade);
            }
        }
    }

    fn apply(&mut self, ctx: FrameContext) -> GameResult<()> {
        self.events.extend(ctx.events);

        for request in ctx.requests {
            debug!(?request, "screen request");
            match request {
                ScreenRequest::Overlay(kind) => {
                    if self.pending_flow.is_none() {
                        self.screens.push(self.builder.overlay(kind));
                    }
                }
                ScreenRequest::Dismiss => {
                    self.screens.pop();
                }
                ScreenRequest::Transition(flow) => {
                    self.pending_flow = Some(flow);
                }
                ScreenRequest::RetryLevel => {
                    while self.screens.last().map_or(false, |s| s.is_popup()) {
                        self.screens.pop();
                    }
                    if let Some(top) = self.screens.last_mut() {
                        top.retry()?;
                    }
                }
                ScreenRequest::Quit => {
                    self.quit = true;
                }
            }
        }
        Ok(())
    }
}
