/// Gameplay screen: hosts the `ProgressionController` inside the stack.
///
/// The controller is loaded when the screen is built. A level-up pushes the
/// level-up overlay on top of this screen; the screen itself stays on the
/// stack and resumes when the overlay is dismissed. The pause overlay is
/// raised by the pause key/button or when the gamepad in use is unplugged.
/// An unplug raises it once; resuming from the keyboard keeps playing until
/// the pad comes back and is lost again.

use std::rc::Rc;

use crossterm::style::Color;
use tracing::{info, trace};

use crate::domain::entity::InputSnapshot;
use crate::error::GameResult;
use crate::sim::event::GameEvent;
use crate::sim::level::LibraryFactory;
use crate::sim::library::LevelLibrary;
use crate::sim::progression::ProgressionController;
use crate::ui::screen::{FrameContext, GameTime, Screen, ScreenKind, ScreenRequest, Transition};
use crate::ui::surface::Surface;

const TRANSITION_ON: f32 = 1.5;
const TRANSITION_OFF: f32 = 0.5;

pub struct GameplayScreen {
    controller: ProgressionController<LibraryFactory>,
    transition: Transition,
    show_fps: bool,
    fps: f32,
    /// The current unplug has already raised the pause overlay.
    unplug_paused: bool,
}

impl GameplayScreen {
    pub fn new(library: Rc<LevelLibrary>, max_level_index: usize, show_fps: bool) -> GameResult<Self> {
        let mut controller = ProgressionController::new(LibraryFactory::new(library), max_level_index);
        controller.on_load()?;
        Ok(GameplayScreen {
            controller,
            transition: Transition::new(TRANSITION_ON, TRANSITION_OFF),
            show_fps,
            fps: 0.0,
            unplug_paused: false,
        })
    }

    fn forward(&mut self, ctx: &mut FrameContext) {
        ctx.requests.extend(self.controller.drain_requests());
        for event in self.controller.drain_events() {
            if let GameEvent::GemCollected { x, y } = event {
                trace!(x, y, "gem collected");
            }
            ctx.events.push(event);
        }
    }
}

impl Screen for GameplayScreen {
    fn name(&self) -> &'static str { "gameplay" }
    fn transition(&self) -> &Transition { &self.transition }
    fn transition_mut(&mut self) -> &mut Transition { &mut self.transition }

    fn update(&mut self, time: &GameTime, is_active: bool, ctx: &mut FrameContext) -> GameResult<()> {
        if time.elapsed_real > 0.0 {
            self.fps = 1.0 / time.elapsed_real;
        }
        self.controller.update(time.elapsed, is_active)?;
        self.forward(ctx);
        Ok(())
    }

    fn handle_input(&mut self, input: &InputSnapshot, ctx: &mut FrameContext) -> GameResult<()> {
        if !input.gamepad_disconnected() {
            self.unplug_paused = false;
        } else if !self.unplug_paused {
            self.unplug_paused = true;
            info!("gamepad disconnected, pausing");
            ctx.requests.push(ScreenRequest::Overlay(ScreenKind::Pause));
            return Ok(());
        }
        if input.pause || input.cancel {
            ctx.requests.push(ScreenRequest::Overlay(ScreenKind::Pause));
            return Ok(());
        }
        if input.retry {
            self.controller.reload_current_level()?;
            self.forward(ctx);
            return Ok(());
        }
        self.controller.handle_input(input);
        Ok(())
    }

    fn draw(&self, surface: &mut Surface, _time: &GameTime) {
        self.controller.draw(surface);
        if self.show_fps {
            let c = &self.controller;
            let (level, gems) = c
                .current_level()
                .map_or((None, 0), |l| (Some(l.index()), l.gems_remaining()));
            let line = format!(
                "fps {:>3.0}  {:?}  next {}/{}  level {:?}  gems {}  carried {:.1}  shown {:.1}",
                self.fps,
                c.state(),
                c.level_index(),
                c.max_level_index(),
                level,
                gems,
                c.carried_score(),
                c.displayed_score(),
            );
            surface.put_str(0, surface.height().saturating_sub(1), &line, Color::DarkGrey, Color::Reset);
        }
    }

    fn retry(&mut self) -> GameResult<()> {
        self.controller.reload_current_level()
    }
}
