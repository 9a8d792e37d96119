/// Pause menu drawn over the gameplay screen.

use crossterm::style::Color;

use crate::domain::entity::InputSnapshot;
use crate::error::GameResult;
use crate::ui::screen::{Flow, FrameContext, GameTime, Screen, ScreenRequest, Transition};
use crate::ui::screens::menu::Menu;
use crate::ui::surface::Surface;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Choice {
    Resume,
    Retry,
    Quit,
}

const PANEL_BG: Color = Color::Rgb { r: 30, g: 30, b: 50 };

pub struct PauseScreen {
    menu: Menu<Choice>,
    transition: Transition,
}

impl PauseScreen {
    pub fn new() -> Self {
        PauseScreen {
            menu: Menu::new(vec![
                ("Resume", Choice::Resume),
                ("Retry level", Choice::Retry),
                ("Quit to title", Choice::Quit),
            ]),
            transition: Transition::instant(),
        }
    }
}

impl Screen for PauseScreen {
    fn name(&self) -> &'static str { "pause" }
    fn is_popup(&self) -> bool { true }
    fn transition(&self) -> &Transition { &self.transition }
    fn transition_mut(&mut self) -> &mut Transition { &mut self.transition }

    fn update(&mut self, _time: &GameTime, _is_active: bool, _ctx: &mut FrameContext) -> GameResult<()> {
        Ok(())
    }

    fn handle_input(&mut self, input: &InputSnapshot, ctx: &mut FrameContext) -> GameResult<()> {
        if input.cancel || input.pause {
            ctx.requests.push(ScreenRequest::Dismiss);
            return Ok(());
        }
        let request = match self.menu.navigate(input) {
            Some(Choice::Resume) => ScreenRequest::Dismiss,
            Some(Choice::Retry) => ScreenRequest::RetryLevel,
            Some(Choice::Quit) => ScreenRequest::Transition(Flow::Title { final_score: None }),
            None => return Ok(()),
        };
        ctx.requests.push(request);
        Ok(())
    }

    fn draw(&self, surface: &mut Surface, _time: &GameTime) {
        surface.fade(0.5);
        let mid = surface.height() / 2;
        let w = 26.min(surface.width());
        let x = surface.width().saturating_sub(w) / 2;
        let top = mid.saturating_sub(4);
        surface.fill_rect(x, top, w, 9, PANEL_BG);
        surface.put_centered(top + 1, "PAUSED", Color::White, PANEL_BG);
        self.menu.draw(surface, top + 3);
    }
}
