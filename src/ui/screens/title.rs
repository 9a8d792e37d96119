/// Title menu. Also where a finished run lands, showing its final score.

use crossterm::style::Color;

use crate::domain::entity::InputSnapshot;
use crate::error::GameResult;
use crate::ui::screen::{Flow, FrameContext, GameTime, Screen, ScreenRequest, Transition};
use crate::ui::screens::menu::Menu;
use crate::ui::surface::Surface;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Choice {
    Start,
    Quit,
}

pub struct TitleScreen {
    final_score: Option<u32>,
    level_count: usize,
    source: String,
    menu: Menu<Choice>,
    transition: Transition,
    anim: f32,
}

impl TitleScreen {
    pub fn new(final_score: Option<u32>, level_count: usize, source: &str) -> Self {
        TitleScreen {
            final_score,
            level_count,
            source: source.to_string(),
            menu: Menu::new(vec![("Start", Choice::Start), ("Quit", Choice::Quit)]),
            transition: Transition::new(0.5, 0.5),
            anim: 0.0,
        }
    }
}

impl Screen for TitleScreen {
    fn name(&self) -> &'static str { "title" }
    fn transition(&self) -> &Transition { &self.transition }
    fn transition_mut(&mut self) -> &mut Transition { &mut self.transition }

    fn update(&mut self, time: &GameTime, _is_active: bool, _ctx: &mut FrameContext) -> GameResult<()> {
        self.anim += time.elapsed;
        Ok(())
    }

    fn handle_input(&mut self, input: &InputSnapshot, ctx: &mut FrameContext) -> GameResult<()> {
        if input.cancel {
            ctx.requests.push(ScreenRequest::Quit);
            return Ok(());
        }
        match self.menu.navigate(input) {
            Some(Choice::Start) => ctx.requests.push(ScreenRequest::Transition(Flow::Gameplay)),
            Some(Choice::Quit) => ctx.requests.push(ScreenRequest::Quit),
            None => {}
        }
        Ok(())
    }

    fn draw(&self, surface: &mut Surface, _time: &GameTime) {
        let mid = surface.height() / 2;
        let top = mid.saturating_sub(6);

        // Slow blink between two golds.
        let fg = if (self.anim * 2.0) as u32 % 2 == 0 { Color::Yellow } else { Color::DarkYellow };
        surface.put_centered(top, "◆  G E M   R U N N E R  ◆", fg, Color::Reset);
        surface.put_centered(
            top + 2,
            &format!("{} levels ({})", self.level_count, self.source),
            Color::DarkGrey,
            Color::Reset,
        );

        if let Some(score) = self.final_score {
            surface.put_centered(top + 4, &format!("Final Score {score:09}"), Color::Cyan, Color::Reset);
        }

        self.menu.draw(surface, top + 7);
        surface.put_centered(
            surface.height().saturating_sub(1),
            "[Enter] Select   [↑↓] Move   [Esc] Quit",
            Color::DarkGrey,
            Color::Reset,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen_text(s: &Surface) -> String {
        (0..s.height())
            .map(|y| (0..s.width()).map(|x| s.get(x, y).ch).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn start_requests_gameplay_flow() {
        let mut t = TitleScreen::new(None, 3, "built-in");
        let mut ctx = FrameContext::default();
        t.handle_input(&InputSnapshot { confirm: true, ..Default::default() }, &mut ctx).unwrap();
        assert_eq!(ctx.requests, vec![ScreenRequest::Transition(Flow::Gameplay)]);
    }

    #[test]
    fn cancel_quits() {
        let mut t = TitleScreen::new(None, 3, "built-in");
        let mut ctx = FrameContext::default();
        t.handle_input(&InputSnapshot { cancel: true, ..Default::default() }, &mut ctx).unwrap();
        assert_eq!(ctx.requests, vec![ScreenRequest::Quit]);
    }

    #[test]
    fn final_score_is_shown_after_a_run() {
        let t = TitleScreen::new(Some(4200), 3, "built-in");
        let mut s = Surface::new(60, 24);
        t.draw(&mut s, &GameTime::default());
        assert!(screen_text(&s).contains("Final Score 000004200"));

        let fresh = TitleScreen::new(None, 3, "built-in");
        let mut s = Surface::new(60, 24);
        fresh.draw(&mut s, &GameTime::default());
        assert!(!screen_text(&s).contains("Final Score"));
    }
}
