/// "Level up" banner drawn over the gameplay screen.
///
/// While it is on top the gameplay screen is inactive, so the new level
/// waits behind the banner. It dismisses itself after `LEVEL_UP_HOLD`
/// seconds or on confirm/cancel.

use crossterm::style::Color;

use crate::domain::entity::InputSnapshot;
use crate::error::GameResult;
use crate::ui::screen::{FrameContext, GameTime, Screen, ScreenRequest, Transition};
use crate::ui::surface::Surface;

pub const LEVEL_UP_HOLD: f32 = 2.5;

const BANNER_BG: Color = Color::Rgb { r: 40, g: 30, b: 10 };

pub struct LevelUpScreen {
    shown: f32,
    dismissed: bool,
    transition: Transition,
}

impl LevelUpScreen {
    pub fn new() -> Self {
        LevelUpScreen { shown: 0.0, dismissed: false, transition: Transition::instant() }
    }

    fn dismiss(&mut self, ctx: &mut FrameContext) {
        if !self.dismissed {
            self.dismissed = true;
            ctx.requests.push(ScreenRequest::Dismiss);
        }
    }
}

impl Screen for LevelUpScreen {
    fn name(&self) -> &'static str { "level_up" }
    fn is_popup(&self) -> bool { true }
    fn transition(&self) -> &Transition { &self.transition }
    fn transition_mut(&mut self) -> &mut Transition { &mut self.transition }

    fn update(&mut self, time: &GameTime, is_active: bool, ctx: &mut FrameContext) -> GameResult<()> {
        if !is_active {
            return Ok(());
        }
        self.shown += time.elapsed;
        if self.shown >= LEVEL_UP_HOLD {
            self.dismiss(ctx);
        }
        Ok(())
    }

    fn handle_input(&mut self, input: &InputSnapshot, ctx: &mut FrameContext) -> GameResult<()> {
        if input.confirm || input.cancel {
            self.dismiss(ctx);
        }
        Ok(())
    }

    fn draw(&self, surface: &mut Surface, _time: &GameTime) {
        surface.fade(0.4);
        let mid = surface.height() / 2;
        let w = 30.min(surface.width());
        let x = surface.width().saturating_sub(w) / 2;
        surface.fill_rect(x, mid.saturating_sub(2), w, 5, BANNER_BG);
        surface.put_centered(mid.saturating_sub(1), "L E V E L   U P !", Color::Yellow, BANNER_BG);
        surface.put_centered(mid + 1, "[Enter] Continue", Color::DarkGrey, BANNER_BG);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(dt: f32) -> GameTime {
        GameTime { elapsed: dt, elapsed_real: dt }
    }

    #[test]
    fn dismisses_itself_after_hold() {
        let mut s = LevelUpScreen::new();
        let mut ctx = FrameContext::default();
        s.update(&time(LEVEL_UP_HOLD - 0.1), true, &mut ctx).unwrap();
        assert!(ctx.requests.is_empty());
        s.update(&time(0.2), true, &mut ctx).unwrap();
        assert_eq!(ctx.requests, vec![ScreenRequest::Dismiss]);

        // only once
        s.update(&time(1.0), true, &mut ctx).unwrap();
        assert_eq!(ctx.requests.len(), 1);
    }

    #[test]
    fn hold_does_not_run_while_covered() {
        let mut s = LevelUpScreen::new();
        let mut ctx = FrameContext::default();
        s.update(&time(10.0), false, &mut ctx).unwrap();
        assert!(ctx.requests.is_empty());
    }

    #[test]
    fn confirm_dismisses_early() {
        let mut s = LevelUpScreen::new();
        let mut ctx = FrameContext::default();
        s.handle_input(&InputSnapshot::default(), &mut ctx).unwrap();
        assert!(ctx.requests.is_empty());
        s.handle_input(&InputSnapshot { confirm: true, ..Default::default() }, &mut ctx).unwrap();
        assert_eq!(ctx.requests, vec![ScreenRequest::Dismiss]);
        assert!(s.is_popup());
    }
}
