/// Concrete screens and the builder the `ScreenManager` uses to make them.

pub mod gameplay;
pub mod level_up;
pub mod menu;
pub mod pause;
pub mod title;

use std::rc::Rc;

use crate::error::GameResult;
use crate::sim::library::LevelLibrary;
use crate::ui::screen::{Flow, Screen, ScreenBuilder, ScreenKind};

use gameplay::GameplayScreen;
use level_up::LevelUpScreen;
use pause::PauseScreen;
use title::TitleScreen;

pub struct ScreenDeck {
    library: Rc<LevelLibrary>,
    max_level_index: usize,
    show_fps: bool,
}

impl ScreenDeck {
    pub fn new(library: Rc<LevelLibrary>, max_level_index: usize, show_fps: bool) -> Self {
        ScreenDeck { library, max_level_index, show_fps }
    }
}

impl ScreenBuilder for ScreenDeck {
    fn overlay(&self, kind: ScreenKind) -> Box<dyn Screen> {
        match kind {
            ScreenKind::LevelUp => Box::new(LevelUpScreen::new()),
            ScreenKind::Pause => Box::new(PauseScreen::new()),
        }
    }

    fn flow(&self, flow: Flow) -> GameResult<Box<dyn Screen>> {
        Ok(match flow {
            Flow::Title { final_score } => {
                Box::new(TitleScreen::new(final_score, self.library.len(), self.library.source()))
            }
            Flow::Gameplay => Box::new(GameplayScreen::new(
                Rc::clone(&self.library),
                self.max_level_index,
                self.show_fps,
            )?),
        })
    }
}
