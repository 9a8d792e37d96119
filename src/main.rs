/// Entry point and game loop.

mod config;
mod domain;
mod error;
mod logging;
mod sim;
mod ui;

use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{KeyboardEnhancementFlags, PushKeyboardEnhancementFlags, PopKeyboardEnhancementFlags};
use crossterm::{execute, terminal};
use tracing::{debug, error, info, warn};

use config::GameConfig;
use error::GameResult;
use sim::library::LevelLibrary;
use ui::gamepad::GamepadState;
use ui::input::{self, InputState};
use ui::renderer::Renderer;
use ui::screen::{Flow, GameTime, ScreenManager};
use ui::screens::ScreenDeck;
use ui::sound::SoundEngine;
use ui::surface::Surface;

fn main() {
    let logged = logging::init();
    let config = GameConfig::load();
    info!(?config, "starting");

    let library = Rc::new(LevelLibrary::load(&config.general.levels_dir));
    let max_level_index = config.progression.clamped_max(library.len());
    if max_level_index != config.progression.max_level_index {
        warn!(
            configured = config.progression.max_level_index,
            used = max_level_index,
            levels = library.len(),
            "max_level_index clamped to the level library"
        );
    }
    info!(levels = library.len(), source = library.source(), max_level_index, "level library ready");

    let mut renderer = Renderer::new();
    if let Err(e) = renderer.init() {
        eprintln!("Terminal init failed: {e}");
        return;
    }
    let enhanced = enable_key_release();

    let sound = SoundEngine::new();
    let deck = ScreenDeck::new(library, max_level_index, config.general.show_fps);
    let result = game_loop(&mut renderer, sound.as_ref(), &config, Box::new(deck), enhanced);

    if enhanced {
        let _ = execute!(std::io::stdout(), PopKeyboardEnhancementFlags);
    }
    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }

    match result {
        Ok(()) => info!("clean exit"),
        Err(e) => {
            error!(error = %e, "game loop failed");
            eprintln!("Game error: {e}");
        }
    }
    if logged {
        println!("Log written to {}", logging::log_path().display());
    }
    println!("Thanks for playing Gem Runner!");
}

/// Ask the terminal for key Release events. Without them held keys are
/// released by timeout.
fn enable_key_release() -> bool {
    if !matches!(terminal::supports_keyboard_enhancement(), Ok(true)) {
        return false;
    }
    execute!(
        std::io::stdout(),
        PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
    )
    .is_ok()
}

fn game_loop(
    renderer: &mut Renderer,
    sound: Option<&SoundEngine>,
    config: &GameConfig,
    deck: Box<ScreenDeck>,
    honor_release: bool,
) -> GameResult<()> {
    let mut kb = InputState::new();
    kb.honor_release = honor_release;
    let mut gp = GamepadState::new(&config.gamepad);

    let mut screens = ScreenManager::new(deck);
    screens.start(Flow::Title { final_score: None })?;

    let (w, h) = renderer.size();
    let mut surface = Surface::new(w, h);
    let frame = Duration::from_millis(config.timing.frame_ms);
    let mut last_frame = Instant::now();
    let mut last_top = None;

    while !screens.should_quit() {
        let frame_start = Instant::now();

        kb.drain_events();
        gp.update();
        if kb.ctrl_c_pressed() {
            info!("ctrl-c");
            break;
        }

        let snapshot = input::snapshot(kb.actions(), gp.actions(), gp.connected(), gp.was_connected());
        screens.handle_input(&snapshot)?;

        let real = frame_start.duration_since(last_frame).as_secs_f32();
        last_frame = frame_start;
        let time = GameTime { elapsed: real.min(config.timing.max_frame_dt), elapsed_real: real };
        screens.update(&time)?;

        if screens.top_name() != last_top {
            last_top = screens.top_name();
            debug!(screen = ?last_top, depth = screens.len(), "top screen changed");
        }

        if let Some(sfx) = sound {
            sfx.play_events(&screens.drain_events());
        } else {
            screens.drain_events();
        }

        let (w, h) = renderer.size();
        surface.resize(w, h);
        surface.clear();
        screens.draw(&mut surface, &time);
        renderer.present(&surface)?;

        if let Some(rest) = frame.checked_sub(frame_start.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    Ok(())
}
