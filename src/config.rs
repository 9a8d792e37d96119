/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::error::GameResult;
use crate::sim::progression::MAX_LEVEL_INDEX;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub general: GeneralConfig,
    pub timing: TimingConfig,
    pub progression: ProgressionConfig,
    pub gamepad: GamepadConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    pub levels_dir: PathBuf,
    pub show_fps: bool,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub frame_ms: u64,
    /// Upper bound on a single frame's simulated `dt`, in seconds.
    pub max_frame_dt: f32,
}

#[derive(Clone, Debug)]
pub struct ProgressionConfig {
    /// Last level index a run may reach before it completes.
    pub max_level_index: usize,
}

impl ProgressionConfig {
    /// The run builds indices `0..max`, so `max` may not exceed the number
    /// of levels loaded. At least one level is always played.
    pub fn clamped_max(&self, library_len: usize) -> usize {
        self.max_level_index.min(library_len).max(1)
    }
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
    pub retry: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    progression: TomlProgression,
    #[serde(default)]
    gamepad: TomlGamepad,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
    #[serde(default)]
    show_fps: bool,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_max_frame_dt")]
    max_frame_dt: f32,
}

#[derive(Deserialize, Debug)]
struct TomlProgression {
    #[serde(default = "default_max_level_index")]
    max_level_index: usize,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
    #[serde(default = "default_retry")]
    retry: Vec<String>,
}

// ── Defaults ──

fn default_levels_dir() -> String { "levels".into() }
fn default_frame_ms() -> u64 { 16 }       // ~60 fps
fn default_max_frame_dt() -> f32 { 0.25 } // clamp after a stall (terminal resize, suspend)
fn default_max_level_index() -> usize { MAX_LEVEL_INDEX }

fn default_confirm() -> Vec<String> { vec!["A".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }
fn default_retry() -> Vec<String> { vec!["Y".into()] }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
            show_fps: false,
        }
    }
}

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            frame_ms: default_frame_ms(),
            max_frame_dt: default_max_frame_dt(),
        }
    }
}

impl Default for TomlProgression {
    fn default() -> Self {
        TomlProgression {
            max_level_index: default_max_level_index(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
            retry: default_retry(),
        }
    }
}

// ── Loading ──

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/gemrunner`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    #[cfg(test)]
    fn parse(text: &str) -> GameResult<Self> {
        Ok(GameConfig::from_toml(parse_toml(text)?, &[]))
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            general: GeneralConfig {
                levels_dir,
                show_fps: toml_cfg.general.show_fps,
            },
            timing: TimingConfig {
                frame_ms: toml_cfg.timing.frame_ms.max(1),
                max_frame_dt: toml_cfg.timing.max_frame_dt.max(0.0),
            },
            progression: ProgressionConfig {
                max_level_index: toml_cfg.progression.max_level_index,
            },
            gamepad: GamepadConfig {
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                pause: toml_cfg.gamepad.pause,
                retry: toml_cfg.gamepad.retry,
            },
        }
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data home (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/gemrunner");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

fn parse_toml(text: &str) -> GameResult<TomlConfig> {
    Ok(toml::from_str(text)?)
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if !path.exists() {
            continue;
        }
        match std::fs::read_to_string(&path) {
            Ok(text) => match parse_toml(&text) {
                Ok(cfg) => {
                    info!(path = %path.display(), "config loaded");
                    return cfg;
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                    return TomlConfig::default();
                }
            },
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read config.toml");
            }
        }
    }
    TomlConfig::default()
}
