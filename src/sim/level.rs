/// Level contract used by the progression controller, plus the concrete
/// gem-collecting level the game ships with.
///
/// A `GemLevel` is a walled grid: the player steps one cell per
/// `MOVE_INTERVAL` while a direction is held, every gem is worth
/// `GEM_POINTS`, and clearing the last gem adds a time bonus and reports
/// `LevelEvent::JustCompleted` exactly once. After that the level is frozen.

use std::rc::Rc;

use crossterm::style::Color;
use tracing::{debug, info};

use crate::domain::entity::{Facing, InputSnapshot, MoveDir, Player};
use crate::domain::tile::Tile;
use crate::error::{GameError, GameResult};
use crate::sim::event::{GameEvent, LevelEvent};
use crate::sim::library::{LevelDef, LevelLibrary};
use crate::ui::surface::Surface;

/// What the progression controller needs from a level.
pub trait Level {
    /// Advance the simulation by `dt` seconds.
    fn update(&mut self, dt: f32) -> LevelEvent;
    fn handle_input(&mut self, input: &InputSnapshot);
    fn render(&self, surface: &mut Surface);
    /// Authoritative score, including the baseline the level started with.
    /// Never decreases during the level's life.
    fn true_score(&self) -> f32;
    /// Release the level. Consumes it, so a disposed level cannot be touched.
    fn dispose(self);
    /// Sound cues produced since the last call.
    fn drain_events(&mut self) -> Vec<GameEvent> {
        Vec::new()
    }
}

pub trait LevelFactory {
    type Level: Level;

    fn create_level(&mut self, index: usize, starting_score: u32) -> GameResult<Self::Level>;
}

// ══════════════════════════════════════════════════════════════
// GemLevel
// ══════════════════════════════════════════════════════════════

/// Seconds between steps while a direction is held.
pub const MOVE_INTERVAL: f32 = 0.12;
pub const GEM_POINTS: f32 = 100.0;
/// Clearing a level before this many seconds earns a bonus for the remainder.
pub const PAR_SECONDS: f32 = 60.0;
pub const BONUS_PER_SECOND: f32 = 12.5;

/// Each map cell is drawn two terminal columns wide.
const CELL_W: usize = 2;
const HUD_ROW: usize = 0;
const MAP_ROW: usize = 2;

pub struct GemLevel {
    index: usize,
    name: String,
    tiles: Vec<Vec<Tile>>,
    width: usize,
    height: usize,
    player: Player,
    held: Option<MoveDir>,
    gems_total: usize,
    gems_remaining: usize,
    starting_score: u32,
    earned: f32,
    elapsed: f32,
    completed: bool,
    events: Vec<GameEvent>,
}

impl GemLevel {
    pub fn from_def(index: usize, def: &LevelDef, starting_score: u32) -> GameResult<Self> {
        let width = def.width();
        let height = def.height();
        let mut tiles = vec![vec![Tile::Empty; width]; height];
        let mut spawn = None;
        let mut gems = 0;

        for (y, row) in def.rows.iter().enumerate() {
            for (x, ch) in row.chars().enumerate().take(width) {
                let tile = Tile::from_glyph(ch);
                if tile.is_gem() {
                    gems += 1;
                }
                if ch == 'P' {
                    spawn = Some((x, y));
                }
                tiles[y][x] = tile;
            }
        }

        let (px, py) = spawn.ok_or_else(|| GameError::InvalidLevel {
            name: def.name.clone(),
            reason: "no player spawn".to_string(),
        })?;

        Ok(GemLevel {
            index,
            name: def.name.clone(),
            tiles,
            width,
            height,
            player: Player::new(px, py),
            held: None,
            gems_total: gems,
            gems_remaining: gems,
            starting_score,
            earned: 0.0,
            elapsed: 0.0,
            completed: false,
            events: vec![],
        })
    }

    pub fn index(&self) -> usize { self.index }
    pub fn gems_remaining(&self) -> usize { self.gems_remaining }
    pub fn player_pos(&self) -> (usize, usize) { (self.player.x, self.player.y) }
    pub fn is_complete(&self) -> bool { self.completed }

    fn tile_at(&self, x: i32, y: i32) -> Tile {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Tile::Wall; // out of bounds = wall
        }
        self.tiles[y as usize][x as usize]
    }

    /// Try one step; returns true if the player moved.
    fn step(&mut self, dir: MoveDir) -> bool {
        let (dx, dy) = dir.delta();
        let nx = self.player.x as i32 + dx;
        let ny = self.player.y as i32 + dy;
        if !self.tile_at(nx, ny).is_passable() {
            return false;
        }
        self.player.x = nx as usize;
        self.player.y = ny as usize;
        match dir {
            MoveDir::Left => self.player.facing = Facing::Left,
            MoveDir::Right => self.player.facing = Facing::Right,
            _ => {}
        }
        true
    }

    fn collect_gem(&mut self) -> LevelEvent {
        let (x, y) = (self.player.x, self.player.y);
        if !self.tiles[y][x].is_gem() {
            return LevelEvent::None;
        }
        self.tiles[y][x] = Tile::Empty;
        self.gems_remaining -= 1;
        self.earned += GEM_POINTS;
        self.events.push(GameEvent::GemCollected { x, y });

        if self.gems_remaining > 0 {
            return LevelEvent::None;
        }

        let bonus = (PAR_SECONDS - self.elapsed).max(0.0) * BONUS_PER_SECOND;
        self.earned += bonus;
        self.completed = true;
        self.events.push(GameEvent::LevelCleared);
        debug!(level = self.index, bonus, elapsed = self.elapsed, "level cleared");
        LevelEvent::JustCompleted
    }

    fn map_origin_x(&self, surface: &Surface) -> usize {
        surface.width().saturating_sub(self.width * CELL_W) / 2
    }
}

impl Level for GemLevel {
    fn update(&mut self, dt: f32) -> LevelEvent {
        if self.completed {
            return LevelEvent::None;
        }
        self.elapsed += dt;

        self.player.move_cooldown -= dt;
        if self.player.move_cooldown > 0.0 {
            return LevelEvent::None;
        }
        self.player.move_cooldown = 0.0;

        let dir = match self.held {
            Some(d) => d,
            None => return LevelEvent::None,
        };
        if !self.step(dir) {
            return LevelEvent::None;
        }
        self.player.move_cooldown = MOVE_INTERVAL;
        self.collect_gem()
    }

    fn handle_input(&mut self, input: &InputSnapshot) {
        self.held = input.movement;
    }

    fn render(&self, surface: &mut Surface) {
        let mut hud = format!(
            "{}   Gems {}/{}   Time {:>5.1}",
            self.name,
            self.gems_total - self.gems_remaining,
            self.gems_total,
            self.elapsed,
        );
        if self.is_complete() {
            hud.push_str("   CLEAR!");
        }
        surface.put_centered(HUD_ROW, &hud, Color::White, Color::Reset);

        let ox = self.map_origin_x(surface);
        for (y, row) in self.tiles.iter().enumerate() {
            for (x, tile) in row.iter().enumerate() {
                let (glyph, fg) = match tile {
                    Tile::Wall => ("██", Color::DarkYellow),
                    Tile::Gem => ("◆ ", Color::Cyan),
                    Tile::Empty => ("  ", Color::White),
                };
                surface.put_str(ox + x * CELL_W, MAP_ROW + y, glyph, fg, Color::Reset);
            }
        }

        let glyph = match self.player.facing {
            Facing::Left => "◄@",
            Facing::Right => "@►",
        };
        let (px, py) = self.player_pos();
        surface.put_str(
            ox + px * CELL_W,
            MAP_ROW + py,
            glyph,
            Color::Yellow,
            Color::Reset,
        );
    }

    fn true_score(&self) -> f32 {
        self.starting_score as f32 + self.earned
    }

    fn dispose(self) {
        debug!(level = self.index, name = %self.name, "level disposed");
    }

    fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Builds `GemLevel`s out of the shared level library.
pub struct LibraryFactory {
    library: Rc<LevelLibrary>,
}

impl LibraryFactory {
    pub fn new(library: Rc<LevelLibrary>) -> Self {
        LibraryFactory { library }
    }
}

impl LevelFactory for LibraryFactory {
    type Level = GemLevel;

    fn create_level(&mut self, index: usize, starting_score: u32) -> GameResult<GemLevel> {
        let def = self.library.get(index)?;
        let level = GemLevel::from_def(index, def, starting_score)?;
        info!(level = index, name = %def.name, starting_score, "level created");
        Ok(level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::library::parse_level;

    fn level(map: &str, starting_score: u32) -> GemLevel {
        let def = parse_level(map, "test").unwrap();
        GemLevel::from_def(0, &def, starting_score).unwrap()
    }

    fn holding(dir: MoveDir) -> InputSnapshot {
        InputSnapshot { movement: Some(dir), ..Default::default() }
    }

    #[test]
    fn walls_block_movement() {
        let mut lvl = level("#####\n#P $#\n#####\n", 0);
        lvl.handle_input(&holding(MoveDir::Up));
        assert_eq!(lvl.update(0.0), LevelEvent::None);
        assert_eq!(lvl.player_pos(), (1, 1));
        lvl.handle_input(&holding(MoveDir::Left));
        lvl.update(0.0);
        assert_eq!(lvl.player_pos(), (1, 1));
    }

    #[test]
    fn cooldown_paces_steps() {
        let mut lvl = level("#######\n#P   $#\n#######\n", 0);
        lvl.handle_input(&holding(MoveDir::Right));
        lvl.update(0.0);
        assert_eq!(lvl.player_pos(), (2, 1));
        lvl.update(0.05);
        assert_eq!(lvl.player_pos(), (2, 1));
        lvl.update(0.1);
        assert_eq!(lvl.player_pos(), (3, 1));
    }

    #[test]
    fn no_input_no_movement() {
        let mut lvl = level("#####\n#P $#\n#####\n", 0);
        for _ in 0..10 {
            lvl.update(0.2);
        }
        assert_eq!(lvl.player_pos(), (1, 1));
    }

    #[test]
    fn gem_pickup_scores_on_top_of_baseline() {
        let mut lvl = level("######\n#P$ $#\n######\n", 300);
        assert_eq!(lvl.true_score(), 300.0);
        lvl.handle_input(&holding(MoveDir::Right));
        assert_eq!(lvl.update(0.0), LevelEvent::None);
        assert_eq!(lvl.gems_remaining(), 1);
        assert_eq!(lvl.true_score(), 400.0);
        assert_eq!(
            lvl.drain_events(),
            vec![GameEvent::GemCollected { x: 2, y: 1 }]
        );
        assert!(lvl.drain_events().is_empty());
    }

    #[test]
    fn completion_fires_once_with_time_bonus() {
        let mut lvl = level("#####\n#P$$#\n#####\n", 0);
        lvl.handle_input(&holding(MoveDir::Right));
        assert_eq!(lvl.update(0.0), LevelEvent::None);
        assert_eq!(lvl.update(0.05), LevelEvent::None);
        assert_eq!(lvl.update(0.1), LevelEvent::JustCompleted);
        assert!(lvl.is_complete());

        // 2 gems + (60 - 0.15) * 12.5
        let expected = 200.0 + (PAR_SECONDS - 0.15) * BONUS_PER_SECOND;
        assert!((lvl.true_score() - expected).abs() < 0.01);
        assert!(lvl.true_score().fract() > 0.0);

        let score = lvl.true_score();
        for _ in 0..5 {
            assert_eq!(lvl.update(1.0), LevelEvent::None);
        }
        assert_eq!(lvl.true_score(), score);
    }

    #[test]
    fn no_bonus_after_par() {
        let mut lvl = level("####\n#P$#\n####\n", 0);
        lvl.update(PAR_SECONDS + 5.0);
        lvl.handle_input(&holding(MoveDir::Right));
        assert_eq!(lvl.update(0.0), LevelEvent::JustCompleted);
        assert_eq!(lvl.true_score(), GEM_POINTS);
    }

    #[test]
    fn render_draws_player_and_hud() {
        let lvl = level("# Tiny\n####\n#P$#\n####\n", 0);
        let mut surface = Surface::new(20, 8);
        lvl.render(&mut surface);
        // map is 4 cells * 2 columns wide, centered in 20 → origin 6
        assert_eq!(surface.get(6, MAP_ROW).ch, '█');
        assert_eq!(surface.get(6 + CELL_W, MAP_ROW + 1).ch, '@');
        assert_eq!(surface.get(6 + 2 * CELL_W, MAP_ROW + 1).ch, '◆');
        assert_ne!(surface.get(0, HUD_ROW).ch, '?');
    }

    #[test]
    fn factory_reports_out_of_range() {
        let lib = Rc::new(LevelLibrary::embedded());
        let mut factory = LibraryFactory::new(lib);
        let lvl = factory.create_level(1, 42).unwrap();
        assert_eq!(lvl.index(), 1);
        assert_eq!(lvl.true_score(), 42.0);
        assert!(matches!(
            factory.create_level(9, 0),
            Err(GameError::LevelOutOfRange { index: 9, .. })
        ));
    }
}
