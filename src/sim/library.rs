/// Level library: the "assets" every level is built from.
///
/// ## Sources (priority order):
///   1. `levels/` directory (individual `.txt` files, sorted by filename)
///   2. Built-in embedded levels
///
/// ## Level file format (`.txt`):
///   Line 1 (optional): `# Level Name`
///   Remaining lines: map rows, right-padded to the widest row.
///
/// ## Tile legend:
///   '#' = Wall      '$' = Gem      'P' = Player spawn      ' ' = Empty

use std::path::Path;

use tracing::{debug, warn};

use crate::error::{GameError, GameResult};

/// Parsed, validated level layout.
#[derive(Clone, Debug)]
pub struct LevelDef {
    pub name: String,
    pub rows: Vec<String>,
}

impl LevelDef {
    pub fn width(&self) -> usize {
        self.rows.first().map_or(0, |r| r.chars().count())
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }
}

pub struct LevelLibrary {
    levels: Vec<LevelDef>,
    source: String,
}

impl LevelLibrary {
    /// Directory levels when the directory holds at least one valid file,
    /// otherwise the embedded set.
    pub fn load(levels_dir: &Path) -> Self {
        if levels_dir.is_dir() {
            let source = levels_dir.display().to_string();
            match LevelLibrary::from_defs(load_from_directory(levels_dir), &source) {
                Ok(lib) => {
                    debug!(count = lib.len(), source = %source, "level directory loaded");
                    return lib;
                }
                Err(e) => warn!(source = %source, error = %e, "using built-in levels"),
            }
        }
        LevelLibrary::embedded()
    }

    pub fn embedded() -> Self {
        LevelLibrary {
            levels: embedded_levels(),
            source: "built-in".to_string(),
        }
    }

    pub fn from_defs(levels: Vec<LevelDef>, source: &str) -> GameResult<Self> {
        if levels.is_empty() {
            return Err(GameError::EmptyLibrary);
        }
        Ok(LevelLibrary { levels, source: source.to_string() })
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn get(&self, index: usize) -> GameResult<&LevelDef> {
        self.levels.get(index).ok_or(GameError::LevelOutOfRange {
            index,
            available: self.levels.len(),
        })
    }
}

// ══════════════════════════════════════════════════════════════
// Parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single level from text content.
pub fn parse_level(content: &str, fallback_name: &str) -> GameResult<LevelDef> {
    let mut name = String::new();
    let mut rows: Vec<String> = vec![];

    for (i, line) in content.lines().enumerate() {
        if i == 0 && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if name.is_empty() {
        name = fallback_name.to_string();
    }

    if rows.is_empty() {
        return Err(invalid(&name, "no map rows"));
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    let spawns = rows.iter().map(|r| r.matches('P').count()).sum::<usize>();
    if spawns != 1 {
        return Err(invalid(&name, &format!("expected exactly one 'P', found {spawns}")));
    }
    if !rows.iter().any(|r| r.contains('$')) {
        return Err(invalid(&name, "no gems"));
    }

    Ok(LevelDef { name, rows })
}

fn invalid(name: &str, reason: &str) -> GameError {
    GameError::InvalidLevel { name: name.to_string(), reason: reason.to_string() }
}

/// Distinguish `# Level Name` from `########` (a wall row).
/// A name line starts with `#` and contains at least one letter.
fn is_name_line(line: &str) -> bool {
    line.starts_with('#') && line[1..].chars().any(|c| c.is_alphabetic())
}

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not read levels directory");
            return vec![];
        }
    };

    let mut files: Vec<_> = entries
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.extension().map_or(false, |x| x == "txt"))
        .collect();
    files.sort();

    let mut levels = vec![];
    for path in files {
        let stem = path.file_stem().unwrap_or_default().to_string_lossy().to_string();
        let parsed = std::fs::read_to_string(&path)
            .map_err(GameError::from)
            .and_then(|content| parse_level(&content, &stem));
        match parsed {
            Ok(def) => levels.push(def),
            Err(e) => warn!(path = %path.display(), error = %e, "skipping level file"),
        }
    }
    levels
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

fn embedded_levels() -> Vec<LevelDef> {
    vec![
        make_embedded("Cavern 1 - First Light", &[
            "############################",
            "#                          #",
            "#  $      ####      $      #",
            "#         #  #             #",
            "#   ###   #  #   ###   $   #",
            "#     #          #         #",
            "#  $  #    P     #    ###  #",
            "#     ####   ######     $  #",
            "#                          #",
            "############################",
        ]),
        make_embedded("Cavern 2 - Split Vein", &[
            "############################",
            "# $        #       #     $ #",
            "#   ####   #   $   #  ##   #",
            "#   #  $   #       #   #   #",
            "#   #   #######  ####  #   #",
            "#   #          P       # $ #",
            "# $ ######  ####  ######   #",
            "#        #     $       #   #",
            "#   $    #         $       #",
            "############################",
        ]),
        make_embedded("Cavern 3 - Deep Seam", &[
            "############################",
            "#$ #     $     #     $   #$#",
            "#  #  #######  #  ####   # #",
            "#  #  #     #  #     #   # #",
            "#  $  #  $  #     $  #     #",
            "####  #     ######   ####  #",
            "#     ###  P     #      #  #",
            "#  ####    ####  #####  #  #",
            "#$      $     #       $   $#",
            "############################",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> LevelDef {
    LevelDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}
