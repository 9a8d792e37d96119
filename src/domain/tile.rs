/// Tile types and their properties.
/// Properties are queried via methods, not stored as flags,
/// so tile semantics are centralized here.

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Tile {
    #[default]
    Empty,
    Wall,
    Gem,
}

impl Tile {
    /// Map-file glyph → tile. Spawn markers and unknown glyphs are `Empty`.
    pub fn from_glyph(ch: char) -> Tile {
        match ch {
            '#' => Tile::Wall,
            '$' => Tile::Gem,
            _ => Tile::Empty,
        }
    }

    /// Can the player occupy this cell?
    pub fn is_passable(self) -> bool {
        !matches!(self, Tile::Wall)
    }

    pub fn is_gem(self) -> bool {
        matches!(self, Tile::Gem)
    }
}
