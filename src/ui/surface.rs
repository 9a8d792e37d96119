/// Off-screen cell buffer that screens and levels draw into.
///
/// One `Cell` per terminal column/row. The renderer diffs two surfaces
/// and only emits the cells that changed.

use crossterm::style::Color;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" cells, so the terminal's
    /// own default background never shows through between rows.
    pub const BASE_BG: Color = Color::Rgb { r: 22, g: 22, b: 35 };

    pub const BLANK: Cell = Cell {
        ch: ' ',
        fg: Color::White,
        bg: Cell::BASE_BG,
    };

    /// Never produced by drawing; used to invalidate a back buffer so
    /// every position is re-emitted.
    pub const INVALID: Cell = Cell {
        ch: '?',
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    pub fn new(ch: char, fg: Color, bg: Color) -> Self {
        Cell { ch, fg, bg: norm_bg(bg) }
    }
}

/// `Color::Reset` → `BASE_BG`, so every cell carries an explicit background.
#[inline]
fn norm_bg(bg: Color) -> Color {
    match bg {
        Color::Reset => Cell::BASE_BG,
        other => other,
    }
}

pub struct Surface {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Surface {
    pub fn new(w: usize, h: usize) -> Self {
        Surface {
            width: w,
            height: h,
            cells: vec![Cell::BLANK; w * h],
        }
    }

    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.height }

    /// Returns true when the size actually changed (contents are reset).
    pub fn resize(&mut self, w: usize, h: usize) -> bool {
        if self.width == w && self.height == h {
            return false;
        }
        self.width = w;
        self.height = h;
        self.cells = vec![Cell::BLANK; w * h];
        true
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn invalidate(&mut self) {
        self.cells.fill(Cell::INVALID);
    }

    pub fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    /// Write a string at (x, y). Each char occupies 1 column; clipped at the edge.
    pub fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width { break; }
            self.set(x + i, y, Cell::new(ch, fg, bg));
        }
    }

    /// Write a string horizontally centered on row `y`.
    pub fn put_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        let len = s.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    /// Fill a rectangle with blanks of the given background.
    pub fn fill_rect(&mut self, x: usize, y: usize, w: usize, h: usize, bg: Color) {
        for yy in y..(y + h).min(self.height) {
            for xx in x..(x + w).min(self.width) {
                self.set(xx, yy, Cell::new(' ', Color::White, bg));
            }
        }
    }

    /// Darken every cell toward black. `amount` 0.0 = unchanged, 1.0 = black.
    pub fn fade(&mut self, amount: f32) {
        let keep = 1.0 - amount.clamp(0.0, 1.0);
        if keep >= 1.0 {
            return;
        }
        for cell in &mut self.cells {
            cell.fg = scale(cell.fg, keep);
            cell.bg = scale(cell.bg, keep);
        }
    }
}

fn scale(color: Color, keep: f32) -> Color {
    let (r, g, b) = to_rgb(color);
    Color::Rgb {
        r: (r as f32 * keep) as u8,
        g: (g as f32 * keep) as u8,
        b: (b as f32 * keep) as u8,
    }
}

/// Approximate RGB for the named colors the screens use.
fn to_rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb { r, g, b } => (r, g, b),
        Color::Black => (0, 0, 0),
        Color::White | Color::Reset => (229, 229, 229),
        Color::Grey => (160, 160, 160),
        Color::DarkGrey => (100, 100, 100),
        Color::Yellow => (255, 215, 0),
        Color::DarkYellow => (184, 134, 11),
        Color::Cyan => (0, 220, 220),
        Color::DarkCyan => (0, 139, 139),
        Color::Green => (0, 220, 0),
        Color::DarkGreen => (0, 128, 0),
        Color::Red => (230, 50, 50),
        Color::DarkRed => (139, 0, 0),
        Color::Blue => (80, 120, 255),
        Color::DarkBlue => (0, 0, 139),
        Color::Magenta => (220, 0, 220),
        Color::DarkMagenta => (139, 0, 139),
        Color::AnsiValue(_) => (160, 160, 160),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_str_clips_at_right_edge() {
        let mut s = Surface::new(4, 1);
        s.put_str(2, 0, "abc", Color::White, Color::Reset);
        assert_eq!(s.get(2, 0).ch, 'a');
        assert_eq!(s.get(3, 0).ch, 'b');
        // out of bounds reads are blank
        assert_eq!(s.get(4, 0), Cell::BLANK);
    }

    #[test]
    fn reset_background_is_normalized() {
        let mut s = Surface::new(1, 1);
        s.put_str(0, 0, "x", Color::White, Color::Reset);
        assert_eq!(s.get(0, 0).bg, Cell::BASE_BG);
    }

    #[test]
    fn full_fade_goes_black() {
        let mut s = Surface::new(2, 1);
        s.put_str(0, 0, "hi", Color::Yellow, Color::Reset);
        s.fade(1.0);
        assert_eq!(s.get(0, 0).fg, Color::Rgb { r: 0, g: 0, b: 0 });
        assert_eq!(s.get(1, 0).bg, Color::Rgb { r: 0, g: 0, b: 0 });
    }

    #[test]
    fn zero_fade_is_noop() {
        let mut s = Surface::new(1, 1);
        s.put_str(0, 0, "x", Color::Yellow, Color::Reset);
        s.fade(0.0);
        assert_eq!(s.get(0, 0).fg, Color::Yellow);
    }

    #[test]
    fn resize_reports_change() {
        let mut s = Surface::new(2, 2);
        assert!(!s.resize(2, 2));
        assert!(s.resize(3, 2));
        assert_eq!(s.width(), 3);
    }
}
