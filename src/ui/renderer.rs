/// Diff-based terminal output.
///
/// Screens draw a whole frame into a `Surface`. `present` compares it with
/// the frame presented last time and only emits the cells that changed,
/// grouped into runs that share colors, queued and flushed once.
///
/// Generic over the writer so the diff can be checked against a `Vec<u8>`.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::ui::surface::{Cell, Surface};

pub struct Renderer<W: Write = BufWriter<Stdout>> {
    writer: W,
    /// What the terminal currently shows.
    shown: Surface,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer::with_writer(BufWriter::with_capacity(16384, io::stdout()))
    }

    /// Raw mode, alternate screen, hidden cursor, base background.
    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(self.writer, ResetColor, cursor::Show, terminal::LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }

    /// Terminal size in cells; 80x24 when it cannot be queried.
    pub fn size(&self) -> (usize, usize) {
        let (w, h) = terminal::size().unwrap_or((80, 24));
        (w as usize, h as usize)
    }
}

impl<W: Write> Renderer<W> {
    pub fn with_writer(writer: W) -> Self {
        Renderer { writer, shown: Surface::new(0, 0) }
    }

    /// Emit the difference between `frame` and what is on screen.
    /// Returns the number of cells written.
    pub fn present(&mut self, frame: &Surface) -> io::Result<usize> {
        if self.shown.resize(frame.width(), frame.height()) {
            self.shown.invalidate();
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        // Start from explicit colors; ResetColor would expose the terminal default.
        let mut fg = Color::White;
        let mut bg = Cell::BASE_BG;
        queue!(self.writer, SetForegroundColor(fg), SetBackgroundColor(bg))?;

        let mut written = 0;
        let mut run = String::new();
        for y in 0..frame.height() {
            let mut x = 0;
            while x < frame.width() {
                let cell = frame.get(x, y);
                if cell == self.shown.get(x, y) {
                    x += 1;
                    continue;
                }

                // Gather changed cells with the same colors into one Print.
                queue!(self.writer, MoveTo(x as u16, y as u16))?;
                if cell.fg != fg {
                    fg = cell.fg;
                    queue!(self.writer, SetForegroundColor(fg))?;
                }
                if cell.bg != bg {
                    bg = cell.bg;
                    queue!(self.writer, SetBackgroundColor(bg))?;
                }
                run.clear();
                while x < frame.width() {
                    let next = frame.get(x, y);
                    if next == self.shown.get(x, y) || next.fg != fg || next.bg != bg {
                        break;
                    }
                    run.push(next.ch);
                    self.shown.set(x, y, next);
                    written += 1;
                    x += 1;
                }
                queue!(self.writer, Print(&run))?;
            }
        }

        self.writer.flush()?;
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(r: &Renderer<Vec<u8>>) -> String {
        String::from_utf8_lossy(&r.writer).into_owned()
    }

    #[test]
    fn first_frame_paints_everything_then_nothing() {
        let mut r = Renderer::with_writer(Vec::new());
        let mut s = Surface::new(6, 2);
        s.put_str(0, 0, "gem", Color::Yellow, Color::Reset);

        assert_eq!(r.present(&s).unwrap(), 12);
        assert!(output(&r).contains("gem"));

        r.writer.clear();
        assert_eq!(r.present(&s).unwrap(), 0);
        assert!(!output(&r).contains("gem"));
    }

    #[test]
    fn only_changed_cells_are_written() {
        let mut r = Renderer::with_writer(Vec::new());
        let mut s = Surface::new(8, 1);
        r.present(&s).unwrap();

        r.writer.clear();
        s.put_str(2, 0, "ab", Color::White, Color::Reset);
        assert_eq!(r.present(&s).unwrap(), 2);
        assert!(output(&r).contains("ab"));
    }

    #[test]
    fn resize_forces_full_repaint() {
        let mut r = Renderer::with_writer(Vec::new());
        r.present(&Surface::new(4, 1)).unwrap();
        assert_eq!(r.present(&Surface::new(5, 2)).unwrap(), 10);
    }
}
