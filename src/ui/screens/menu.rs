/// Vertical text menu shared by the title and pause screens.

use crossterm::style::Color;

use crate::domain::entity::InputSnapshot;
use crate::ui::surface::Surface;

pub struct Menu<T: Copy> {
    items: Vec<(&'static str, T)>,
    cursor: usize,
}

impl<T: Copy> Menu<T> {
    pub fn new(items: Vec<(&'static str, T)>) -> Self {
        Menu { items, cursor: 0 }
    }

    pub fn selected(&self) -> Option<T> {
        self.items.get(self.cursor).map(|(_, v)| *v)
    }

    /// Move the cursor; returns the chosen item when confirm was pressed.
    /// The cursor wraps at both ends.
    pub fn navigate(&mut self, input: &InputSnapshot) -> Option<T> {
        let n = self.items.len();
        if n == 0 {
            return None;
        }
        if input.menu_up {
            self.cursor = (self.cursor + n - 1) % n;
        } else if input.menu_down {
            self.cursor = (self.cursor + 1) % n;
        }
        if input.confirm {
            self.selected()
        } else {
            None
        }
    }

    pub fn draw(&self, surface: &mut Surface, top: usize) {
        for (i, (label, _)) in self.items.iter().enumerate() {
            let (text, fg) = if i == self.cursor {
                (format!("> {label} <"), Color::Yellow)
            } else {
                (format!("  {label}  "), Color::Grey)
            };
            surface.put_centered(top + i * 2, &text, fg, Color::Reset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(up: bool, down: bool, confirm: bool) -> InputSnapshot {
        InputSnapshot { menu_up: up, menu_down: down, confirm, ..Default::default() }
    }

    #[test]
    fn cursor_wraps_both_ways() {
        let mut m = Menu::new(vec![("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(m.navigate(&press(true, false, false)), None);
        assert_eq!(m.selected(), Some(3));
        m.navigate(&press(false, true, false));
        assert_eq!(m.selected(), Some(1));
    }

    #[test]
    fn confirm_returns_item_under_cursor() {
        let mut m = Menu::new(vec![("a", 'a'), ("b", 'b')]);
        assert_eq!(m.navigate(&press(false, true, true)), Some('b'));
    }

    #[test]
    fn selected_item_is_highlighted() {
        let m = Menu::new(vec![("Start", ()), ("Quit", ())]);
        let mut s = Surface::new(20, 5);
        m.draw(&mut s, 1);
        let row: String = (0..20).map(|x| s.get(x, 1).ch).collect();
        assert!(row.contains("> Start <"));
        assert_eq!(s.get(7, 1).fg, Color::Yellow);
    }
}
