//! Input field handling for the terminal user interface.

/// A text input field with cursor position and active state management.
///
/// `cursor` is a byte offset that always sits on a character boundary.
#[derive(Debug, Clone, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.len(),
            active: false,
        }
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        self.value.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.value.remove(prev);
            self.cursor = prev;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.value.len() {
            self.value.remove(self.cursor);
        }
    }

    /// Move cursor one position to the left.
    pub fn move_cursor_left(&mut self) {
        if let Some(prev) = self.prev_boundary() {
            self.cursor = prev;
        }
    }

    /// Move cursor one position to the right.
    pub fn move_cursor_right(&mut self) {
        if let Some(c) = self.value[self.cursor..].chars().next() {
            self.cursor += c.len_utf8();
        }
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    /// Cursor column in characters, for placing the terminal cursor.
    pub fn cursor_column(&self) -> usize {
        self.value[..self.cursor].chars().count()
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.value[..self.cursor].char_indices().next_back().map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editing_keeps_cursor_on_char_boundaries() {
        let mut field = InputField::new();
        for c in "café".chars() {
            field.handle_char(c);
        }
        assert_eq!(field.cursor_column(), 4);

        field.move_cursor_left();
        field.handle_backspace();
        assert_eq!(field.value, "caé");

        field.move_cursor_right();
        field.handle_char('s');
        assert_eq!(field.value, "caés");

        field.move_cursor_left();
        field.move_cursor_left();
        field.handle_delete();
        assert_eq!(field.value, "cas");
    }

    #[test]
    fn test_with_value_places_cursor_at_end() {
        let mut field = InputField::with_value("Gym");
        field.handle_backspace();
        assert_eq!(field.value, "Gy");
        field.clear();
        field.handle_backspace();
        assert_eq!(field.value, "");
    }
}
