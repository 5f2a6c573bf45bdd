/// Single-line editor for the search box and the working-directory prompt.
///
/// The cursor is a byte offset that always sits on a char boundary.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct QueryEditor {
    text: String,
    cursor: usize,
}

impl QueryEditor {
    pub fn from_text(text: &str) -> Self {
        let text = flatten_line(text);
        let cursor = text.len();
        Self { text, cursor }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Cursor position in chars, for terminal placement.
    pub fn cursor_chars(&self) -> usize {
        self.text[..self.cursor].chars().count()
    }

    pub fn insert_char(&mut self, ch: char) {
        let ch = if ch.is_whitespace() { ' ' } else { ch };
        self.text.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    /// Pasted text arrives here; newlines and tabs become single spaces.
    pub fn insert_str(&mut self, text: &str) {
        let flattened = flatten_line(text);
        self.text.insert_str(self.cursor, &flattened);
        self.cursor += flattened.len();
    }

    pub fn backspace(&mut self) -> bool {
        let Some(start) = self.prev_boundary() else {
            return false;
        };
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    pub fn delete_forward(&mut self) -> bool {
        let Some(end) = self.next_boundary() else {
            return false;
        };
        self.text.replace_range(self.cursor..end, "");
        true
    }

    /// Removes the word left of the cursor along with any spaces after it.
    pub fn delete_word_back(&mut self) -> bool {
        let head = &self.text[..self.cursor];
        let without_spaces = head.trim_end_matches(' ');
        let start = without_spaces
            .rfind(' ')
            .map(|space| space + 1)
            .unwrap_or(0);
        if start == self.cursor {
            return false;
        }
        self.text.replace_range(start..self.cursor, "");
        self.cursor = start;
        true
    }

    pub fn clear(&mut self) -> bool {
        if self.text.is_empty() {
            return false;
        }
        self.text.clear();
        self.cursor = 0;
        true
    }

    pub fn move_left(&mut self) {
        if let Some(start) = self.prev_boundary() {
            self.cursor = start;
        }
    }

    pub fn move_right(&mut self) {
        if let Some(end) = self.next_boundary() {
            self.cursor = end;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.len();
    }

    fn prev_boundary(&self) -> Option<usize> {
        self.text[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(index, _)| index)
    }

    fn next_boundary(&self) -> Option<usize> {
        self.text[self.cursor..]
            .chars()
            .next()
            .map(|ch| self.cursor + ch.len_utf8())
    }
}

fn flatten_line(text: &str) -> String {
    text.chars()
        .map(|ch| if ch.is_whitespace() { ' ' } else { ch })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_multibyte_text_on_char_boundaries() {
        let mut editor = QueryEditor::default();
        editor.insert_str("añb");
        editor.move_left();
        editor.move_left();
        assert_eq!(editor.cursor_chars(), 1);
        assert!(editor.delete_forward());
        assert_eq!(editor.text(), "ab");
        editor.insert_char('λ');
        assert_eq!(editor.text(), "aλb");
        assert!(editor.backspace());
        assert_eq!(editor.text(), "ab");
        editor.move_home();
        assert!(!editor.backspace());
    }

    #[test]
    fn paste_flattens_line_breaks() {
        let mut editor = QueryEditor::from_text("deploy");
        editor.insert_str("\nerror\tlog");
        assert_eq!(editor.text(), "deploy error log");
    }

    #[test]
    fn delete_word_back_stops_at_previous_space() {
        let mut editor = QueryEditor::from_text("deploy error  ");
        assert!(editor.delete_word_back());
        assert_eq!(editor.text(), "deploy ");
        assert!(editor.delete_word_back());
        assert_eq!(editor.text(), "");
        assert!(!editor.delete_word_back());
    }
}
