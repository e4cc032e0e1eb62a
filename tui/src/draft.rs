//! Editable text fields.

use unicode_segmentation::UnicodeSegmentation;

/// Handles text editing with proper Unicode grapheme cluster support.
///
/// `cursor` counts graphemes, not bytes.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DraftInput {
    text: String,
    cursor: usize,
}

impl DraftInput {
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn take_text(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        self.cursor = self.clamp_cursor(self.cursor.saturating_add(1));
    }

    pub fn enter_char(&mut self, new_char: char) {
        let index = self.byte_index();
        self.text.insert(index, new_char);
        self.move_cursor_right();
    }

    pub fn enter_newline(&mut self) {
        self.enter_char('\n');
    }

    pub fn enter_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        let index = self.byte_index();
        self.text.insert_str(index, text);
        let inserted = text.graphemes(true).count();
        self.cursor = self.clamp_cursor(self.cursor.saturating_add(inserted));
    }

    pub fn delete_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let start = self.byte_index_at(self.cursor - 1);
        let end = self.byte_index_at(self.cursor);
        self.text.replace_range(start..end, "");
        self.move_cursor_left();
    }

    pub fn delete_char_forward(&mut self) {
        if self.cursor >= self.grapheme_count() {
            return;
        }
        let start = self.byte_index_at(self.cursor);
        let end = self.byte_index_at(self.cursor + 1);
        self.text.replace_range(start..end, "");
    }

    pub fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.grapheme_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.grapheme_count();
    }

    pub fn delete_word_backwards(&mut self) {
        while self.cursor > 0 && self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
        while self.cursor > 0 && !self.grapheme_is_whitespace(self.cursor - 1) {
            self.delete_char();
        }
    }

    #[must_use]
    pub fn grapheme_count(&self) -> usize {
        self.text.graphemes(true).count()
    }

    /// Text before the cursor. Used to place the terminal cursor.
    #[must_use]
    pub fn text_before_cursor(&self) -> &str {
        &self.text[..self.byte_index()]
    }

    fn grapheme_is_whitespace(&self, index: usize) -> bool {
        self.text
            .graphemes(true)
            .nth(index)
            .is_some_and(|grapheme| grapheme.chars().all(char::is_whitespace))
    }

    fn byte_index(&self) -> usize {
        self.byte_index_at(self.cursor)
    }

    fn byte_index_at(&self, grapheme_index: usize) -> usize {
        self.text
            .grapheme_indices(true)
            .nth(grapheme_index)
            .map_or(self.text.len(), |(i, _)| i)
    }

    fn clamp_cursor(&self, new_cursor_pos: usize) -> usize {
        new_cursor_pos.min(self.grapheme_count())
    }
}

#[cfg(test)]
mod tests {
    use super::DraftInput;

    #[test]
    fn edits_at_the_cursor() {
        let mut draft = DraftInput::default();
        draft.enter_text("helo");
        draft.move_cursor_left();
        draft.enter_char('l');
        assert_eq!(draft.text(), "hello");
        assert_eq!(draft.cursor(), 4);
        assert_eq!(draft.text_before_cursor(), "hell");
    }

    #[test]
    fn graphemes_are_deleted_whole() {
        let mut draft = DraftInput::default();
        draft.enter_text("ae\u{301}");
        assert_eq!(draft.grapheme_count(), 2);
        draft.delete_char();
        assert_eq!(draft.text(), "a");
    }

    #[test]
    fn delete_forward_and_bounds() {
        let mut draft = DraftInput::default();
        draft.set_text("abc");
        draft.delete_char_forward();
        assert_eq!(draft.text(), "abc");
        draft.reset_cursor();
        draft.delete_char_forward();
        assert_eq!(draft.text(), "bc");
        draft.delete_char();
        assert_eq!(draft.text(), "bc");
    }

    #[test]
    fn delete_word_backwards_skips_trailing_space() {
        let mut draft = DraftInput::default();
        draft.set_text("use a hash  ");
        draft.delete_word_backwards();
        assert_eq!(draft.text(), "use a ");
    }

    #[test]
    fn take_text_resets() {
        let mut draft = DraftInput::default();
        draft.set_text("  ");
        assert!(draft.is_blank());
        assert_eq!(draft.take_text(), "  ");
        assert_eq!(draft.cursor(), 0);
        assert!(draft.text().is_empty());
    }
}
