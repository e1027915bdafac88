//! The single editable text buffer.

use serde::{Deserialize, Serialize};

/// Whole-document text with an optional logical cursor (a char offset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    cursor: Option<usize>,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Replace the whole buffer; a tracked cursor is clamped to the new length.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let len = self.char_len();
        self.cursor = self.cursor.map(|offset| offset.min(len));
    }

    /// Run a whole-buffer transform and store its output.
    pub fn apply(&mut self, transform: impl FnOnce(&str) -> String) {
        let next = transform(&self.text);
        self.replace(next);
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = self.cursor.map(|_| 0);
    }

    /// Track (or forget) the cursor; offsets past the end clamp to the end.
    pub fn set_cursor(&mut self, cursor: Option<usize>) {
        let len = self.char_len();
        self.cursor = cursor.map(|offset| offset.min(len));
    }

    /// Insert at the tracked cursor and move it past the insertion, or
    /// append when no cursor is tracked.
    pub fn insert_at_cursor(&mut self, snippet: &str) {
        match self.cursor {
            Some(offset) => {
                let byte = self
                    .text
                    .char_indices()
                    .nth(offset)
                    .map(|(idx, _)| idx)
                    .unwrap_or(self.text.len());
                self.text.insert_str(byte, snippet);
                self.cursor = Some(offset + snippet.chars().count());
            }
            None => self.text.push_str(snippet),
        }
    }
}
