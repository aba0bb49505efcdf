//! UTF-8 to UTF-16 offset mapping
//!
//! Ranges handed to the host are expressed in UTF-16 code units while
//! Rust strings are indexed by byte. The table maps every byte index of a
//! string to the UTF-16 index of the character containing it.

/// Byte offset to UTF-16 offset table for one string
#[derive(Debug, Clone)]
pub struct Utf16Offsets {
    table: Vec<usize>,
}

impl Utf16Offsets {
    /// Build the table for `text`
    pub fn new(text: &str) -> Self {
        let mut table = vec![0; text.len() + 1];
        let mut units = 0;
        for (byte_idx, ch) in text.char_indices() {
            for slot in &mut table[byte_idx..byte_idx + ch.len_utf8()] {
                *slot = units;
            }
            units += ch.len_utf16();
        }
        table[text.len()] = units;
        Self { table }
    }

    /// UTF-16 offset of a byte offset (clamped to the end of the text)
    pub fn to_utf16(&self, byte_pos: usize) -> usize {
        let last = self.table.len() - 1;
        self.table[byte_pos.min(last)]
    }

    /// Total length in UTF-16 code units
    pub fn utf16_len(&self) -> usize {
        self.table[self.table.len() - 1]
    }
}
