//! Menu structure recovered from recognized text.
//!
//! OCR gives us a flat list of lines. Menus have an implicit structure of
//! section headers, priced items and item descriptions, but nothing in the
//! text marks which line is which. [`segment::Segmenter`] recovers that
//! structure, and [`record::MenuRecord`] is what it produces.

pub mod record;
pub mod segment;

pub use self::{
    record::{MenuItem, MenuRecord},
    segment::{MultiplePricePolicy, SegmentOpts, Segmenter},
};

/// A single line of recognized text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextLine {
    /// Position of this line in the recognized sequence.
    pub order: usize,

    /// The text of the line, exactly as recognized.
    pub content: String,
}

impl TextLine {
    /// Number a sequence of strings as text lines, in order.
    pub fn from_strings<I, S>(lines: I) -> Vec<TextLine>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        lines
            .into_iter()
            .enumerate()
            .map(|(order, content)| TextLine {
                order,
                content: content.into(),
            })
            .collect()
    }
}

impl AsRef<str> for TextLine {
    fn as_ref(&self) -> &str {
        &self.content
    }
}
