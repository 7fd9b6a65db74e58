//! "OCR" for text that was already recognized elsewhere.

use crate::{async_utils::io::read_lines, menu::TextLine, prelude::*};

use super::OcrEngine;

/// Treats each line of a UTF-8 text file as one recognized line.
#[derive(Debug)]
pub struct PlainTextOcrEngine;

#[async_trait]
impl OcrEngine for PlainTextOcrEngine {
    #[instrument(level = "debug", skip_all)]
    async fn recognize_lines(&self, path: Option<&Path>) -> Result<Vec<TextLine>> {
        let lines = read_lines(path).await?;
        debug!(count = lines.len(), "Read text lines");
        Ok(TextLine::from_strings(lines))
    }
}
