//! OCR engine interface.
//!
//! Every engine produces the same thing: an ordered list of [`TextLine`]s,
//! which is all the segmenter needs.

use clap::ValueEnum;

use crate::{menu::TextLine, prelude::*};

pub mod plain_text;
pub mod textract;

/// The OCR engines we support.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum OcrEngineType {
    /// AWS Textract. Accepts JPEG, PNG, TIFF and PDF files.
    #[default]
    Textract,

    /// Read text that has already been recognized, one line per line.
    PlainText,
}

impl OcrEngineType {
    /// Instantiate an appropriate engine.
    pub async fn create_engine(&self) -> Result<Box<dyn OcrEngine>> {
        match self {
            OcrEngineType::Textract => {
                Ok(Box::new(textract::TextractOcrEngine::new().await?))
            }
            OcrEngineType::PlainText => Ok(Box::new(plain_text::PlainTextOcrEngine)),
        }
    }
}

/// Interface to an OCR engine.
#[async_trait]
pub trait OcrEngine: Send + Sync + 'static {
    /// Recognize the lines of text in a file, or in standard input if
    /// `path` is `None`.
    async fn recognize_lines(&self, path: Option<&Path>) -> Result<Vec<TextLine>>;
}
