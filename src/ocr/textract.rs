//! OCR using AWS Textract.

use aws_sdk_textract::{
    primitives::Blob,
    types::{Block, BlockType, Document},
};

use crate::{aws::load_aws_config, menu::TextLine, prelude::*};

use super::OcrEngine;

/// MIME types that Textract's synchronous API will accept.
const SUPPORTED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/tiff", "application/pdf"];

/// OCR engine wrapping the AWS Textract API.
#[derive(Debug)]
pub struct TextractOcrEngine {
    /// AWS Textract client.
    client: aws_sdk_textract::Client,
}

impl TextractOcrEngine {
    /// Create a new `textract` engine.
    pub async fn new() -> Result<Self> {
        let config = load_aws_config().await?;
        Ok(Self {
            client: aws_sdk_textract::Client::new(&config),
        })
    }
}

#[async_trait]
impl OcrEngine for TextractOcrEngine {
    #[instrument(level = "debug", skip_all)]
    async fn recognize_lines(&self, path: Option<&Path>) -> Result<Vec<TextLine>> {
        let path = path
            .ok_or_else(|| anyhow!("Textract needs an image file, not standard input"))?;
        let data = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read image at path: {:?}", path))?;
        check_supported_format(&data)
            .with_context(|| format!("Cannot send {:?} to Textract", path))?;

        let document = Document::builder().bytes(Blob::new(data)).build();
        let output = self
            .client
            .detect_document_text()
            .document(document)
            .send()
            .await
            .context("AWS Textract error")?;
        trace!("Document response: {output:#?}");

        let lines = lines_from_blocks(output.blocks());
        info!(path = %path.display(), count = lines.len(), "Recognized text lines");
        Ok(lines)
    }
}

/// Make sure `data` is something Textract can read.
fn check_supported_format(data: &[u8]) -> Result<()> {
    match infer::get(data) {
        Some(kind) if SUPPORTED_MIME_TYPES.contains(&kind.mime_type()) => Ok(()),
        Some(kind) => Err(anyhow!("Unsupported file type: {}", kind.mime_type())),
        None => Err(anyhow!("Unknown file type")),
    }
}

/// Collect the `LINE` blocks of a Textract response, in response order.
fn lines_from_blocks(blocks: &[Block]) -> Vec<TextLine> {
    let texts = blocks
        .iter()
        .filter(|block| block.block_type() == Some(&BlockType::Line))
        .filter_map(|block| block.text())
        .map(str::to_owned);
    TextLine::from_strings(texts)
}
