//! Enrichment using AWS Bedrock.
//!
//! Descriptions come from a text model via the Converse API. Images come
//! from an image model (Nova Canvas, by default) via InvokeModel, which
//! takes and returns model-specific JSON.

use aws_sdk_bedrockruntime::{
    Client,
    primitives::Blob,
    types::{ContentBlock, ConversationRole, Message},
};
use base64::{Engine as _, prelude::BASE64_STANDARD};

use crate::{aws::load_aws_config, config::EnrichConfig, prelude::*};

use super::{Enricher, GeneratedImage, prompt::PromptTemplates};

/// Largest seed accepted by Nova Canvas.
const MAX_IMAGE_SEED: u32 = 858_993_460;

/// Enricher backed by Bedrock models.
pub struct BedrockEnricher {
    /// The Bedrock client.
    client: Client,

    /// Model names and image settings.
    config: EnrichConfig,

    /// Our compiled prompts.
    prompts: PromptTemplates,
}

impl BedrockEnricher {
    /// Create a new Bedrock enricher.
    pub async fn new(config: EnrichConfig) -> Result<Self> {
        let prompts = PromptTemplates::new(&config)?;
        let aws_config = load_aws_config().await?;
        Ok(Self {
            client: Client::new(&aws_config),
            config,
            prompts,
        })
    }

    /// Build the InvokeModel body for a `TEXT_IMAGE` request.
    fn image_request(&self, prompt: &str, seed: u32) -> Value {
        json!({
            "taskType": "TEXT_IMAGE",
            "textToImageParams": { "text": prompt },
            "imageGenerationConfig": {
                "seed": seed,
                "quality": self.config.image_quality,
                "height": self.config.image_height,
                "width": self.config.image_width,
                "numberOfImages": 1,
            },
        })
    }
}

#[async_trait]
impl Enricher for BedrockEnricher {
    #[instrument(level = "debug", skip(self))]
    async fn describe(&self, name: &str) -> Result<String> {
        let prompt = self.prompts.description(name)?;
        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(prompt))
            .build()
            .context("Cannot build Bedrock message")?;

        let output = self
            .client
            .converse()
            .model_id(&self.config.text_model)
            .messages(message)
            .send()
            .await
            .context("Bedrock Converse error")?;
        trace!(?output, "Converse response");

        let message = output
            .output()
            .ok_or_else(|| anyhow!("Bedrock response did not contain any output"))?
            .as_message()
            .map_err(|_| anyhow!("Bedrock response did not contain a message"))?;
        let text = message
            .content()
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text(text) => Some(text.trim()),
                _ => None,
            })
            .ok_or_else(|| anyhow!("Bedrock response did not contain any text"))?;
        if text.is_empty() {
            return Err(anyhow!("Bedrock returned an empty description"));
        }
        debug!(%text, "Generated description");
        Ok(text.to_owned())
    }

    #[instrument(level = "debug", skip(self))]
    async fn illustrate(&self, name: &str) -> Result<GeneratedImage> {
        let prompt = self.prompts.image(name)?;
        let request = self.image_request(&prompt, fastrand::u32(0..=MAX_IMAGE_SEED));
        let body =
            serde_json::to_vec(&request).context("Failed to serialize image request")?;

        let output = self
            .client
            .invoke_model()
            .model_id(&self.config.image_model)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .context("Bedrock InvokeModel error")?;
        parse_image_response(output.body().as_ref())
    }
}

/// Body returned by Nova Canvas.
#[derive(Deserialize)]
struct ImageResponse {
    /// Base64-encoded images.
    #[serde(default)]
    images: Vec<String>,

    /// Set if the model refused or failed.
    #[serde(default)]
    error: Option<String>,
}

/// Extract the first image from an image model response.
fn parse_image_response(body: &[u8]) -> Result<GeneratedImage> {
    let response: ImageResponse = serde_json::from_slice(body)
        .context("Failed to parse Bedrock image response as JSON")?;
    if let Some(error) = response.error {
        return Err(anyhow!("Bedrock image model error: {error}"));
    }
    let encoded = response
        .images
        .first()
        .ok_or_else(|| anyhow!("Bedrock image response did not contain any images"))?;
    let data = BASE64_STANDARD
        .decode(encoded)
        .context("Bedrock image was not valid base64")?;
    Ok(GeneratedImage::sniff(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_image() {
        let png = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        let body = json!({ "images": [BASE64_STANDARD.encode(png), "ignored"] });
        let image = parse_image_response(body.to_string().as_bytes()).unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, png);
    }

    #[test]
    fn reports_model_errors() {
        let body = json!({ "images": [], "error": "content filtered" });
        let err = parse_image_response(body.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("content filtered"));
    }

    #[test]
    fn rejects_empty_and_malformed_responses() {
        assert!(parse_image_response(br#"{"images": []}"#).is_err());
        assert!(parse_image_response(br#"{"images": ["%%%"]}"#).is_err());
        assert!(parse_image_response(b"<html>").is_err());
    }
}
