//! Optional configuration file.
//!
//! Everything here has a sensible default, so a config file is only needed
//! to change models, prompts or the page title. Config files may be TOML or
//! JSON:
//!
//! ```toml
//! [segment]
//! strict_prices = true
//!
//! [enrich]
//! text_model = "us.amazon.nova-pro-v1:0"
//! description_prompt = "Describe {{item}} in one sentence."
//!
//! [render]
//! title = "Lunch at Rosa's"
//! ```

use schemars::JsonSchema;

use crate::{async_utils::io::read_json_or_toml, menu::SegmentOpts, prelude::*};

/// Top-level configuration.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct MenuConfig {
    /// How to split text into menu records.
    pub segment: SegmentOpts,

    /// How to generate descriptions and images.
    pub enrich: EnrichConfig,

    /// How to render the menu page.
    pub render: RenderConfig,
}

impl MenuConfig {
    /// Load configuration from `path`, or use the defaults.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let config = read_json_or_toml::<MenuConfig>(path).await?;
                debug!(?config, "Loaded config");
                Ok(config)
            }
            None => Ok(MenuConfig::default()),
        }
    }
}

/// Settings for the enrichment models.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichConfig {
    /// Bedrock model used to write item descriptions.
    pub text_model: String,

    /// Bedrock model used to draw item images.
    pub image_model: String,

    /// Handlebars template for the description prompt. `{{item}}` is the
    /// item name.
    pub description_prompt: String,

    /// Handlebars template for the image prompt. `{{item}}` is the item name.
    pub image_prompt: String,

    /// Image quality requested from the image model.
    pub image_quality: String,

    /// Image width, in pixels.
    pub image_width: u32,

    /// Image height, in pixels.
    pub image_height: u32,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self {
            text_model: "us.amazon.nova-lite-v1:0".to_owned(),
            image_model: "amazon.nova-canvas-v1:0".to_owned(),
            description_prompt: "Write a concise description for a menu item called \
                '{{item}}'. This is to display in an online ordering webpage. \
                Don't repeat the item name at the beginning of the description."
                .to_owned(),
            image_prompt: "A studio-quality photo of {{item}}, restaurant menu style."
                .to_owned(),
            image_quality: "standard".to_owned(),
            image_width: 512,
            image_height: 512,
        }
    }
}

/// Settings for the rendered page.
#[derive(Clone, Debug, Deserialize, JsonSchema)]
#[serde(default, deny_unknown_fields)]
pub struct RenderConfig {
    /// The page title and heading.
    pub title: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            title: "Our Menu".to_owned(),
        }
    }
}
