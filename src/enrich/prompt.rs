//! Prompt templates for the enrichment models.

use handlebars::Handlebars;

use crate::{config::EnrichConfig, prelude::*};

/// Template name for the description prompt.
const DESCRIPTION: &str = "description";

/// Template name for the image prompt.
const IMAGE: &str = "image";

/// Compiled prompt templates.
///
/// Prompts are plain text, so unlike our HTML page, nothing gets escaped.
pub struct PromptTemplates {
    handlebars: Handlebars<'static>,
}

impl PromptTemplates {
    /// Compile the prompts in `config`.
    pub fn new(config: &EnrichConfig) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.register_escape_fn(handlebars::no_escape);
        handlebars.set_strict_mode(true);
        handlebars
            .register_template_string(DESCRIPTION, &config.description_prompt)
            .context("Invalid description prompt template")?;
        handlebars
            .register_template_string(IMAGE, &config.image_prompt)
            .context("Invalid image prompt template")?;
        Ok(Self { handlebars })
    }

    /// The prompt asking for a description of `item`.
    pub fn description(&self, item: &str) -> Result<String> {
        self.render(DESCRIPTION, item)
    }

    /// The prompt asking for a picture of `item`.
    pub fn image(&self, item: &str) -> Result<String> {
        self.render(IMAGE, item)
    }

    fn render(&self, template: &str, item: &str) -> Result<String> {
        self.handlebars
            .render(template, &json!({ "item": item }))
            .with_context(|| format!("Failed to render {template} prompt"))
    }
}
