//! Rendering enriched menus as an HTML page.
//!
//! Records are grouped into sections: each header starts a new section, and
//! any items before the first header go into an untitled section. All text
//! is HTML-escaped by Handlebars.

use handlebars::Handlebars;

use crate::{
    data_url::data_url,
    enrich::{EnrichedItem, EnrichedRecord},
    prelude::*,
};

/// Our built-in page template.
const DEFAULT_TEMPLATE: &str = include_str!("menu.hbs");

/// Name under which we register the page template.
const PAGE: &str = "page";

/// Everything the template can see.
#[derive(Debug, Serialize)]
struct PageContext<'a> {
    title: &'a str,
    sections: Vec<Section<'a>>,
}

/// A header and the items that follow it.
#[derive(Debug, Default, Serialize)]
struct Section<'a> {
    heading: Option<&'a str>,
    items: Vec<Card<'a>>,
}

/// How item cards link to their images.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ImageLinks {
    /// Use the storage key as a relative URL.
    #[default]
    Relative,

    /// Prefix storage keys with a base URL, such as a bucket's website.
    BaseUrl(String),

    /// Embed images as `data:` URLs.
    Inline,
}

impl ImageLinks {
    /// The `src` for an item's image, if it has one.
    fn src_for(&self, item: &EnrichedItem) -> Option<String> {
        match (self, &item.image, &item.image_key) {
            (ImageLinks::Inline, Some(image), _) => {
                Some(data_url(&image.mime_type, &image.data))
            }
            (ImageLinks::BaseUrl(base), _, Some(key)) => {
                Some(format!("{}/{}", base.trim_end_matches('/'), key))
            }
            (_, _, Some(key)) => Some(key.clone()),
            _ => None,
        }
    }
}

/// A single item card.
#[derive(Debug, Serialize)]
struct Card<'a> {
    name: &'a str,
    price: &'a str,
    description: Option<&'a str>,
    image_src: Option<String>,
}

impl<'a> Card<'a> {
    fn new(item: &'a EnrichedItem, images: &ImageLinks) -> Self {
        Self {
            name: &item.item,
            price: &item.price,
            description: item.description.as_deref(),
            image_src: images.src_for(item),
        }
    }
}

/// Renders menu pages.
pub struct PageRenderer {
    handlebars: Handlebars<'static>,
}

impl PageRenderer {
    /// Create a renderer using `template`, or our built-in template.
    pub fn new(template: Option<&str>) -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars
            .register_template_string(PAGE, template.unwrap_or(DEFAULT_TEMPLATE))
            .context("Invalid page template")?;
        Ok(Self { handlebars })
    }

    /// Render a page, linking images as described by `images`.
    #[instrument(level = "debug", skip(self, records))]
    pub fn render(
        &self,
        title: &str,
        records: &[EnrichedRecord],
        images: &ImageLinks,
    ) -> Result<String> {
        let mut sections: Vec<Section<'_>> = vec![];
        for record in records {
            match record {
                EnrichedRecord::Header { text } => sections.push(Section {
                    heading: Some(text),
                    items: vec![],
                }),
                EnrichedRecord::Item(item) => {
                    if sections.is_empty() {
                        sections.push(Section::default());
                    }
                    if let Some(section) = sections.last_mut() {
                        section.items.push(Card::new(item, images));
                    }
                }
            }
        }
        let context = PageContext { title, sections };
        self.handlebars
            .render(PAGE, &context)
            .context("Failed to render menu page")
    }
}

#[cfg(test)]
mod tests {
    use crate::enrich::{EnrichStatus, GeneratedImage};

    use super::*;

    fn item(name: &str, image_key: Option<&str>) -> EnrichedRecord {
        EnrichedRecord::Item(EnrichedItem {
            item: name.to_owned(),
            price: "$5".to_owned(),
            description: Some(format!("All about {name}")),
            menu_description: None,
            image_key: image_key.map(str::to_owned),
            status: EnrichStatus::Ok,
            errors: vec![],
            image: Some(GeneratedImage {
                mime_type: "image/png".to_owned(),
                data: b"png".to_vec(),
            }),
        })
    }

    #[test]
    fn groups_items_under_headers() {
        let renderer = PageRenderer::new(None).unwrap();
        let records = vec![
            item("House Salad", Some("images/house_salad.png")),
            EnrichedRecord::Header {
                text: "SOUPS".to_owned(),
            },
            item("Pho", Some("images/pho.png")),
        ];
        let html = renderer.render("Our Menu", &records, &ImageLinks::Relative).unwrap();
        assert!(html.contains("<title>Our Menu</title>"));
        assert_eq!(html.matches("<section>").count(), 2);
        assert!(html.contains("<h2>SOUPS</h2>"));
        assert!(html.contains(r#"<img src="images/pho.png""#));
        let salad = html.find("House Salad").unwrap();
        let soups = html.find("SOUPS").unwrap();
        assert!(salad < soups);
    }

    #[test]
    fn escapes_text() {
        let renderer = PageRenderer::new(None).unwrap();
        let records = vec![item("<script>alert(1)</script>", None)];
        let html = renderer.render("Bob & Sons", &records, &ImageLinks::Relative).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Bob &amp; Sons"));
        assert!(!html.contains("<img"));
    }

    #[test]
    fn inlines_images_on_request() {
        let renderer = PageRenderer::new(None).unwrap();
        let records = vec![item("Pho", Some("images/pho.png"))];
        let html = renderer.render("Menu", &records, &ImageLinks::Inline).unwrap();
        assert!(html.contains("data:image/png;base64,cG5n"));
        assert!(!html.contains("images/pho.png"));
    }

    #[test]
    fn prefixes_image_keys_with_base_url() {
        let renderer = PageRenderer::new(None).unwrap();
        let records = vec![item("Pho", Some("images/pho.png")), item("Tea", None)];
        let images = ImageLinks::BaseUrl("https://menus.s3.amazonaws.com/lunch/".to_owned());
        let html = renderer.render("Menu", &records, &images).unwrap();
        assert!(html.contains(
            r#"src="https://menus.s3.amazonaws.com/lunch/images/pho.png""#
        ));
        assert_eq!(html.matches("<img").count(), 1);
    }

    #[test]
    fn custom_templates() {
        let renderer =
            PageRenderer::new(Some("{{#each sections}}{{#each items}}{{name}};{{/each}}{{/each}}"))
                .unwrap();
        let records = vec![item("A", None), item("B", None)];
        assert_eq!(renderer.render("x", &records, &ImageLinks::default()).unwrap(), "A;B;");
        assert!(PageRenderer::new(Some("{{#each sections}}")).is_err());
    }
}
