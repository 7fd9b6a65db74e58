//! Generating descriptions and images for menu items.
//!
//! Each item needs two independent model calls, and items don't depend on
//! each other, so we run items concurrently (up to `--jobs` at a time) while
//! keeping them in menu order. A failed call never aborts the run. It is
//! logged and recorded on the item, and the caller decides afterwards
//! whether too many items failed.

use std::sync::Arc;

use clap::{Args, ValueEnum};
use futures::{StreamExt as _, stream};
use indicatif::ProgressBar;
use leaky_bucket::RateLimiter;
use schemars::JsonSchema;

use crate::{
    config::EnrichConfig,
    menu::{MenuItem, MenuRecord},
    prelude::*,
    rate_limit::RateLimit,
    ui::Ui,
};

pub mod bedrock;
pub mod echo;
pub mod prompt;

/// The enrichers we support.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab-case")]
pub enum EnricherType {
    /// AWS Bedrock text and image models.
    #[default]
    Bedrock,

    /// Offline placeholder descriptions and images.
    Echo,
}

impl EnricherType {
    /// Instantiate an appropriate enricher.
    pub async fn create_enricher(
        &self,
        config: &EnrichConfig,
    ) -> Result<Arc<dyn Enricher>> {
        match self {
            EnricherType::Bedrock => Ok(Arc::new(
                bedrock::BedrockEnricher::new(config.clone()).await?,
            )),
            EnricherType::Echo => Ok(Arc::new(echo::EchoEnricher::new())),
        }
    }
}

/// Options controlling how we call the enricher.
#[derive(Args, Clone, Debug)]
pub struct EnrichOpts {
    /// Which enricher to use.
    #[clap(long, value_enum, default_value_t = EnricherType::default())]
    pub enricher: EnricherType,

    /// Max number of items to enrich at a time.
    #[clap(short = 'j', long = "jobs", default_value = "8")]
    pub job_count: usize,

    /// A rate limit for enrichment API requests, of the form "10/s" or
    /// "2000/m". Each item makes two requests.
    #[clap(long)]
    pub rate_limit: Option<RateLimit>,

    /// What portion of items may fail completely? Specified as a number
    /// between 0.0 and 1.0.
    #[clap(long, default_value = "0.01")]
    pub allowed_failure_rate: f32,
}

/// A generated image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    /// The MIME type of `data`.
    pub mime_type: String,

    /// The encoded image.
    pub data: Vec<u8>,
}

impl GeneratedImage {
    /// Wrap image data, guessing its MIME type. Defaults to PNG.
    pub fn sniff(data: Vec<u8>) -> Self {
        let mime_type = infer::get(&data)
            .map(|kind| kind.mime_type())
            .unwrap_or("image/png")
            .to_owned();
        Self { mime_type, data }
    }

    /// The usual file extension for this image, taken from the same
    /// content sniffing as [`GeneratedImage::sniff`].
    pub fn extension(&self) -> &'static str {
        infer::get(&self.data)
            .filter(|kind| kind.mime_type() == self.mime_type)
            .map(|kind| kind.extension())
            .unwrap_or(match self.mime_type.as_str() {
                "image/jpeg" => "jpg",
                "image/webp" => "webp",
                "image/gif" => "gif",
                "image/tiff" => "tif",
                _ => "png",
            })
    }
}

/// Interface to something that can describe and draw menu items.
#[async_trait]
pub trait Enricher: Send + Sync + 'static {
    /// Write a short description of an item.
    async fn describe(&self, name: &str) -> Result<String>;

    /// Draw a picture of an item.
    async fn illustrate(&self, name: &str) -> Result<GeneratedImage>;
}

/// How did enriching an item go?
#[derive(Clone, Copy, Debug, JsonSchema, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnrichStatus {
    /// We got both a description and an image.
    Ok,

    /// We got one of the two.
    Incomplete,

    /// We got neither.
    Failed,
}

/// A menu item with generated content.
#[derive(Clone, Debug, JsonSchema, Serialize)]
pub struct EnrichedItem {
    /// The item name.
    pub item: String,

    /// The price, as printed on the menu.
    pub price: String,

    /// The generated description, or the menu's own description if we
    /// couldn't generate one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// The description printed on the menu, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub menu_description: Option<String>,

    /// Where the generated image was stored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,

    /// How did enrichment go?
    pub status: EnrichStatus,

    /// Any errors that occurred during enrichment.
    pub errors: Vec<String>,

    /// The generated image, until it has been stored.
    #[serde(skip)]
    #[schemars(skip)]
    pub image: Option<GeneratedImage>,
}

/// A menu record after enrichment.
#[derive(Clone, Debug, JsonSchema, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EnrichedRecord {
    /// A section header, unchanged.
    Header { text: String },

    /// An enriched item.
    Item(EnrichedItem),
}

impl EnrichedRecord {
    /// Get the item, if this record is one.
    pub fn as_item(&self) -> Option<&EnrichedItem> {
        match self {
            EnrichedRecord::Item(item) => Some(item),
            EnrichedRecord::Header { .. } => None,
        }
    }
}

/// Enrich every item in a menu, preserving order.
#[instrument(level = "debug", skip_all, fields(records = records.len()))]
pub async fn enrich_menu(
    records: Vec<MenuRecord>,
    enricher: Arc<dyn Enricher>,
    opts: &EnrichOpts,
    progress: ProgressBar,
) -> Vec<EnrichedRecord> {
    let limiter = Arc::new(opts.rate_limit.as_ref().map(RateLimit::to_rate_limiter));
    let job_count = opts.job_count.max(1);

    let enriched = stream::iter(records)
        .map(|record| {
            let enricher = enricher.clone();
            let limiter = limiter.clone();
            async move {
                match record {
                    MenuRecord::Header { text } => EnrichedRecord::Header { text },
                    MenuRecord::Item(item) => EnrichedRecord::Item(
                        enrich_item(item, &*enricher, (*limiter).as_ref()).await,
                    ),
                }
            }
        })
        .buffered(job_count);
    progress.wrap_stream(enriched).collect().await
}

/// Wait for a rate limit token, if we have a limiter.
async fn throttle(limiter: Option<&RateLimiter>) {
    if let Some(limiter) = limiter {
        limiter.acquire_one().await;
    }
}

/// Generate a description and image for a single item.
#[instrument(level = "debug", skip_all, fields(item = %item.name))]
async fn enrich_item(
    item: MenuItem,
    enricher: &dyn Enricher,
    limiter: Option<&RateLimiter>,
) -> EnrichedItem {
    if item.name.is_empty() {
        warn!(price = %item.price, "Enriching an item with no name");
    }
    let (description, image) = tokio::join!(
        async {
            throttle(limiter).await;
            enricher.describe(&item.name).await
        },
        async {
            throttle(limiter).await;
            enricher.illustrate(&item.name).await
        },
    );

    let mut errors = vec![];
    let description = match description {
        Ok(description) => Some(description),
        Err(err) => {
            warn!(item = %item.name, "Could not generate description: {err:#}");
            errors.push(format!("description: {err:#}"));
            item.description.clone()
        }
    };
    let image = match image {
        Ok(image) => Some(image),
        Err(err) => {
            warn!(item = %item.name, "Could not generate image: {err:#}");
            errors.push(format!("image: {err:#}"));
            None
        }
    };

    EnrichedItem {
        item: item.name,
        price: item.price,
        description,
        menu_description: item.description,
        image_key: None,
        status: match errors.len() {
            0 => EnrichStatus::Ok,
            1 => EnrichStatus::Incomplete,
            _ => EnrichStatus::Failed,
        },
        errors,
        image,
    }
}

/// Report how enrichment went, and fail if too many items failed.
pub fn check_failure_rate(
    ui: &Ui,
    records: &[EnrichedRecord],
    allowed_failure_rate: f32,
) -> Result<()> {
    let items = records.iter().filter_map(EnrichedRecord::as_item);
    let (mut total, mut failed, mut incomplete) = (0usize, 0usize, 0usize);
    for item in items {
        total += 1;
        match item.status {
            EnrichStatus::Ok => {}
            EnrichStatus::Incomplete => incomplete += 1,
            EnrichStatus::Failed => failed += 1,
        }
    }
    if total == 0 {
        return Ok(());
    }

    let failure_rate = failed as f32 / total as f32;
    if failure_rate > allowed_failure_rate {
        return Err(anyhow!(
            "{}/{} ({:.2}%) of items could not be enriched, but only {:.2}% were allowed",
            failed,
            total,
            failure_rate * 100.0,
            allowed_failure_rate * 100.0
        ));
    }
    if incomplete > 0 {
        ui.display_message(
            "⚠️",
            &format!("{incomplete} items are missing a description or image"),
        );
    }
    if failed > 0 {
        ui.display_message("❌", &format!("{failed} items could not be enriched"));
    }
    Ok(())
}
