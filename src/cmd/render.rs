//! The `render` subcommand.

use clap::Args;

use crate::{
    async_utils::io::{read_json_or_toml, write_json_pretty},
    config::MenuConfig,
    enrich::{EnrichOpts, EnrichedRecord, check_failure_rate, enrich_menu},
    menu::MenuRecord,
    prelude::*,
    render::{ImageLinks, PageRenderer},
    store::{ImageKeys, StoreLocation},
    ui::{ProgressConfig, Ui},
};

/// Storage key for the rendered page.
const HTML_KEY: &str = "menu.html";

/// Storage key for the enriched records.
const JSON_KEY: &str = "menu.json";

/// Render command line arguments.
#[derive(Debug, Args)]
pub struct RenderOpts {
    /// Menu records, as written by `extract`.
    pub menu_path: PathBuf,

    /// Where to write the page and images: a local directory, or an
    /// `s3://bucket/prefix` URL.
    #[clap(long, value_name = "DIR_OR_S3_URL")]
    pub out_dir: StoreLocation,

    #[clap(flatten)]
    pub enrich: EnrichOpts,

    /// A Handlebars template to use instead of the built-in page.
    #[clap(long)]
    pub template: Option<PathBuf>,

    /// Embed images in the page as `data:` URLs instead of writing them
    /// as separate files.
    #[clap(long, conflicts_with = "image_base_url")]
    pub inline_images: bool,

    /// Link images at this URL instead of relative to the page, such as
    /// "https://my-bucket.s3.amazonaws.com/lunch".
    #[clap(long, value_name = "URL")]
    pub image_base_url: Option<String>,

    /// A TOML or JSON config file.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

/// What we stored, printed when we're done.
#[derive(Debug, Serialize)]
pub struct RenderSummary {
    /// Storage key of the rendered page.
    pub html_key: String,

    /// Storage keys of the item images, in menu order.
    pub image_keys: Vec<String>,
}

/// The `render` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_render(ui: &Ui, opts: &RenderOpts) -> Result<()> {
    let config = MenuConfig::load(opts.config.as_deref()).await?;
    let records = read_json_or_toml::<Vec<MenuRecord>>(&opts.menu_path).await?;

    // Check the template before we spend any money on model calls.
    let template = match &opts.template {
        Some(path) => Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read template at path: {:?}", path))?,
        ),
        None => None,
    };
    let renderer = PageRenderer::new(template.as_deref())?;
    let store = opts.out_dir.open().await?;

    let enricher = opts.enrich.enricher.create_enricher(&config.enrich).await?;
    let pb = ui.new_progress_bar(
        &ProgressConfig {
            emoji: "🍜",
            msg: "Enriching items",
            done_msg: "Enriched items",
        },
        records.len() as u64,
    );
    let mut enriched = enrich_menu(records, enricher, &opts.enrich, pb.clone()).await;
    pb.finish_using_style();

    let images = if opts.inline_images {
        ImageLinks::Inline
    } else if let Some(base) = &opts.image_base_url {
        ImageLinks::BaseUrl(base.clone())
    } else {
        ImageLinks::Relative
    };

    let mut image_keys = vec![];
    if images != ImageLinks::Inline {
        let mut keys = ImageKeys::default();
        for record in &mut enriched {
            let EnrichedRecord::Item(item) = record else {
                continue;
            };
            let Some(image) = &item.image else {
                continue;
            };
            let key = keys.key_for(&item.item, image.extension());
            store.put(&key, &image.data, &image.mime_type).await?;
            item.image_key = Some(key.clone());
            image_keys.push(key);
        }
    }

    let html = renderer.render(&config.render.title, &enriched, &images)?;
    let location = store.put(HTML_KEY, html.as_bytes(), "text/html").await?;
    info!(%location, images = image_keys.len(), "Rendered menu page");

    let json =
        serde_json::to_vec_pretty(&enriched).context("Failed to serialize menu")?;
    store.put(JSON_KEY, &json, "application/json").await?;

    let summary = RenderSummary {
        html_key: HTML_KEY.to_owned(),
        image_keys,
    };
    write_json_pretty(None, &summary).await?;

    // Everything is written, so report failures last.
    check_failure_rate(ui, &enriched, opts.enrich.allowed_failure_rate)
}
