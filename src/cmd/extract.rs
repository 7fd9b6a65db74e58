//! The `extract` subcommand.

use clap::Args;

use crate::{
    async_utils::io::write_json_pretty,
    config::MenuConfig,
    menu::{MultiplePricePolicy, Segmenter},
    ocr::OcrEngineType,
    prelude::*,
    store::{ArtifactStore as _, S3Store, S3Url, StoreLocation},
    ui::{ProgressConfig, Ui},
};

/// Extract command line arguments.
#[derive(Debug, Args)]
pub struct ExtractOpts {
    /// A menu image or PDF, or a text file for `--engine plain-text`.
    /// Defaults to standard input.
    pub input_path: Option<PathBuf>,

    /// The OCR engine to use.
    #[clap(long, value_enum, default_value_t = OcrEngineType::default())]
    pub engine: OcrEngineType,

    /// Only accept prices that start with "$".
    #[clap(long, overrides_with = "no_strict_prices")]
    pub strict_prices: bool,

    /// Accept any number as a price, even if the config file says
    /// otherwise.
    #[clap(long, overrides_with = "strict_prices")]
    pub no_strict_prices: bool,

    /// What to do with lines containing more than one price.
    #[clap(long, value_enum)]
    pub multiple_prices: Option<MultiplePricePolicy>,

    /// A TOML or JSON config file.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Where to write the menu records: a file, or an `s3://bucket/key`
    /// URL. A URL ending in "/" gets "<input name>.json" appended. Defaults
    /// to standard output.
    #[clap(short = 'o', long = "out", value_name = "PATH_OR_S3_URL")]
    pub output_path: Option<StoreLocation>,
}

impl ExtractOpts {
    /// The `--strict-prices` setting, if either flag was given.
    fn strict_prices(&self) -> Option<bool> {
        match (self.strict_prices, self.no_strict_prices) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

/// The object key for extracted records, filling in a file name if `url`
/// names a prefix.
fn records_key(url: &S3Url, input_path: Option<&Path>) -> String {
    if url.key.is_empty() || url.key.ends_with('/') {
        let stem = input_path
            .and_then(|path| path.file_stem())
            .map(|stem| stem.to_string_lossy())
            .unwrap_or("menu".into());
        format!("{}{}.json", url.key, stem)
    } else {
        url.key.clone()
    }
}

/// The `extract` subcommand.
#[instrument(level = "debug", skip_all)]
pub async fn cmd_extract(ui: &Ui, opts: &ExtractOpts) -> Result<()> {
    let config = MenuConfig::load(opts.config.as_deref()).await?;
    let segment_opts = config
        .segment
        .with_overrides(opts.strict_prices(), opts.multiple_prices);
    let engine = opts.engine.create_engine().await?;

    let spinner = ui.new_spinner(&ProgressConfig {
        emoji: "🔍",
        msg: "Reading menu",
        done_msg: "Read menu",
    });
    let mut lines = engine.recognize_lines(opts.input_path.as_deref()).await?;
    spinner.finish_using_style();
    debug!(lines = lines.len(), "Recognized text");
    lines.sort_by_key(|line| line.order);

    let records = Segmenter::new(&segment_opts).segment(&lines);
    info!(
        records = records.len(),
        items = records.iter().filter(|r| r.as_item().is_some()).count(),
        "Extracted menu"
    );

    match &opts.output_path {
        None => write_json_pretty(None, &records).await,
        Some(StoreLocation::Local(path)) => {
            write_json_pretty(Some(path.as_path()), &records).await
        }
        Some(StoreLocation::S3(url)) => {
            let key = records_key(url, opts.input_path.as_deref());
            let mut json = serde_json::to_vec_pretty(&records)
                .context("Failed to serialize menu records")?;
            json.push(b'\n');
            let store = S3Store::new(&url.bucket, "").await?;
            let location = store.put(&key, &json, "application/json").await?;
            info!(%location, "Stored menu records");
            Ok(())
        }
    }
}
