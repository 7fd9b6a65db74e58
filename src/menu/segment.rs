//! Splitting recognized menu text into headers, items and descriptions.
//!
//! The input is just a sequence of lines. We walk it once, keeping at most
//! one "open" item, and use the presence of a price to decide what each line
//! is:
//!
//! - A line with a price closes any open item and opens a new one. The price
//!   is cut out of the line, and what remains is the item name.
//! - A line without a price is part of the open item's description. If no
//!   item is open yet, it's a section header.
//! - Blank lines are OCR noise and are dropped.
//!
//! Price detection is deliberately loose by default: any number counts, so
//! "Open 24/7" becomes an item named "Open /7" priced at "24". Callers who
//! know their menus always use `$` can turn on [`PriceStrictness::CurrencySymbol`].
//! Similarly, "Serves 2, $15.99" is priced at "2" unless
//! [`MultiplePricePolicy::TreatAsText`] is selected.

use std::sync::LazyLock;

use clap::ValueEnum;
use regex::{Match, Regex};
use schemars::JsonSchema;

use crate::prelude::*;

use super::record::{MenuItem, MenuRecord};

/// A price with an optional `$`: `$10.99`, `10.99`, `$10`, `10.`.
static PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$?\d+\.?\d*").expect("failed to compile regex"));

/// Is `s` exactly one price, as the permissive pattern would find it?
pub(crate) fn is_price_token(s: &str) -> bool {
    PRICE_RE
        .find(s)
        .is_some_and(|m| m.start() == 0 && m.end() == s.len())
}

/// A price with a mandatory `$`.
static DOLLAR_PRICE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\d+\.?\d*").expect("failed to compile regex"));

/// Which numbers count as prices?
#[derive(
    Clone, Copy, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq, Serialize,
)]
#[serde(rename_all = "snake_case")]
pub enum PriceStrictness {
    /// Any number, with or without a leading `$`.
    #[default]
    Permissive,

    /// Only numbers with a leading `$`.
    CurrencySymbol,
}

impl PriceStrictness {
    /// The regex used to both detect and extract prices.
    fn regex(self) -> &'static Regex {
        match self {
            PriceStrictness::Permissive => &PRICE_RE,
            PriceStrictness::CurrencySymbol => &DOLLAR_PRICE_RE,
        }
    }
}

/// What should we do with a line that contains more than one price?
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    JsonSchema,
    PartialEq,
    Eq,
    Serialize,
    ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
#[clap(rename_all = "kebab-case")]
pub enum MultiplePricePolicy {
    /// Use the leftmost price, and cut it out of the item name.
    #[default]
    First,

    /// Don't guess. Treat the whole line as text with no price.
    TreatAsText,
}

/// Segmentation settings, as found in the `[segment]` section of a config
/// file.
#[derive(Clone, Debug, Default, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct SegmentOpts {
    /// Only treat numbers with a `$` prefix as prices.
    pub strict_prices: bool,

    /// How to handle lines with more than one price.
    pub multiple_prices: MultiplePricePolicy,
}

impl SegmentOpts {
    /// Apply command-line overrides to settings from a config file.
    pub fn with_overrides(
        mut self,
        strict_prices: Option<bool>,
        multiple_prices: Option<MultiplePricePolicy>,
    ) -> Self {
        if let Some(strict_prices) = strict_prices {
            self.strict_prices = strict_prices;
        }
        if let Some(policy) = multiple_prices {
            self.multiple_prices = policy;
        }
        self
    }

    /// The price strictness implied by these settings.
    pub fn strictness(&self) -> PriceStrictness {
        if self.strict_prices {
            PriceStrictness::CurrencySymbol
        } else {
            PriceStrictness::Permissive
        }
    }
}

/// Turns a sequence of text lines into [`MenuRecord`]s.
///
/// This is a pure function of its settings and input, so a single
/// `Segmenter` may be reused freely.
#[derive(Clone, Copy, Debug, Default)]
pub struct Segmenter {
    strictness: PriceStrictness,
    multiple_prices: MultiplePricePolicy,
}

impl Segmenter {
    /// Create a new segmenter.
    pub fn new(opts: &SegmentOpts) -> Self {
        Self {
            strictness: opts.strictness(),
            multiple_prices: opts.multiple_prices,
        }
    }

    /// Find the price in a line, if the line has one.
    pub fn find_price<'a>(&self, line: &'a str) -> Option<Match<'a>> {
        let mut matches = self.strictness.regex().find_iter(line);
        let first = matches.next()?;
        if self.multiple_prices == MultiplePricePolicy::TreatAsText
            && matches.next().is_some()
        {
            trace!(line, "Ignoring ambiguous prices");
            return None;
        }
        Some(first)
    }

    /// Segment lines into menu records.
    ///
    /// The output never has more records than there are input lines.
    pub fn segment<I, S>(&self, lines: I) -> Vec<MenuRecord>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut output = Vec::new();
        let mut open: Option<OpenItem> = None;

        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }

            if let Some(price) = self.find_price(line) {
                if let Some(item) = open.take() {
                    item.flush(&mut output);
                }
                let name = remove_match(line, &price);
                trace!(%name, price = price.as_str(), "Item");
                open = Some(OpenItem::new(name, price.as_str().to_owned()));
            } else if let Some(item) = open.as_mut() {
                trace!(line, "Description");
                item.description.push(line.to_owned());
            } else {
                trace!(line, "Header");
                output.push(MenuRecord::header(line));
            }
        }

        if let Some(item) = open {
            item.flush(&mut output);
        }
        debug!(records = output.len(), "Segmented menu");
        output
    }
}

/// An item we're still collecting description lines for.
struct OpenItem {
    item: MenuItem,
    description: Vec<String>,
}

impl OpenItem {
    fn new(name: String, price: String) -> Self {
        Self {
            item: MenuItem {
                name,
                price,
                description: None,
            },
            description: vec![],
        }
    }

    /// Attach our description and append the item to `output`.
    fn flush(mut self, output: &mut Vec<MenuRecord>) {
        if !self.description.is_empty() {
            self.item.description = Some(self.description.join(" "));
        }
        output.push(MenuRecord::Item(self.item));
    }
}

/// Cut `m` out of `line` at the position it matched, and trim the rest.
fn remove_match(line: &str, m: &Match<'_>) -> String {
    let mut name = String::with_capacity(line.len() - m.len());
    name.push_str(&line[..m.start()]);
    name.push_str(&line[m.end()..]);
    name.trim().to_owned()
}
