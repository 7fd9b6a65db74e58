//! Menu records and their JSON format.
//!
//! On the wire, a menu is a JSON array whose elements look like either of:
//!
//! ```json
//! {"type": "header", "text": "APPETIZERS"}
//! {"item": "Spring Rolls", "price": "$6.99", "description": "Crispy"}
//! ```
//!
//! The `description` field is omitted when there is none, and an item's
//! `price` must be a single price token such as `$6.99` or `12`. Items carry no
//! `type` field, which is why we serialize through [`WireRecord`] instead of
//! using one of serde's built-in enum representations.

use schemars::{JsonSchema, r#gen::SchemaGenerator, schema::Schema};

use crate::prelude::*;

use super::segment::is_price_token;

/// One element of a segmented menu.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "WireRecord", into = "WireRecord")]
pub enum MenuRecord {
    /// A section header, such as "APPETIZERS".
    Header { text: String },

    /// A priced item.
    Item(MenuItem),
}

impl MenuRecord {
    /// Create a new header record.
    pub fn header(text: impl Into<String>) -> Self {
        MenuRecord::Header { text: text.into() }
    }

    /// Get the item, if this record is one.
    pub fn as_item(&self) -> Option<&MenuItem> {
        match self {
            MenuRecord::Item(item) => Some(item),
            MenuRecord::Header { .. } => None,
        }
    }
}

impl JsonSchema for MenuRecord {
    fn schema_name() -> String {
        "MenuRecord".to_owned()
    }

    fn json_schema(generator: &mut SchemaGenerator) -> Schema {
        WireRecord::json_schema(generator)
    }
}

/// A priced menu item.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, JsonSchema, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MenuItem {
    /// The item name, with the price removed.
    #[serde(rename = "item")]
    pub name: String,

    /// The price, exactly as it appeared on the menu (e.g. "$6.99" or "12").
    pub price: String,

    /// Any description lines following the item, joined with spaces.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `"type"` marker carried by header records.
#[derive(Clone, Copy, Debug, Deserialize, JsonSchema, Serialize)]
#[serde(rename_all = "snake_case")]
enum HeaderTag {
    Header,
}

/// JSON representation of [`MenuRecord`].
#[derive(Clone, Debug, Deserialize, JsonSchema, Serialize)]
#[serde(untagged)]
enum WireRecord {
    /// A section header.
    Header { r#type: HeaderTag, text: String },

    /// A priced item.
    Item(MenuItem),
}

impl TryFrom<WireRecord> for MenuRecord {
    type Error = anyhow::Error;

    fn try_from(wire: WireRecord) -> Result<Self> {
        match wire {
            WireRecord::Header { text, .. } => Ok(MenuRecord::Header { text }),
            WireRecord::Item(mut item) => {
                if !is_price_token(&item.price) {
                    return Err(anyhow!(
                        "Item {:?} has invalid price {:?}",
                        item.name,
                        item.price
                    ));
                }
                // Hand-edited menus sometimes carry `"description": ""`.
                if item.description.as_deref() == Some("") {
                    item.description = None;
                }
                Ok(MenuRecord::Item(item))
            }
        }
    }
}

impl From<MenuRecord> for WireRecord {
    fn from(record: MenuRecord) -> Self {
        match record {
            MenuRecord::Header { text } => WireRecord::Header {
                r#type: HeaderTag::Header,
                text,
            },
            MenuRecord::Item(item) => WireRecord::Item(item),
        }
    }
}
