//! Echo enricher for testing and dry runs.
//!
//! This enricher never calls out to anything. Descriptions just repeat the
//! item name, and images are small solid squares whose colour depends on the
//! name, so different items are easy to tell apart on a rendered page.

use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage};

use crate::prelude::*;

use super::{Enricher, GeneratedImage};

/// Width and height of our placeholder images.
const IMAGE_SIZE: u32 = 8;

/// Echo enricher.
#[derive(Debug, Default)]
pub struct EchoEnricher;

impl EchoEnricher {
    /// Create a new echo enricher.
    pub fn new() -> Self {
        Self
    }
}

/// Pick a stable colour for a name.
fn colour_for(name: &str) -> Rgb<u8> {
    let hash = name
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    let [r, g, b, _] = hash.to_le_bytes();
    Rgb([r, g, b])
}

#[async_trait]
impl Enricher for EchoEnricher {
    async fn describe(&self, name: &str) -> Result<String> {
        Ok(format!("{name}, as listed on the menu."))
    }

    async fn illustrate(&self, name: &str) -> Result<GeneratedImage> {
        let image = RgbImage::from_pixel(IMAGE_SIZE, IMAGE_SIZE, colour_for(name));
        let mut png = Cursor::new(Vec::new());
        image
            .write_to(&mut png, ImageFormat::Png)
            .context("Failed to encode placeholder image")?;
        Ok(GeneratedImage {
            mime_type: "image/png".to_owned(),
            data: png.into_inner(),
        })
    }
}
