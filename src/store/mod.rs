//! Where rendered artifacts end up.
//!
//! Artifacts go to a local directory or to an S3 bucket, depending on the
//! [`StoreLocation`]. Either way, callers name each artifact with a relative
//! key like `images/soup.png`.

use std::{collections::HashSet, fmt, path::Component, str::FromStr};

use crate::prelude::*;

pub mod local;
pub mod s3;

pub use self::{local::LocalDirStore, s3::S3Store};

/// Interface to artifact storage.
#[async_trait]
pub trait ArtifactStore: Send + Sync + 'static {
    /// Store `data` under `key`, and return a description of where it went.
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
}

/// Check that `key` is a relative path that stays inside its root.
fn check_key(key: &str) -> Result<&Path> {
    let relative = Path::new(key);
    let is_plain = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if key.is_empty() || !is_plain {
        return Err(anyhow!("Invalid artifact key: {:?}", key));
    }
    Ok(relative)
}

/// An `s3://bucket/key` URL. The key may be empty, or a prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct S3Url {
    pub bucket: String,
    pub key: String,
}

impl fmt::Display for S3Url {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

impl FromStr for S3Url {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let rest = s
            .strip_prefix("s3://")
            .ok_or_else(|| anyhow!("Expected a URL like \"s3://bucket/prefix\": {:?}", s))?;
        let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() {
            return Err(anyhow!("No bucket in S3 URL: {:?}", s));
        }
        Ok(Self {
            bucket: bucket.to_owned(),
            key: key.to_owned(),
        })
    }
}

/// Where to put artifacts: a local directory, or an S3 bucket and prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreLocation {
    Local(PathBuf),
    S3(S3Url),
}

impl FromStr for StoreLocation {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.starts_with("s3://") {
            Ok(StoreLocation::S3(s.parse()?))
        } else if s.is_empty() {
            Err(anyhow!("Output location must not be empty"))
        } else {
            Ok(StoreLocation::Local(PathBuf::from(s)))
        }
    }
}

impl StoreLocation {
    /// Open a store rooted at this location.
    pub async fn open(&self) -> Result<Box<dyn ArtifactStore>> {
        match self {
            StoreLocation::Local(root) => Ok(Box::new(LocalDirStore::new(root))),
            StoreLocation::S3(url) => {
                Ok(Box::new(S3Store::new(&url.bucket, &url.key).await?))
            }
        }
    }
}

/// Hands out unique storage keys for item images.
#[derive(Debug, Default)]
pub struct ImageKeys {
    used: HashSet<String>,
}

impl ImageKeys {
    /// Get a fresh key like `images/spring_rolls.png` for an item.
    pub fn key_for(&mut self, name: &str, extension: &str) -> String {
        let slug = slugify(name);
        let mut candidate = format!("images/{slug}.{extension}");
        let mut n = 2;
        while !self.used.insert(candidate.clone()) {
            candidate = format!("images/{slug}_{n}.{extension}");
            n += 1;
        }
        candidate
    }
}

/// Lowercase `name`, replacing each run of non-alphanumeric characters with
/// `_`.
fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.is_empty() && !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "item".to_owned()
    } else {
        slug.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs() {
        assert_eq!(slugify("Spring Rolls"), "spring_rolls");
        assert_eq!(slugify("  Chef's  Special!! "), "chef_s_special");
        assert_eq!(slugify("Crème Brûlée"), "crème_brûlée");
        assert_eq!(slugify("$$$"), "item");
        assert_eq!(slugify(""), "item");
    }

    #[test]
    fn image_keys_are_unique() {
        let mut keys = ImageKeys::default();
        assert_eq!(keys.key_for("Soup", "png"), "images/soup.png");
        assert_eq!(keys.key_for("soup", "png"), "images/soup_2.png");
        assert_eq!(keys.key_for("SOUP!", "png"), "images/soup_3.png");
        assert_eq!(keys.key_for("Soup", "jpg"), "images/soup.jpg");
    }

    #[test]
    fn keys_must_stay_inside_root() {
        assert!(check_key("images/soup.png").is_ok());
        for key in ["../evil.html", "/etc/passwd", "", "images/../../x", "./a"] {
            assert!(check_key(key).is_err(), "{key}");
        }
    }

    #[test]
    fn parses_store_locations() {
        assert_eq!(
            StoreLocation::from_str("site/out").unwrap(),
            StoreLocation::Local(PathBuf::from("site/out"))
        );
        assert_eq!(
            StoreLocation::from_str("s3://menus/lunch/2024").unwrap(),
            StoreLocation::S3(S3Url {
                bucket: "menus".to_owned(),
                key: "lunch/2024".to_owned(),
            })
        );
        assert_eq!(
            StoreLocation::from_str("s3://menus").unwrap(),
            StoreLocation::S3(S3Url {
                bucket: "menus".to_owned(),
                key: String::new(),
            })
        );
        assert!(StoreLocation::from_str("s3:///prefix").is_err());
        assert!(StoreLocation::from_str("").is_err());
        assert_eq!(
            S3Url::from_str("s3://menus/a/b.json").unwrap().to_string(),
            "s3://menus/a/b.json"
        );
    }
}
