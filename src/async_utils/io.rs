//! I/O utilities.
//!
//! This module reads text lines, JSON and TOML from files or standard input,
//! and writes JSON to files or standard output. Config files may be either
//! JSON or TOML, and we detect which from the file extension. Files without
//! a `.json` or `.toml` extension are tried as JSON first, then as TOML,
//! because both a JSON array and a TOML table header start with `[`.

use futures::TryStreamExt as _;
use serde::de::DeserializeOwned;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt as _, AsyncRead, AsyncWrite, AsyncWriteExt as _, BufReader},
};
use tokio_stream::wrappers::LinesStream;

use crate::prelude::*;

/// Open a file, or standard input if `path` is `None`.
async fn open_reader(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncRead + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdin())),
    }
}

/// A human-readable name for an input, for error messages.
fn describe(path: Option<&Path>) -> String {
    match path {
        Some(path) => format!("{:?}", path),
        None => "stdin".to_owned(),
    }
}

/// Read all the lines of a UTF-8 text file or standard input, without line
/// endings.
pub async fn read_lines(path: Option<&Path>) -> Result<Vec<String>> {
    let reader = BufReader::new(open_reader(path).await?);
    LinesStream::new(reader.lines())
        .try_collect::<Vec<String>>()
        .await
        .with_context(|| format!("Failed to read lines from {}", describe(path)))
}

/// The structured formats we can read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DataFormat {
    Json,
    Toml,
}

impl DataFormat {
    /// Guess the format from a file extension.
    fn from_extension(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(DataFormat::Json),
            "toml" => Some(DataFormat::Toml),
            _ => None,
        }
    }

    /// Parse `data` in this format.
    fn parse<T: DeserializeOwned>(self, path: &Path, data: &str) -> Result<T> {
        match self {
            DataFormat::Json => serde_json::from_str(data).with_context(|| {
                format!("Failed to parse JSON from file at path: {:?}", path)
            }),
            DataFormat::Toml => toml::from_str(data).with_context(|| {
                format!("Failed to parse TOML from file at path: {:?}", path)
            }),
        }
    }
}

/// Read TOML or JSON from a file.
pub async fn read_json_or_toml<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    // Read all at once because our parsing libraries don't do async I/O.
    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read file at path: {:?}", path))?;
    if let Some(format) = DataFormat::from_extension(path) {
        return format.parse(path, &data);
    }
    // A TOML document can never start with `{`.
    if data.trim_start().starts_with('{') {
        return DataFormat::Json.parse(path, &data);
    }
    match DataFormat::Json.parse(path, &data) {
        Ok(value) => Ok(value),
        Err(json_err) => {
            trace!("Not JSON, trying TOML: {json_err:#}");
            DataFormat::Toml.parse(path, &data)
        }
    }
}

/// Create an [`AsyncWrite`] for a file or stdout.
pub async fn create_writer(
    path: Option<&Path>,
) -> Result<Box<dyn AsyncWrite + Unpin + Send + Sync + 'static>> {
    match path {
        Some(path) => {
            let file = File::create(path)
                .await
                .with_context(|| format!("Failed to create file at path: {:?}", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(tokio::io::stdout())),
    }
}

/// Write a value as pretty-printed JSON to either standard output or a file.
pub async fn write_json_pretty<T>(path: Option<&Path>, value: &T) -> Result<()>
where
    T: Serialize + ?Sized,
{
    let mut json =
        serde_json::to_string_pretty(value).context("Failed to serialize JSON")?;
    json.push('\n');
    let mut writer = create_writer(path).await?;
    writer
        .write_all(json.as_bytes())
        .await
        .context("Failed to write JSON to output")?;
    writer.flush().await.context("Failed to flush output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[tokio::test]
    async fn reads_toml_and_json() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("settings.toml");
        tokio::fs::write(&toml_path, "answer = 42\n").await.unwrap();
        let from_toml: BTreeMap<String, i64> =
            read_json_or_toml(&toml_path).await.unwrap();
        assert_eq!(from_toml["answer"], 42);

        // No extension, so we sniff the contents.
        let json_path = dir.path().join("settings");
        tokio::fs::write(&json_path, "  {\"answer\": 42}").await.unwrap();
        let from_json: BTreeMap<String, i64> =
            read_json_or_toml(&json_path).await.unwrap();
        assert_eq!(from_json, from_toml);
    }

    #[tokio::test]
    async fn sniffs_toml_tables_and_json_arrays_without_extension() {
        let dir = tempfile::tempdir().unwrap();

        let conf_path = dir.path().join("menu.conf");
        tokio::fs::write(&conf_path, "[segment]\nstrict_prices = true\n")
            .await
            .unwrap();
        let config: crate::config::MenuConfig =
            read_json_or_toml(&conf_path).await.unwrap();
        assert!(config.segment.strict_prices);

        let list_path = dir.path().join("numbers");
        tokio::fs::write(&list_path, "[1, 2, 3]\n").await.unwrap();
        let numbers: Vec<i64> = read_json_or_toml(&list_path).await.unwrap();
        assert_eq!(numbers, vec![1, 2, 3]);

        let bad_path = dir.path().join("broken.conf");
        tokio::fs::write(&bad_path, "[segment\n").await.unwrap();
        let err = read_json_or_toml::<crate::config::MenuConfig>(&bad_path)
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("TOML"));
    }

    #[tokio::test]
    async fn writes_pretty_json_with_newline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_json_pretty(Some(path.as_path()), &json!([1])).await.unwrap();
        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, "[\n  1\n]\n");
    }

    #[tokio::test]
    async fn missing_file_mentions_path() {
        let err = read_lines(Some(Path::new("/no/such/menu.txt")))
            .await
            .unwrap_err();
        assert!(format!("{err:?}").contains("/no/such/menu.txt"));
    }
}
