//! JSON Lines output.
//!
//! Each submitted [`Document`] becomes one line of JSON:
//!
//! ```text
//! {"id":null,"title":"…","abstract":null,"text":"…","link":"https://thepaypers.com/…",
//!  "storage":null,"other":{"keywords":"…"},"published":"2024-08-12T00:00:00","loaded":"…"}
//! ```
//!
//! Files are opened in append mode, so repeated runs accumulate into the same
//! file and downstream dedup works on `link`.

use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::{self, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, instrument};

use super::DocumentSink;
use crate::error::Result;
use crate::models::Document;
use crate::utils::ensure_parent_dir;

pub struct JsonLinesSink {
    writer: Box<dyn AsyncWrite + Unpin + Send>,
    written: usize,
}

impl JsonLinesSink {
    /// Open `path` for appending, creating it and its parent directory.
    ///
    /// # Arguments
    ///
    /// * `path` - JSON lines file; earlier contents are kept
    ///
    /// # Returns
    ///
    /// The sink, or [`Error::Io`](crate::Error::Io) if the directory or file
    /// cannot be created.
    #[instrument(level = "info", skip_all, fields(path = %path.as_ref().display()))]
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent_dir(path).await?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;
        info!("Opened JSON lines output");
        Ok(Self::from_writer(file))
    }

    /// Write to stdout. Logs go to stderr, so the stream stays valid JSON lines.
    pub fn stdout() -> Self {
        Self::from_writer(io::stdout())
    }

    /// Write to any async writer, e.g. an in-memory buffer.
    ///
    /// # Arguments
    ///
    /// * `writer` - Receives one serialized document per line, flushed after each
    pub fn from_writer(writer: impl AsyncWrite + Unpin + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
            written: 0,
        }
    }

    /// Documents written so far.
    pub fn written(&self) -> usize {
        self.written
    }
}

impl DocumentSink for JsonLinesSink {
    async fn submit(&mut self, document: Document) -> Result<()> {
        let mut line = serde_json::to_vec(&document)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        self.written += 1;
        debug!(link = %document.link, written = self.written, "Wrote document");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MetadataField;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn doc(link: &str) -> Document {
        let published = NaiveDate::from_ymd_opt(2024, 8, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut other = BTreeMap::new();
        other.insert(MetadataField::Categories, "Cards".to_string());
        Document {
            id: None,
            title: "Title".to_string(),
            abstract_text: None,
            text: "Body".to_string(),
            link: link.to_string(),
            storage: None,
            other,
            published,
            loaded: published,
        }
    }

    #[tokio::test]
    async fn test_appends_one_line_per_document() {
        let path = std::env::temp_dir()
            .join(format!("paypers_walker_json_{}", std::process::id()))
            .join("documents.jsonl");
        let _ = std::fs::remove_file(&path);

        let mut sink = JsonLinesSink::create(&path).await.unwrap();
        sink.submit(doc("https://thepaypers.com/a")).await.unwrap();
        sink.submit(doc("https://thepaypers.com/b")).await.unwrap();
        assert_eq!(sink.written(), 2);
        drop(sink);

        let mut sink = JsonLinesSink::create(&path).await.unwrap();
        sink.submit(doc("https://thepaypers.com/c")).await.unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        let links: Vec<String> = contents
            .lines()
            .map(|l| serde_json::from_str::<Document>(l).unwrap().link)
            .collect();
        assert_eq!(
            links,
            vec![
                "https://thepaypers.com/a",
                "https://thepaypers.com/b",
                "https://thepaypers.com/c"
            ]
        );
        assert!(contents.contains(r#""other":{"categories":"Cards"}"#));

        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();
    }
}
