//! Data models for extracted articles.
//!
//! - [`Document`]: one article as handed to the restriction checker and the sink
//! - [`MetadataField`]: the optional labelled cells found under an article

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// An optional metadata cell in an article's category table.
///
/// Each field is identified on the page by its label cell (`"Keywords:"`),
/// the value sits in the cell that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataField {
    Keywords,
    Categories,
    Companies,
    Countries,
}

impl MetadataField {
    pub const ALL: [MetadataField; 4] = [
        MetadataField::Keywords,
        MetadataField::Categories,
        MetadataField::Companies,
        MetadataField::Countries,
    ];

    /// The label cell text that introduces this field.
    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Keywords => "Keywords:",
            MetadataField::Categories => "Categories:",
            MetadataField::Companies => "Companies:",
            MetadataField::Countries => "Countries:",
        }
    }

    /// The key used in [`Document::other`].
    pub fn key(self) -> &'static str {
        match self {
            MetadataField::Keywords => "keywords",
            MetadataField::Categories => "categories",
            MetadataField::Companies => "companies",
            MetadataField::Countries => "countries",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL.into_iter().find(|field| field.label() == label)
    }
}

/// One extracted article.
///
/// `id` and `storage` are never assigned here; the host fills them in after
/// the sink accepts the record. Timestamps are naive local time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Option<i64>,
    /// Article headline.
    pub title: String,
    /// Always `None` for this source.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    /// Rendered text of the article body.
    pub text: String,
    /// Canonical article URL, the dedup key downstream.
    pub link: String,
    pub storage: Option<serde_json::Value>,
    /// Metadata cells that were present and readable.
    pub other: BTreeMap<MetadataField, String>,
    /// Publication time taken from the listing row.
    pub published: NaiveDateTime,
    /// Wall-clock time of extraction.
    pub loaded: NaiveDateTime,
}

impl Document {
    pub fn metadata(&self, field: MetadataField) -> Option<&str> {
        self.other.get(&field).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Document {
        let published = NaiveDate::from_ymd_opt(2024, 8, 12)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let mut other = BTreeMap::new();
        other.insert(MetadataField::Keywords, "open banking, PSD3".to_string());
        other.insert(MetadataField::Countries, "UK".to_string());
        Document {
            id: None,
            title: "Open banking reaches new milestone".to_string(),
            abstract_text: None,
            text: "Body".to_string(),
            link: "https://thepaypers.com/news/open-banking/story".to_string(),
            storage: None,
            other,
            published,
            loaded: published,
        }
    }

    #[test]
    fn test_metadata_field_from_label() {
        assert_eq!(MetadataField::from_label("Keywords:"), Some(MetadataField::Keywords));
        assert_eq!(MetadataField::from_label("  Countries: "), Some(MetadataField::Countries));
        assert_eq!(MetadataField::from_label("Keywords"), None);
        assert_eq!(MetadataField::from_label("Authors:"), None);
    }

    #[test]
    fn test_document_serialization_uses_wire_keys() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["abstract"], serde_json::Value::Null);
        assert_eq!(json["other"]["keywords"], "open banking, PSD3");
        assert_eq!(json["other"]["countries"], "UK");
        assert!(json["other"].get("categories").is_none());
        assert_eq!(json["published"], "2024-08-12T00:00:00");
    }

    #[test]
    fn test_metadata_lookup() {
        let doc = sample();
        assert_eq!(doc.metadata(MetadataField::Countries), Some("UK"));
        assert_eq!(doc.metadata(MetadataField::Companies), None);
    }
}
