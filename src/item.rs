//! Zotero item model.
//!
//! Items are deserialized once from the API (or a saved JSON file) with explicit
//! defaults for every field the crate reads. Fields the crate does not use are
//! kept in `extra` maps so that a saved library round-trips unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record from a Zotero library, as returned by `GET /users/{id}/items`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoteroItem {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub data: ItemData,
    /// `links`, `meta`, `library`, ...
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `data` object of a Zotero item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemData {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub item_type: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub publication_title: String,
    #[serde(default)]
    pub creators: Vec<Creator>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// An author, editor or other contributor.
///
/// Name parts are optional because their presence matters: creators lacking
/// either part are left out of BibTeX author lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Single-field name used for institutional authors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Creator {
    pub fn new(first_name: &str, last_name: &str) -> Self {
        Self {
            creator_type: Some("author".to_string()),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            name: None,
        }
    }
}

impl ZoteroItem {
    /// Build an item around `data`, copying the data key to the top level.
    pub fn from_data(data: ItemData) -> Self {
        Self {
            key: data.key.clone(),
            version: 0,
            data,
            extra: Map::new(),
        }
    }

    /// Key used to identify the record: the data key, or the top-level key.
    pub fn record_key(&self) -> &str {
        if self.data.key.is_empty() {
            &self.key
        } else {
            &self.data.key
        }
    }
}

impl ItemData {
    /// Attachments and notes carry no title and are not bibliographic records.
    pub fn has_title(&self) -> bool {
        !self.title.is_empty()
    }

    /// The first four characters of `date`, or the whole date if shorter.
    pub fn year_prefix(&self) -> &str {
        match self.date.char_indices().nth(4) {
            Some((idx, _)) => &self.date[..idx],
            None => &self.date,
        }
    }

    /// Numeric year, present only when the year prefix is four ASCII digits.
    pub fn year(&self) -> Option<i32> {
        let prefix = self.year_prefix();
        if prefix.len() == 4 && prefix.bytes().all(|b| b.is_ascii_digit()) {
            prefix.parse().ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_with_date(date: &str) -> ItemData {
        ItemData {
            date: date.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_year_extraction() {
        assert_eq!(data_with_date("2020-01-15").year(), Some(2020));
        assert_eq!(data_with_date("1999").year(), Some(1999));
        assert_eq!(data_with_date("99").year(), None);
        assert_eq!(data_with_date("").year(), None);
        assert_eq!(data_with_date("March 2020").year(), None);
        assert_eq!(data_with_date("20a0-01").year(), None);
        assert_eq!(data_with_date("März").year(), None);
    }

    #[test]
    fn test_year_prefix_on_short_and_multibyte_dates() {
        assert_eq!(data_with_date("2020-01").year_prefix(), "2020");
        assert_eq!(data_with_date("20").year_prefix(), "20");
        assert_eq!(data_with_date("Été 2001").year_prefix(), "Été ");
    }

    #[test]
    fn test_deserialize_with_missing_fields() -> Result<(), serde_json::Error> {
        let item: ZoteroItem = serde_json::from_str(
            r#"{"key": "ABCD1234", "data": {"itemType": "attachment", "contentType": "application/pdf"}}"#,
        )?;
        assert_eq!(item.key, "ABCD1234");
        assert!(!item.data.has_title());
        assert!(item.data.creators.is_empty());
        assert_eq!(item.data.extra["contentType"], "application/pdf");
        Ok(())
    }

    #[test]
    fn test_creator_name_presence_is_preserved() -> Result<(), serde_json::Error> {
        let creator: Creator = serde_json::from_str(r#"{"creatorType": "author", "lastName": "Doe"}"#)?;
        assert_eq!(creator.first_name, None);
        assert_eq!(creator.last_name.as_deref(), Some("Doe"));
        Ok(())
    }

    #[test]
    fn test_unknown_fields_survive_serialization() -> Result<(), serde_json::Error> {
        let raw = r#"{"key":"K1","version":7,"library":{"id":1},"data":{"key":"K1","title":"T","DOI":"10.1/x","creators":[{"creatorType":"author","name":"WHO"}]}}"#;
        let item: ZoteroItem = serde_json::from_str(raw)?;
        let value = serde_json::to_value(&item)?;
        assert_eq!(value["library"]["id"], 1);
        assert_eq!(value["data"]["DOI"], "10.1/x");
        assert_eq!(value["data"]["creators"][0]["name"], "WHO");
        assert!(value["data"]["creators"][0].get("firstName").is_none());
        Ok(())
    }

    #[test]
    fn test_record_key_falls_back_to_top_level() {
        let mut item = ZoteroItem {
            key: "TOP".to_string(),
            ..Default::default()
        };
        assert_eq!(item.record_key(), "TOP");
        item.data.key = "DATA".to_string();
        assert_eq!(item.record_key(), "DATA");
    }
}
