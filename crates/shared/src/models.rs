use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Reading state of a saved item, as far as the report cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleStatus {
    Unread,
    Read,
}

impl ArticleStatus {
    /// Map the service's status code. Codes other than "0" and "1" are not
    /// modelled (Pocket uses "2" for items about to be deleted).
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "0" => Some(ArticleStatus::Unread),
            "1" => Some(ArticleStatus::Read),
            _ => None,
        }
    }
}

/// One saved item, coerced from the service's loosely typed record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub item_id: String,
    pub word_count: u64,
    pub status: ArticleStatus,
    pub is_article: bool,
    /// Unix seconds.
    pub time_added: i64,
    /// Unix seconds; `None` while unread or when the service sent "0".
    pub time_read: Option<i64>,
    pub resolved_url: String,
    pub resolved_title: String,
}

impl Article {
    /// Long-form content the service managed to extract text from.
    pub fn is_parseable(&self) -> bool {
        self.word_count > 0 && self.is_article
    }

    /// Title for display, falling back to the URL when the service had none.
    pub fn display_title(&self) -> &str {
        if self.resolved_title.trim().is_empty() {
            &self.resolved_url
        } else {
            &self.resolved_title
        }
    }
}

/// Item as sent by `/v3/get`. Every field is optional and may be a string
/// or a number on the wire.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawItem {
    #[serde(default)]
    pub item_id: Option<Value>,
    #[serde(default)]
    pub resolved_url: Option<Value>,
    #[serde(default)]
    pub given_url: Option<Value>,
    #[serde(default)]
    pub resolved_title: Option<Value>,
    #[serde(default)]
    pub word_count: Option<Value>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub is_article: Option<Value>,
    #[serde(default)]
    pub time_added: Option<Value>,
    #[serde(default)]
    pub time_read: Option<Value>,
}

/// The `list` member of a `/v3/get` response. An account with no items gets
/// an empty JSON array instead of an empty object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ItemList {
    Items(HashMap<String, RawItem>),
    Empty(Vec<Value>),
}

impl Default for ItemList {
    fn default() -> Self {
        ItemList::Empty(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
pub struct RetrieveResponse {
    #[serde(default)]
    pub list: ItemList,
}

/// Why a raw record could not become an [`Article`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    UnknownStatus(String),
    MissingTimeAdded,
    TimeOutOfRange(i64),
}

fn value_as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        _ => None,
    }
}

fn value_as_i64(value: Option<&Value>) -> Option<i64> {
    value
        .and_then(value_as_string)
        .and_then(|s| s.trim().parse::<i64>().ok())
}

impl RawItem {
    pub fn into_article(self, key: &str) -> Result<Article, Rejection> {
        let status_code = self
            .status
            .as_ref()
            .and_then(value_as_string)
            .unwrap_or_default();
        let status = ArticleStatus::from_code(&status_code)
            .ok_or(Rejection::UnknownStatus(status_code))?;

        let time_added = value_as_i64(self.time_added.as_ref())
            .filter(|t| *t > 0)
            .ok_or(Rejection::MissingTimeAdded)?;
        if time_added.checked_mul(1000).is_none() {
            return Err(Rejection::TimeOutOfRange(time_added));
        }

        // Seconds that cannot be expressed in milliseconds are treated as unset.
        let time_read = value_as_i64(self.time_read.as_ref())
            .filter(|t| *t > 0 && t.checked_mul(1000).is_some());

        let word_count = value_as_i64(self.word_count.as_ref())
            .filter(|w| *w > 0)
            .unwrap_or(0) as u64;

        let is_article = self
            .is_article
            .as_ref()
            .and_then(value_as_string)
            .map(|s| s.trim() == "1")
            .unwrap_or(false);

        let item_id = self
            .item_id
            .as_ref()
            .and_then(value_as_string)
            .unwrap_or_else(|| key.to_string());

        let text = |v: &Option<Value>| v.as_ref().and_then(value_as_string).unwrap_or_default();
        let resolved_url = match text(&self.resolved_url) {
            url if !url.trim().is_empty() => url,
            _ => text(&self.given_url),
        };

        Ok(Article {
            item_id,
            word_count,
            status,
            is_article,
            time_added,
            time_read,
            resolved_url,
            resolved_title: text(&self.resolved_title),
        })
    }
}

impl RetrieveResponse {
    /// Coerce every record, logging and skipping the ones that cannot be
    /// represented. The result is ordered by `(time_added, item_id)`.
    pub fn into_articles(self) -> Vec<Article> {
        let items = match self.list {
            ItemList::Items(items) => items,
            ItemList::Empty(_) => return Vec::new(),
        };

        let mut articles: Vec<Article> = items
            .into_iter()
            .filter_map(|(key, raw)| match raw.into_article(&key) {
                Ok(article) => Some(article),
                Err(rejection) => {
                    tracing::warn!(item = %key, ?rejection, "skipping saved item");
                    None
                }
            })
            .collect();

        articles.sort_by(|a, b| {
            a.time_added
                .cmp(&b.time_added)
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        articles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Vec<Article> {
        serde_json::from_str::<RetrieveResponse>(json)
            .unwrap()
            .into_articles()
    }

    #[test]
    fn test_empty_list_is_an_array() {
        assert!(parse(r#"{"status":2,"list":[]}"#).is_empty());
    }

    #[test]
    fn test_missing_list() {
        assert!(parse(r#"{"status":1}"#).is_empty());
    }

    #[test]
    fn test_coerces_string_fields() {
        let articles = parse(
            r#"{"list":{"42":{
                "item_id":"42",
                "resolved_url":"https://example.com/a",
                "resolved_title":"A",
                "word_count":"1200",
                "status":"1",
                "is_article":"1",
                "time_added":"1600000000",
                "time_read":"1600086400"
            }}}"#,
        );
        assert_eq!(articles.len(), 1);
        let a = &articles[0];
        assert_eq!(a.item_id, "42");
        assert_eq!(a.word_count, 1200);
        assert_eq!(a.status, ArticleStatus::Read);
        assert!(a.is_article);
        assert_eq!(a.time_added, 1_600_000_000);
        assert_eq!(a.time_read, Some(1_600_086_400));
    }

    #[test]
    fn test_non_numeric_word_count_is_zero() {
        let articles = parse(
            r#"{"list":{"1":{"word_count":"n/a","status":"0","time_added":"100"}}}"#,
        );
        assert_eq!(articles[0].word_count, 0);
        assert!(!articles[0].is_parseable());
    }

    #[test]
    fn test_zero_time_read_is_absent() {
        let articles = parse(
            r#"{"list":{"1":{"status":"0","time_added":"100","time_read":"0"}}}"#,
        );
        assert_eq!(articles[0].time_read, None);
    }

    #[test]
    fn test_numbers_accepted() {
        let articles = parse(
            r#"{"list":{"7":{"status":0,"time_added":100,"word_count":12,"is_article":1}}}"#,
        );
        assert_eq!(articles[0].item_id, "7");
        assert_eq!(articles[0].word_count, 12);
        assert!(articles[0].is_article);
    }

    #[test]
    fn test_unknown_status_dropped() {
        let articles = parse(
            r#"{"list":{
                "1":{"status":"2","time_added":"100"},
                "2":{"status":"0","time_added":"100"}
            }}"#,
        );
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].item_id, "2");
    }

    #[test]
    fn test_missing_time_added_rejected() {
        let raw = RawItem {
            status: Some(Value::String("0".into())),
            ..RawItem::default()
        };
        assert_eq!(raw.into_article("9"), Err(Rejection::MissingTimeAdded));
    }

    #[test]
    fn test_huge_numbers_do_not_overflow() {
        let articles = parse(
            r#"{"list":{"1":{
                "status":"1",
                "is_article":"1",
                "word_count":"9223372036854775807",
                "time_added":"1600000000",
                "time_read":"99999999999999999"
            }}}"#,
        );
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].word_count, i64::MAX as u64);
        assert_eq!(articles[0].time_read, None);

        let now = chrono::DateTime::from_timestamp(1_600_000_000 + 3 * 86_400, 0).unwrap();
        let report = crate::stats::ReadingReport::build(&articles, now);
        assert_eq!(report.read.word_count, i64::MAX as u64);
        assert_eq!(report.series.read_word_count_by_day.len(), 3);
    }

    #[test]
    fn test_time_added_out_of_range_rejected() {
        let raw = RawItem {
            status: Some(Value::String("0".into())),
            time_added: Some(Value::String("99999999999999999".into())),
            ..RawItem::default()
        };
        assert_eq!(
            raw.into_article("9"),
            Err(Rejection::TimeOutOfRange(99_999_999_999_999_999))
        );
    }

    #[test]
    fn test_ordered_by_time_added() {
        let articles = parse(
            r#"{"list":{
                "b":{"status":"0","time_added":"300"},
                "a":{"status":"0","time_added":"200"},
                "c":{"status":"0","time_added":"200"}
            }}"#,
        );
        let ids: Vec<&str> = articles.iter().map(|a| a.item_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c", "b"]);
    }

    #[test]
    fn test_url_and_title_fallbacks() {
        let articles = parse(
            r#"{"list":{"1":{"status":"0","time_added":"1","resolved_url":"","given_url":"https://given.example"}}}"#,
        );
        assert_eq!(articles[0].resolved_url, "https://given.example");
        assert_eq!(articles[0].display_title(), "https://given.example");
    }
}
