use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

/// Input modality a summary was generated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    Website,
    File,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Website => "website",
            ContentType::File => "file",
            ContentType::Video => "video",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ContentType::Text),
            "website" => Ok(ContentType::Website),
            "file" => Ok(ContentType::File),
            "video" => Ok(ContentType::Video),
            other => Err(Error::Parse(format!("unknown content type: {}", other))),
        }
    }
}

/// Ordering accepted by the list endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Date,
    Likes,
    Favorites,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Likes => "likes",
            SortKey::Favorites => "favorites",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date" => Ok(SortKey::Date),
            "likes" => Ok(SortKey::Likes),
            "favorites" => Ok(SortKey::Favorites),
            other => Err(Error::Parse(format!("unknown sort key: {}", other))),
        }
    }
}

/// Account profile as the interface consumes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub favorites: Vec<String>,
}

impl User {
    /// Map one wire object into a fully populated profile. Missing or
    /// mistyped fields fall back to their defaults instead of failing
    /// the whole record.
    pub fn from_value(value: &Value) -> Self {
        User {
            id: id_field(value, "id"),
            username: string_field(value, "username"),
            email: string_field(value, "email"),
            favorites: id_list_field(value, "favorites"),
        }
    }
}

/// Full summary record, only ever fetched one at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub author: Option<User>,
    pub category: String,
    pub content_type: String,
    pub user_prompt: String,
    pub likes: i64,
    pub dislikes: i64,
    pub favorites: i64,
    pub tags: Vec<String>,
    pub is_private: bool,
    pub url: String,
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl Summary {
    /// Map one wire object into a fully populated record. This is the one
    /// place snake_case field names are translated; everything downstream
    /// works with the mapped form.
    pub fn from_value(value: &Value) -> Self {
        Summary {
            id: id_field(value, "id"),
            title: string_field(value, "title"),
            summary: string_field(value, "summary"),
            author: user_field(value, "author"),
            category: string_field(value, "category"),
            content_type: string_field(value, "content_type"),
            user_prompt: string_field(value, "user_prompt"),
            likes: int_field(value, "likes"),
            dislikes: int_field(value, "dislikes"),
            favorites: int_field(value, "favorites"),
            tags: string_list_field(value, "tags"),
            is_private: bool_field(value, "is_private"),
            url: string_field(value, "url"),
            raw_text: string_field(value, "raw_text"),
            created_at: date_field(value, "created_at"),
        }
    }
}

/// Trimmed summary shape the list and search endpoints return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPreview {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub author: Option<User>,
    pub category: String,
    pub content_type: String,
    pub likes: i64,
    pub favorites: i64,
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
}

impl SummaryPreview {
    pub fn from_value(value: &Value) -> Self {
        SummaryPreview {
            id: id_field(value, "id"),
            title: string_field(value, "title"),
            summary: string_field(value, "summary"),
            author: user_field(value, "author"),
            category: string_field(value, "category"),
            content_type: string_field(value, "content_type"),
            likes: int_field(value, "likes"),
            favorites: int_field(value, "favorites"),
            is_private: bool_field(value, "is_private"),
            created_at: date_field(value, "created_at"),
        }
    }

    /// Project a full record down to the list shape, used when a mutation
    /// response has to replace rows already on screen.
    pub fn from_summary(summary: &Summary) -> Self {
        SummaryPreview {
            id: summary.id.clone(),
            title: summary.title.clone(),
            summary: summary.summary.clone(),
            author: summary.author.clone(),
            category: summary.category.clone(),
            content_type: summary.content_type.clone(),
            likes: summary.likes,
            favorites: summary.favorites,
            is_private: summary.is_private,
            created_at: summary.created_at,
        }
    }
}

/// Access/refresh pair issued on login and register.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

impl TokenPair {
    /// Extract a usable pair from a `tokens` wire object. Returns `None`
    /// when either token is absent or empty, so callers never persist a
    /// half-issued session.
    pub fn from_value(value: &Value) -> Option<Self> {
        let access = value.get("access")?.as_str()?;
        let refresh = value.get("refresh")?.as_str()?;
        if access.is_empty() || refresh.is_empty() {
            return None;
        }
        Some(TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        })
    }
}

/// Identifier coercion: ids arrive as strings, but older records carry
/// numeric ids, which turn into their decimal form.
pub fn coerce_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn id_field(value: &Value, key: &str) -> String {
    value.get(key).and_then(coerce_id).unwrap_or_default()
}

fn string_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn int_field(value: &Value, key: &str) -> i64 {
    match value.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(0),
        _ => 0,
    }
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key).and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

fn id_list_field(value: &Value, key: &str) -> Vec<String> {
    match value.get(key).and_then(Value::as_array) {
        Some(items) => items.iter().filter_map(coerce_id).collect(),
        None => Vec::new(),
    }
}

fn user_field(value: &Value, key: &str) -> Option<User> {
    match value.get(key) {
        Some(author @ Value::Object(_)) => Some(User::from_value(author)),
        _ => None,
    }
}

fn date_field(value: &Value, key: &str) -> DateTime<Utc> {
    value
        .get(key)
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}
