use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::normalize::normalize;
use crate::traits::CatalogPage;

// ── JSON:API response types ──────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct JsonApiListResponse {
    pub data: Vec<JsonApiResource>,
    pub meta: Option<Meta>,
    pub links: Option<Links>,
}

#[derive(Debug, Deserialize)]
pub struct JsonApiSingleResourceResponse {
    pub data: JsonApiResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JsonApiResource {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "type", default)]
    pub type_: String,
    #[serde(default)]
    pub attributes: Value,
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    #[serde(default, deserialize_with = "lenient")]
    pub count: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct Links {
    pub next: Option<String>,
}

impl JsonApiListResponse {
    /// Normalize every resource and lift pagination metadata.
    pub fn into_page(self) -> CatalogPage {
        let total_count = self.meta.and_then(|m| m.count);
        let has_next = self.links.and_then(|l| l.next).is_some();
        let records = self.data.iter().map(normalize).collect();
        CatalogPage {
            records,
            total_count,
            has_next,
        }
    }
}

// ── Kitsu anime attributes ───────────────────────────────────────
//
// Every field is read leniently: a value of the wrong JSON type is treated
// the same as an absent one.

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KitsuAnimeAttributes {
    #[serde(default, deserialize_with = "lenient")]
    pub canonical_title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub titles: Option<KitsuTitles>,
    #[serde(default, deserialize_with = "lenient")]
    pub episode_count: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub poster_image: Option<KitsuImage>,
    #[serde(default, deserialize_with = "rating")]
    pub average_rating: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub synopsis: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub subtype: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub show_type: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub age_rating: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub popularity_rank: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub rating_rank: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub cover_image: Option<KitsuImage>,
    #[serde(default, deserialize_with = "lenient")]
    pub episode_length: Option<u32>,
    #[serde(default, deserialize_with = "lenient")]
    pub age_rating_guide: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub youtube_video_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub tba: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KitsuTitles {
    #[serde(default, deserialize_with = "lenient")]
    pub en: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub en_jp: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub ja_jp: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KitsuImage {
    #[serde(default, deserialize_with = "lenient")]
    pub tiny: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub small: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub medium: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub large: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub original: Option<String>,
}

impl KitsuAnimeAttributes {
    /// Read attributes out of a raw JSON value; anything that is not an
    /// object yields all-default attributes.
    pub fn from_value(value: &Value) -> Self {
        if !value.is_object() {
            return Self::default();
        }
        serde_json::from_value(value.clone()).unwrap_or_else(|e| {
            tracing::debug!(error = %e, "unreadable anime attributes, using defaults");
            Self::default()
        })
    }
}

// ── Lenient field readers ────────────────────────────────────────

fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Kitsu sends `averageRating` as a decimal string ("83.45"), but tolerate
/// plain numbers too.
fn rating<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
    .filter(|r| r.is_finite()))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    })
}
