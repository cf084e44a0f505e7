//! Service-agnostic catalog types.
//!
//! The Kitsu client produces these, and the search pipeline, dashboard and
//! collection store consume them without knowing where they came from.

use std::future::Future;

use serde::{Deserialize, Serialize};

/// Local fallback used when a record carries no usable poster image.
pub const PLACEHOLDER_IMAGE: &str = "/placeholder-anime.jpg";

/// A catalog source the search pipeline and dashboard can query.
pub trait CatalogSource: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetch one page of anime matching `query`.
    fn search(
        &self,
        query: &CatalogQuery,
    ) -> impl Future<Output = Result<CatalogPage, Self::Error>> + Send;

    /// Fetch a single anime by id.
    fn get_anime(&self, id: u64) -> impl Future<Output = Result<CatalogRecord, Self::Error>> + Send;
}

// ── Records ──────────────────────────────────────────────────────

/// Normalized local representation of one anime title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub title_english: Option<String>,
    #[serde(default)]
    pub title_japanese: Option<String>,
    pub images: RecordImages,
    /// 0–10 scale, full precision.
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub year: Option<i32>,
    /// 0 means unknown.
    #[serde(default)]
    pub episodes: u32,
    #[serde(default)]
    pub status: AiringStatus,
    #[serde(default)]
    pub synopsis: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default = "unknown")]
    pub show_type: String,
    #[serde(default = "not_rated")]
    pub age_rating: String,
    #[serde(default)]
    pub popularity_rank: u32,
    #[serde(default)]
    pub rating_rank: u32,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    /// Minutes per episode; 0 means unknown.
    #[serde(default)]
    pub episode_length: u32,
    #[serde(default)]
    pub age_rating_guide: Option<String>,
    /// YouTube video id of the trailer.
    #[serde(default)]
    pub trailer_id: Option<String>,
    /// Free-form note on what is still to be announced.
    #[serde(default)]
    pub tba: Option<String>,
}

fn unknown() -> String {
    "Unknown".into()
}

fn not_rated() -> String {
    "Not Rated".into()
}

impl CatalogRecord {
    /// Score rounded to one decimal, for display only.
    pub fn display_score(&self) -> String {
        format!("{:.1}", self.score)
    }

    /// Episode count for display; `?` when unknown.
    pub fn display_episodes(&self) -> String {
        if self.episodes == 0 {
            "?".into()
        } else {
            self.episodes.to_string()
        }
    }

    /// "<start> to <end>", with "Ongoing" for an open end.
    pub fn aired_range(&self) -> String {
        let start = self.start_date.as_deref().unwrap_or("Unknown");
        let end = self.end_date.as_deref().unwrap_or("Ongoing");
        format!("{start} to {end}")
    }

    /// Age rating with its guide, e.g. "R (Violence, Profanity)".
    pub fn display_age_rating(&self) -> String {
        match &self.age_rating_guide {
            Some(guide) => format!("{} ({guide})", self.age_rating),
            None => self.age_rating.clone(),
        }
    }

    pub fn trailer_url(&self) -> Option<String> {
        self.trailer_id
            .as_deref()
            .map(|id| format!("https://www.youtube.com/watch?v={id}"))
    }
}

/// Poster image URLs, already resolved through the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordImages {
    pub small: String,
    pub large: String,
    /// Wide banner image, when the title has one.
    #[serde(default)]
    pub cover: Option<String>,
}

impl RecordImages {
    /// Banner image, falling back to the large poster.
    pub fn cover(&self) -> &str {
        self.cover.as_deref().unwrap_or(&self.large)
    }
}

impl Default for RecordImages {
    fn default() -> Self {
        Self {
            small: PLACEHOLDER_IMAGE.into(),
            large: PLACEHOLDER_IMAGE.into(),
            cover: None,
        }
    }
}

/// Lifecycle status of a title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AiringStatus {
    CurrentlyAiring,
    FinishedAiring,
    NotYetAired,
    #[default]
    Unknown,
}

impl AiringStatus {
    /// Map a Kitsu `status` attribute value.
    pub fn from_kitsu(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "current" => Self::CurrentlyAiring,
            "finished" => Self::FinishedAiring,
            "upcoming" | "unreleased" | "tba" => Self::NotYetAired,
            _ => Self::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::CurrentlyAiring => "Currently Airing",
            Self::FinishedAiring => "Finished Airing",
            Self::NotYetAired => "Not Yet Aired",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for AiringStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ── Queries ──────────────────────────────────────────────────────

/// Server-side status filter values accepted by `filter[status]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    Current,
    Finished,
    Tba,
    Unreleased,
    Upcoming,
}

impl StatusFilter {
    pub const ALL: &[StatusFilter] = &[
        Self::Current,
        Self::Finished,
        Self::Tba,
        Self::Unreleased,
        Self::Upcoming,
    ];

    pub fn as_kitsu_str(self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Finished => "finished",
            Self::Tba => "tba",
            Self::Unreleased => "unreleased",
            Self::Upcoming => "upcoming",
        }
    }

    pub fn from_kitsu_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.as_kitsu_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Current => "Currently Airing",
            Self::Finished => "Finished Airing",
            Self::Tba => "To be Announced",
            Self::Unreleased => "Not Yet Released",
            Self::Upcoming => "Upcoming",
        }
    }
}

/// Show type accepted by `filter[subtype]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShowType {
    Tv,
    Movie,
    Ova,
    Ona,
    Special,
    Music,
}

impl ShowType {
    pub const ALL: &[ShowType] = &[
        Self::Tv,
        Self::Movie,
        Self::Ova,
        Self::Ona,
        Self::Special,
        Self::Music,
    ];

    pub fn as_kitsu_str(self) -> &'static str {
        match self {
            Self::Tv => "TV",
            Self::Movie => "movie",
            Self::Ova => "OVA",
            Self::Ona => "ONA",
            Self::Special => "special",
            Self::Music => "music",
        }
    }

    /// Case-insensitive parse of the Kitsu value.
    pub fn from_kitsu_str(s: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_kitsu_str().eq_ignore_ascii_case(s))
    }
}

/// Sort order accepted by `sort`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SortKey {
    #[default]
    MostPopular,
    HighestRated,
    MostRecent,
    OldestFirst,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub const ALL: &[SortKey] = &[
        Self::MostPopular,
        Self::HighestRated,
        Self::MostRecent,
        Self::OldestFirst,
        Self::TitleAsc,
        Self::TitleDesc,
    ];

    pub fn as_kitsu_str(self) -> &'static str {
        match self {
            Self::MostPopular => "-userCount",
            Self::HighestRated => "-averageRating",
            Self::MostRecent => "-startDate",
            Self::OldestFirst => "startDate",
            Self::TitleAsc => "canonicalTitle",
            Self::TitleDesc => "-canonicalTitle",
        }
    }

    pub fn from_kitsu_str(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| k.as_kitsu_str() == s)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MostPopular => "Most Popular",
            Self::HighestRated => "Highest Rated",
            Self::MostRecent => "Most Recent",
            Self::OldestFirst => "Oldest First",
            Self::TitleAsc => "A-Z",
            Self::TitleDesc => "Z-A",
        }
    }
}

/// One page request against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogQuery {
    pub text: String,
    pub status: Option<StatusFilter>,
    pub year: Option<i32>,
    pub show_type: Option<ShowType>,
    pub sort: SortKey,
    /// 1-based page number.
    pub page: u32,
    pub limit: u32,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            text: String::new(),
            status: None,
            year: None,
            show_type: None,
            sort: SortKey::default(),
            page: 1,
            limit: 20,
        }
    }
}

impl CatalogQuery {
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }

    /// Query parameters in the order they are sent.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let text = self.text.trim();
        if !text.is_empty() {
            params.push(("filter[text]", text.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("filter[status]", status.as_kitsu_str().to_string()));
        }
        if let Some(year) = self.year {
            params.push(("filter[year]", year.to_string()));
        }
        if let Some(show_type) = self.show_type {
            params.push(("filter[subtype]", show_type.as_kitsu_str().to_string()));
        }
        params.push(("sort", self.sort.as_kitsu_str().to_string()));
        params.push(("page[limit]", self.limit.to_string()));
        params.push(("page[offset]", self.offset().to_string()));
        params
    }
}

/// One page of normalized results.
#[derive(Debug, Clone, Default)]
pub struct CatalogPage {
    pub records: Vec<CatalogRecord>,
    /// `meta.count` when the server reports it.
    pub total_count: Option<u64>,
    pub has_next: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_params_full() {
        let query = CatalogQuery {
            text: "  cowboy bebop ".into(),
            status: Some(StatusFilter::Finished),
            year: Some(1998),
            show_type: Some(ShowType::Tv),
            sort: SortKey::HighestRated,
            page: 3,
            limit: 20,
        };
        let params = query.to_params();
        assert_eq!(
            params,
            vec![
                ("filter[text]", "cowboy bebop".to_string()),
                ("filter[status]", "finished".to_string()),
                ("filter[year]", "1998".to_string()),
                ("filter[subtype]", "TV".to_string()),
                ("sort", "-averageRating".to_string()),
                ("page[limit]", "20".to_string()),
                ("page[offset]", "40".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_params_skip_blank_text() {
        let query = CatalogQuery {
            text: "   ".into(),
            ..Default::default()
        };
        let params = query.to_params();
        assert!(params.iter().all(|(k, _)| *k != "filter[text]"));
        assert!(params.contains(&("sort", "-userCount".to_string())));
        assert!(params.contains(&("page[offset]", "0".to_string())));
    }

    #[test]
    fn test_offset_does_not_overflow() {
        let query = CatalogQuery {
            page: 3,
            limit: 3_000_000_000,
            ..Default::default()
        };
        assert_eq!(query.offset(), 6_000_000_000);
        assert!(query.to_params().contains(&("page[offset]", "6000000000".to_string())));

        let first = CatalogQuery {
            page: 0,
            ..Default::default()
        };
        assert_eq!(first.offset(), 0);
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(AiringStatus::from_kitsu("current"), AiringStatus::CurrentlyAiring);
        assert_eq!(AiringStatus::from_kitsu("finished"), AiringStatus::FinishedAiring);
        assert_eq!(AiringStatus::from_kitsu("upcoming"), AiringStatus::NotYetAired);
        assert_eq!(AiringStatus::from_kitsu("tba"), AiringStatus::NotYetAired);
        assert_eq!(AiringStatus::from_kitsu("weird"), AiringStatus::Unknown);
        assert_eq!(AiringStatus::Unknown.label(), "Unknown");
    }

    #[test]
    fn test_enum_string_roundtrip() {
        for key in SortKey::ALL {
            assert_eq!(SortKey::from_kitsu_str(key.as_kitsu_str()), Some(*key));
        }
        for status in StatusFilter::ALL {
            assert_eq!(StatusFilter::from_kitsu_str(status.as_kitsu_str()), Some(*status));
        }
        assert_eq!(ShowType::from_kitsu_str("tv"), Some(ShowType::Tv));
        assert_eq!(ShowType::from_kitsu_str("Movie"), Some(ShowType::Movie));
        assert_eq!(ShowType::from_kitsu_str("film"), None);
    }

    #[test]
    fn test_display_helpers() {
        let record = CatalogRecord {
            id: 1,
            title: "Test".into(),
            title_english: None,
            title_japanese: None,
            images: RecordImages::default(),
            score: 8.345,
            year: None,
            episodes: 0,
            status: AiringStatus::Unknown,
            synopsis: String::new(),
            genres: Vec::new(),
            show_type: "TV".into(),
            age_rating: "PG".into(),
            popularity_rank: 0,
            rating_rank: 0,
            start_date: Some("1998-04-03".into()),
            end_date: None,
            episode_length: 24,
            age_rating_guide: None,
            trailer_id: None,
            tba: None,
        };
        assert_eq!(record.display_score(), "8.3");
        assert_eq!(record.display_episodes(), "?");
        assert_eq!(record.aired_range(), "1998-04-03 to Ongoing");
        // Stored value keeps full precision.
        assert!((record.score - 8.345).abs() < f64::EPSILON);
        assert_eq!(record.display_age_rating(), "PG");
        assert_eq!(record.trailer_url(), None);
        assert_eq!(record.images.cover(), PLACEHOLDER_IMAGE);
    }

    #[test]
    fn test_records_saved_without_detail_fields_still_load() {
        let raw = r#"{"id": 3, "title": "Old", "images": {"small": "s.jpg", "large": "l.jpg"}}"#;
        let record: CatalogRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.episode_length, 0);
        assert_eq!(record.trailer_id, None);
        assert_eq!(record.images.cover(), "l.jpg");
        assert_eq!(record.age_rating, "Not Rated");
    }
}
