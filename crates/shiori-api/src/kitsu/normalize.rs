//! Mapping of Kitsu anime resources into [`CatalogRecord`].
//!
//! The mapping is total: every missing or malformed field falls back to a
//! fixed default, so any resource the client can deserialize produces a
//! record.

use super::types::{JsonApiResource, KitsuAnimeAttributes, KitsuImage};
use crate::traits::{AiringStatus, CatalogRecord, RecordImages, PLACEHOLDER_IMAGE};

const UNKNOWN_TITLE: &str = "Unknown Title";

/// Normalize one anime resource.
pub fn normalize(resource: &JsonApiResource) -> CatalogRecord {
    let id = resource.id.trim().parse().unwrap_or(0);
    KitsuAnimeAttributes::from_value(&resource.attributes).into_record(id)
}

impl KitsuAnimeAttributes {
    pub fn into_record(self, id: u64) -> CatalogRecord {
        let titles = self.titles.unwrap_or_default();
        let title_english = non_empty(titles.en);
        let title_romaji = non_empty(titles.en_jp);

        let title = non_empty(self.canonical_title)
            .or_else(|| title_english.clone())
            .or_else(|| title_romaji.clone())
            .unwrap_or_else(|| UNKNOWN_TITLE.to_string());

        let start_date = non_empty(self.start_date);
        let year = start_date
            .as_deref()
            .and_then(|d| d.split('-').next())
            .and_then(|y| y.parse().ok());

        CatalogRecord {
            id,
            title,
            title_english,
            title_japanese: non_empty(titles.ja_jp),
            images: resolve_images(
                self.poster_image.unwrap_or_default(),
                self.cover_image.unwrap_or_default(),
            ),
            score: self.average_rating.map(|r| r / 10.0).unwrap_or(0.0),
            year,
            episodes: self.episode_count.unwrap_or(0),
            status: non_empty(self.status)
                .map(|s| AiringStatus::from_kitsu(&s))
                .unwrap_or_default(),
            synopsis: self.synopsis.unwrap_or_default(),
            // Genres need a second request per record; not performed.
            genres: Vec::new(),
            show_type: non_empty(self.show_type)
                .or_else(|| non_empty(self.subtype))
                .unwrap_or_else(|| "Unknown".to_string()),
            age_rating: non_empty(self.age_rating).unwrap_or_else(|| "Not Rated".to_string()),
            popularity_rank: self.popularity_rank.unwrap_or(0),
            rating_rank: self.rating_rank.unwrap_or(0),
            start_date,
            end_date: non_empty(self.end_date),
            episode_length: self.episode_length.unwrap_or(0),
            age_rating_guide: non_empty(self.age_rating_guide),
            trailer_id: non_empty(self.youtube_video_id),
            tba: non_empty(self.tba),
        }
    }
}

fn resolve_images(poster: KitsuImage, cover: KitsuImage) -> RecordImages {
    let KitsuImage {
        tiny,
        small,
        medium,
        large,
        original,
    } = poster;
    let (tiny, small, medium, large, original) = (
        non_empty(tiny),
        non_empty(small),
        non_empty(medium),
        non_empty(large),
        non_empty(original),
    );

    let big = first_of(&[&large, &original, &medium, &small, &tiny]);
    let thumb = first_of(&[&small, &tiny, &medium, &large, &original]);

    RecordImages {
        small: thumb,
        large: big,
        cover: non_empty(cover.large).or_else(|| non_empty(cover.original)),
    }
}

fn first_of(chain: &[&Option<String>]) -> String {
    chain
        .iter()
        .find_map(|c| c.as_ref())
        .cloned()
        .unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}
