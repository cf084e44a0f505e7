//! Landing view: four category lists loaded concurrently.

use chrono::Datelike;
use shiori_api::{CatalogQuery, CatalogRecord, CatalogSource, SortKey, StatusFilter};

/// The dashboard categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    TopRated,
    MostPopular,
    CurrentlyAiring,
    NewReleases,
}

impl Category {
    pub const ALL: &[Category] = &[
        Self::MostPopular,
        Self::TopRated,
        Self::CurrentlyAiring,
        Self::NewReleases,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::TopRated => "Top Rated",
            Self::MostPopular => "Most Popular",
            Self::CurrentlyAiring => "Currently Airing",
            Self::NewReleases => "New Releases",
        }
    }

    /// The catalog request behind this category.
    pub fn query(self, limit: u32, current_year: i32) -> CatalogQuery {
        let base = CatalogQuery {
            limit,
            ..Default::default()
        };
        match self {
            Self::TopRated => CatalogQuery {
                sort: SortKey::HighestRated,
                status: Some(StatusFilter::Finished),
                ..base
            },
            Self::MostPopular => CatalogQuery {
                sort: SortKey::MostPopular,
                ..base
            },
            Self::CurrentlyAiring => CatalogQuery {
                sort: SortKey::MostPopular,
                status: Some(StatusFilter::Current),
                ..base
            },
            Self::NewReleases => CatalogQuery {
                sort: SortKey::MostRecent,
                year: Some(current_year),
                ..base
            },
        }
    }
}

/// Results for every category; a failed category is empty.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub top_rated: Vec<CatalogRecord>,
    pub most_popular: Vec<CatalogRecord>,
    pub currently_airing: Vec<CatalogRecord>,
    pub new_releases: Vec<CatalogRecord>,
}

impl Dashboard {
    pub fn category(&self, category: Category) -> &[CatalogRecord] {
        match category {
            Category::TopRated => &self.top_rated,
            Category::MostPopular => &self.most_popular,
            Category::CurrentlyAiring => &self.currently_airing,
            Category::NewReleases => &self.new_releases,
        }
    }
}

/// Issue all four category requests at once and wait for every one.
pub async fn load<S: CatalogSource>(source: &S, limit: u32) -> Dashboard {
    load_for_year(source, limit, chrono::Utc::now().year()).await
}

pub async fn load_for_year<S: CatalogSource>(source: &S, limit: u32, year: i32) -> Dashboard {
    let (top_rated, most_popular, currently_airing, new_releases) = futures::join!(
        fetch_category(source, Category::TopRated, limit, year),
        fetch_category(source, Category::MostPopular, limit, year),
        fetch_category(source, Category::CurrentlyAiring, limit, year),
        fetch_category(source, Category::NewReleases, limit, year),
    );
    Dashboard {
        top_rated,
        most_popular,
        currently_airing,
        new_releases,
    }
}

async fn fetch_category<S: CatalogSource>(
    source: &S,
    category: Category,
    limit: u32,
    year: i32,
) -> Vec<CatalogRecord> {
    match source.search(&category.query(limit, year)).await {
        Ok(page) => page.records,
        Err(e) => {
            tracing::warn!(category = category.label(), error = %e, "dashboard category failed");
            Vec::new()
        }
    }
}
