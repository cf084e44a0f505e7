use shiori_api::{CatalogQuery, CatalogRecord, ShowType, SortKey, StatusFilter};

/// Structured search filters.
///
/// Status, year and show type are sent to the server; the score range and
/// genre are applied locally after normalization.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchFilters {
    pub status: Option<StatusFilter>,
    pub genre: Option<String>,
    pub year: Option<i32>,
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub sort: SortKey,
    pub show_type: Option<ShowType>,
}

/// A single filter edit.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterChange {
    Status(Option<StatusFilter>),
    Genre(Option<String>),
    Year(Option<i32>),
    MinScore(Option<f64>),
    MaxScore(Option<f64>),
    Sort(SortKey),
    ShowType(Option<ShowType>),
}

impl SearchFilters {
    /// Return a copy with `change` applied.
    pub fn with(&self, change: FilterChange) -> Self {
        let mut next = self.clone();
        match change {
            FilterChange::Status(v) => next.status = v,
            FilterChange::Genre(v) => next.genre = v.filter(|g| !g.trim().is_empty()),
            FilterChange::Year(v) => next.year = v,
            FilterChange::MinScore(v) => next.min_score = v,
            FilterChange::MaxScore(v) => next.max_score = v,
            FilterChange::Sort(v) => next.sort = v,
            FilterChange::ShowType(v) => next.show_type = v,
        }
        next
    }

    /// Whether anything differs from the cleared state.
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    /// Build the server request for `page`.
    pub fn to_query(&self, text: &str, page: u32, limit: u32) -> CatalogQuery {
        CatalogQuery {
            text: text.trim().to_string(),
            status: self.status,
            year: self.year,
            show_type: self.show_type,
            sort: self.sort,
            page,
            limit,
        }
    }

    /// Whether `record` passes the locally applied filters.
    pub fn matches_locally(&self, record: &CatalogRecord) -> bool {
        if let Some(min) = self.min_score {
            if record.score < min {
                return false;
            }
        }
        if let Some(max) = self.max_score {
            if record.score > max {
                return false;
            }
        }
        if let Some(genre) = &self.genre {
            // No genre data means the record cannot be excluded.
            if !record.genres.is_empty()
                && !record.genres.iter().any(|g| g.eq_ignore_ascii_case(genre.trim()))
            {
                return false;
            }
        }
        true
    }

    /// Apply the local filters to a page of records.
    pub fn apply_local(&self, records: Vec<CatalogRecord>) -> Vec<CatalogRecord> {
        records.into_iter().filter(|r| self.matches_locally(r)).collect()
    }
}
