use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use shiori_api::{AiringStatus, CatalogPage, CatalogQuery, CatalogRecord, CatalogSource, RecordImages};

#[derive(Debug, thiserror::Error)]
#[error("fake failure: {0}")]
pub struct FakeError(pub String);

type Responder = Box<dyn Fn(&CatalogQuery) -> Result<CatalogPage, String> + Send + Sync>;

/// In-process catalog that records every query it receives.
pub struct FakeSource {
    responder: Responder,
    delays: HashMap<String, Duration>,
    calls: Mutex<Vec<(Instant, CatalogQuery)>>,
}

impl FakeSource {
    pub fn new(
        responder: impl Fn(&CatalogQuery) -> Result<CatalogPage, String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            delays: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Delay answers to queries whose text is `text`.
    pub fn with_delay(mut self, text: &str, delay: Duration) -> Self {
        self.delays.insert(text.to_string(), delay);
        self
    }

    pub fn calls(&self) -> Vec<(Instant, CatalogQuery)> {
        self.calls.lock().unwrap().clone()
    }
}

impl CatalogSource for FakeSource {
    type Error = FakeError;

    async fn search(&self, query: &CatalogQuery) -> Result<CatalogPage, FakeError> {
        self.calls.lock().unwrap().push((Instant::now(), query.clone()));
        if let Some(delay) = self.delays.get(&query.text) {
            tokio::time::sleep(*delay).await;
        }
        (self.responder)(query).map_err(FakeError)
    }

    async fn get_anime(&self, id: u64) -> Result<CatalogRecord, FakeError> {
        Ok(record(id, 0.0))
    }
}

pub fn record(id: u64, score: f64) -> CatalogRecord {
    CatalogRecord {
        id,
        title: format!("Anime {id}"),
        title_english: None,
        title_japanese: None,
        images: RecordImages::default(),
        score,
        year: None,
        episodes: 0,
        status: AiringStatus::Unknown,
        synopsis: String::new(),
        genres: Vec::new(),
        show_type: "TV".into(),
        age_rating: "Not Rated".into(),
        popularity_rank: 0,
        rating_rank: 0,
        start_date: None,
        end_date: None,
        episode_length: 0,
        age_rating_guide: None,
        trailer_id: None,
        tba: None,
    }
}

/// A page of `(id, score)` records with a server count of 100.
pub fn page_of(records: &[(u64, f64)], has_next: bool) -> CatalogPage {
    CatalogPage {
        records: records.iter().map(|&(id, score)| record(id, score)).collect(),
        total_count: Some(100),
        has_next,
    }
}
