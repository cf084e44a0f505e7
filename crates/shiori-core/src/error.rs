use shiori_api::kitsu::KitsuError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShioriError {
    #[error("config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(#[from] KitsuError),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("search failed: {0}")]
    Search(String),
}
