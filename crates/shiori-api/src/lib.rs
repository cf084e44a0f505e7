pub mod kitsu;
pub mod traits;

pub use traits::{
    AiringStatus, CatalogPage, CatalogQuery, CatalogRecord, CatalogSource, RecordImages, ShowType,
    SortKey, StatusFilter, PLACEHOLDER_IMAGE,
};
