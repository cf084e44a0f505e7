pub mod client;
pub mod error;
pub mod normalize;
pub mod types;

pub use client::{KitsuClient, MAX_PAGE_LIMIT};
pub use error::KitsuError;
pub use normalize::normalize;
