pub mod collections;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod search;

#[cfg(test)]
mod test_support;

pub use error::ShioriError;
