//! Debounced, paginated catalog search.
//!
//! A [`SearchHandle`] drives one [`SearchSession`] from a dedicated task:
//! query and filter edits are coalesced over a quiet period, page 1 replaces
//! the result list, further pages are appended, and score/genre filters the
//! server does not understand are applied locally.

pub mod filters;
pub mod pipeline;
pub mod session;

pub use filters::{FilterChange, SearchFilters};
pub use pipeline::{SearchConfig, SearchHandle};
pub use session::{SearchPhase, SearchSession, SearchSnapshot};
