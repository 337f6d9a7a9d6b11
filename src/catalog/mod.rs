//! Modifier catalog - loading, filtering, and splitting the NDJSON stat catalog.

mod filter;
mod loader;
mod modifier;
mod split;

pub use filter::ModFilter;
pub use loader::Catalog;
pub use modifier::{MatcherTemplate, Modifier};
pub use split::{AREA_MARKER, SplitSummary, split_area_mods};
