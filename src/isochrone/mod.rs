pub mod arena;
pub mod cone;
pub mod prune;
pub mod search;

pub use search::{IsochroneSearch, SearchOutcome, SearchState};
