pub mod curation;
pub mod dedup;
pub mod selection;
pub mod selector;
