pub mod candidates;
pub mod history;
pub mod report;
