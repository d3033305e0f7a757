pub mod cookies;
pub mod listing;
pub mod plan;
pub mod runner;
