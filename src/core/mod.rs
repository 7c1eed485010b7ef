pub mod clash;
pub mod engine;
pub mod genre;
pub mod geo;
pub mod search;
