pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::JsonCalendarStore;
pub use config::toml_config::AppConfig;
pub use crate::core::{clash::CalendarClashDetector, engine::EventSearchEngine, search::SearchCoordinator};
pub use domain::model::{
    AnnotatedEvent, CalendarEvent, ClashStatus, FoundEvent, ProviderId, SearchRequest,
};
pub use utils::error::{EventSearchError, Result};
