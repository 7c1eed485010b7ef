// Adapters layer: concrete implementations for external systems (http, providers, geocoding, calendar, export).

pub mod calendar_store;
pub mod export;
pub mod http;
pub mod opencage;
pub mod response;
pub mod skiddle;
pub mod ticketmaster;

pub use calendar_store::JsonCalendarStore;
pub use http::ReqwestFetcher;
pub use opencage::OpenCageGeocoder;
pub use skiddle::SkiddleAdapter;
pub use ticketmaster::TicketmasterAdapter;
