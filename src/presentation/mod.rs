// Presentation layer - HTTP bridge for the map front-end
pub mod app_state;
pub mod handlers;
