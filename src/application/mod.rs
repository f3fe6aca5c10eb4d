// Application layer - Use cases and ports
pub mod map_state;
pub mod overlay;
pub mod overlay_service;
pub mod reading_source;
pub mod resolver;

#[cfg(test)]
pub(crate) mod test_support;
