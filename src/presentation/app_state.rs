// Application state for HTTP handlers
use crate::application::map_state::MapState;
use crate::application::overlay_service::OverlayService;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub struct AppState {
    pub overlay_service: OverlayService,
    map_state: Mutex<MapState>,
}

impl AppState {
    pub fn new(overlay_service: OverlayService) -> Self {
        Self {
            overlay_service,
            map_state: Mutex::new(MapState::default()),
        }
    }

    pub fn map_state(&self) -> MutexGuard<'_, MapState> {
        self.map_state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
