//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use booking_core::{
    ports::{AppointmentStore, CatalogStore, SessionStore, StyleAssistantService},
    AppointmentRepository, AuthService, BookingWorkflow, Catalog, FavoritesManager,
    SessionManager, StyleAssistant,
};
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// The app serves a single logged-in user at a time, so the booking in progress
/// and the assistant conversation live here rather than per connection.
pub struct AppState {
    pub config: Arc<Config>,
    pub catalog: Catalog,
    pub sessions: SessionManager,
    pub auth: AuthService,
    pub appointments: AppointmentRepository,
    pub favorites: FavoritesManager,
    /// `None` until `POST /booking` starts a wizard, and again after it confirms.
    pub booking: Mutex<Option<BookingWorkflow>>,
    /// Held for the whole assistant round trip.
    pub assistant: Mutex<StyleAssistant>,
}

impl AppState {
    /// Wires every manager to the one store that backs all storage ports.
    pub fn new<S>(
        config: Arc<Config>,
        store: Arc<S>,
        assistant: Arc<dyn StyleAssistantService>,
    ) -> Self
    where
        S: SessionStore + AppointmentStore + CatalogStore + 'static,
    {
        let catalog = Catalog::new(store.clone());
        let sessions = SessionManager::new(store.clone());
        Self {
            config,
            auth: AuthService::new(sessions.clone()),
            favorites: FavoritesManager::new(sessions.clone(), catalog.clone()),
            appointments: AppointmentRepository::new(store),
            booking: Mutex::new(None),
            assistant: Mutex::new(StyleAssistant::new(assistant)),
            catalog,
            sessions,
        }
    }
}
