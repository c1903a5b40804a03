//! crates/booking_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the booking core.
//! These traits form the boundary of the hexagonal architecture: the managers in
//! this crate only ever talk to storage and to the style assistant through them,
//! so an in-memory fake or a file-backed store can be swapped in freely.

use async_trait::async_trait;

use crate::domain::{Appointment, ChatMessage, Professional, Service, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., file I/O, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports (Traits)
//=========================================================================================

/// The "who is logged in" marker plus the full user collection.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_session(&self) -> PortResult<Option<User>>;

    async fn store_session(&self, user: &User) -> PortResult<()>;

    /// Drops only the session marker. The user collection is left alone.
    async fn clear_session(&self) -> PortResult<()>;

    async fn load_users(&self) -> PortResult<Vec<User>>;

    async fn store_users(&self, users: &[User]) -> PortResult<()>;
}

/// Appointments of every user, stored as one collection.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn load_appointments(&self) -> PortResult<Vec<Appointment>>;

    async fn store_appointments(&self, appointments: &[Appointment]) -> PortResult<()>;
}

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn load_services(&self) -> PortResult<Vec<Service>>;

    async fn load_professionals(&self) -> PortResult<Vec<Professional>>;

    /// Writes each list only when nothing has been stored under it yet.
    async fn seed_if_absent(
        &self,
        services: &[Service],
        professionals: &[Professional],
    ) -> PortResult<()>;
}

//=========================================================================================
// External Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait StyleAssistantService: Send + Sync {
    /// Answers `message` given the prior conversation. Any LLM-capable provider fits here.
    async fn reply(&self, history: &[ChatMessage], message: &str) -> PortResult<String>;
}
