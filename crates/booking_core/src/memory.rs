//! crates/booking_core/src/memory.rs
//!
//! An in-process implementation of every storage port. Used by tests and by
//! ephemeral runs that do not need anything written to disk.

use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{Appointment, Professional, Service, User};
use crate::ports::{AppointmentStore, CatalogStore, PortError, PortResult, SessionStore};

#[derive(Default)]
struct MemoryState {
    session: Option<User>,
    users: Vec<User>,
    appointments: Vec<Appointment>,
    services: Option<Vec<Service>>,
    professionals: Option<Vec<Professional>>,
}

/// Keeps the same five records the file store keeps, in memory.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> PortResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PortError::Unexpected("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_session(&self) -> PortResult<Option<User>> {
        Ok(self.state()?.session.clone())
    }

    async fn store_session(&self, user: &User) -> PortResult<()> {
        self.state()?.session = Some(user.clone());
        Ok(())
    }

    async fn clear_session(&self) -> PortResult<()> {
        self.state()?.session = None;
        Ok(())
    }

    async fn load_users(&self) -> PortResult<Vec<User>> {
        Ok(self.state()?.users.clone())
    }

    async fn store_users(&self, users: &[User]) -> PortResult<()> {
        self.state()?.users = users.to_vec();
        Ok(())
    }
}

#[async_trait]
impl AppointmentStore for MemoryStore {
    async fn load_appointments(&self) -> PortResult<Vec<Appointment>> {
        Ok(self.state()?.appointments.clone())
    }

    async fn store_appointments(&self, appointments: &[Appointment]) -> PortResult<()> {
        self.state()?.appointments = appointments.to_vec();
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn load_services(&self) -> PortResult<Vec<Service>> {
        Ok(self.state()?.services.clone().unwrap_or_default())
    }

    async fn load_professionals(&self) -> PortResult<Vec<Professional>> {
        Ok(self.state()?.professionals.clone().unwrap_or_default())
    }

    async fn seed_if_absent(
        &self,
        services: &[Service],
        professionals: &[Professional],
    ) -> PortResult<()> {
        let mut state = self.state()?;
        if state.services.is_none() {
            state.services = Some(services.to_vec());
        }
        if state.professionals.is_none() {
            state.professionals = Some(professionals.to_vec());
        }
        Ok(())
    }
}
