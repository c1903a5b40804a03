//! crates/booking_core/src/appointments.rs
//!
//! CRUD over appointment records plus the availability query.

use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::availability::DayAvailability;
use crate::domain::{Appointment, AppointmentId, AppointmentStatus, ProfessionalId, UserId};
use crate::ports::{AppointmentStore, PortError, PortResult};

#[derive(Clone)]
pub struct AppointmentRepository {
    store: Arc<dyn AppointmentStore>,
}

impl AppointmentRepository {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// The user's appointments, most recently created first.
    pub async fn list_for_user(&self, user_id: &UserId) -> PortResult<Vec<Appointment>> {
        let mut mine: Vec<Appointment> = self
            .store
            .load_appointments()
            .await?
            .into_iter()
            .filter(|a| &a.user_id == user_id)
            .collect();
        mine.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(mine)
    }

    /// Every appointment across all users.
    pub async fn list_all(&self) -> PortResult<Vec<Appointment>> {
        self.store.load_appointments().await
    }

    /// Appends a new appointment.
    ///
    /// Fails with `Conflict` when the id is already used or when a non-cancelled
    /// appointment already holds the same professional, date and time.
    pub async fn create(&self, appointment: Appointment) -> PortResult<Appointment> {
        let mut all = self.store.load_appointments().await?;

        if all.iter().any(|a| a.id == appointment.id) {
            return Err(PortError::Conflict(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }

        let slot_taken = !appointment.is_cancelled()
            && all.iter().any(|a| {
                a.holds_slot(&appointment.professional_id, appointment.date)
                    && a.time == appointment.time
            });
        if slot_taken {
            warn!(
                professional_id = %appointment.professional_id,
                date = %appointment.date,
                time = %appointment.time,
                "Rejected double booking."
            );
            return Err(PortError::Conflict(format!(
                "{} is already booked with {} on {}",
                appointment.time, appointment.professional_id, appointment.date
            )));
        }

        all.push(appointment.clone());
        self.store.store_appointments(&all).await?;
        info!(
            appointment_id = %appointment.id,
            user_id = %appointment.user_id,
            "Appointment created."
        );
        Ok(appointment)
    }

    /// Marks the appointment cancelled. Unknown ids are a no-op; returns whether it was found.
    pub async fn cancel(&self, appointment_id: &AppointmentId) -> PortResult<bool> {
        let mut all = self.store.load_appointments().await?;
        let Some(appointment) = all.iter_mut().find(|a| &a.id == appointment_id) else {
            debug!(%appointment_id, "Cancel requested for unknown appointment.");
            return Ok(false);
        };

        if appointment.status != AppointmentStatus::Cancelled {
            appointment.status = AppointmentStatus::Cancelled;
            self.store.store_appointments(&all).await?;
            info!(%appointment_id, "Appointment cancelled.");
        }
        Ok(true)
    }

    pub async fn get(&self, appointment_id: &AppointmentId) -> PortResult<Option<Appointment>> {
        let all = self.store.load_appointments().await?;
        Ok(all.into_iter().find(|a| &a.id == appointment_id))
    }

    /// Free and taken slots for a professional's whole calendar on `date`, across all users.
    pub async fn availability(
        &self,
        professional_id: &ProfessionalId,
        date: NaiveDate,
    ) -> PortResult<DayAvailability> {
        let all = self.store.load_appointments().await?;
        Ok(DayAvailability::compute(&all, professional_id, date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use chrono::{Duration, Utc};

    fn repository() -> AppointmentRepository {
        AppointmentRepository::new(Arc::new(MemoryStore::new()))
    }

    fn appointment(user: &str, time: &str, minutes_ago: i64) -> Appointment {
        Appointment {
            id: AppointmentId::generate(),
            user_id: UserId::from(user),
            service_id: "s1".into(),
            professional_id: "p1".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            time: time.parse().unwrap(),
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn list_for_user_filters_and_sorts_newest_first() {
        let repo = repository();
        let oldest = repo.create(appointment("u1", "09:00", 30)).await.unwrap();
        let newest = repo.create(appointment("u1", "10:00", 1)).await.unwrap();
        repo.create(appointment("u2", "11:00", 5)).await.unwrap();
        let middle = repo.create(appointment("u1", "13:00", 10)).await.unwrap();

        let mine = repo.list_for_user(&UserId::from("u1")).await.unwrap();
        let ids: Vec<&AppointmentId> = mine.iter().map(|a| &a.id).collect();
        assert_eq!(ids, vec![&newest.id, &middle.id, &oldest.id]);
        assert!(mine.iter().all(|a| a.user_id == UserId::from("u1")));
        assert_eq!(repo.list_all().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn cancel_is_idempotent_and_ignores_unknown_ids() {
        let repo = repository();
        let booked = repo.create(appointment("u1", "09:00", 0)).await.unwrap();

        assert!(repo.cancel(&booked.id).await.unwrap());
        assert!(repo.cancel(&booked.id).await.unwrap());
        let stored = repo.get(&booked.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AppointmentStatus::Cancelled);

        assert!(!repo.cancel(&AppointmentId::from("apt_missing")).await.unwrap());
    }

    #[tokio::test]
    async fn create_rejects_a_taken_slot_until_it_is_cancelled() {
        let repo = repository();
        let first = repo.create(appointment("u1", "09:00", 0)).await.unwrap();

        let err = repo.create(appointment("u2", "09:00", 0)).await.unwrap_err();
        assert!(matches!(err, PortError::Conflict(_)));

        repo.cancel(&first.id).await.unwrap();
        repo.create(appointment("u2", "09:00", 0)).await.unwrap();
    }

    #[tokio::test]
    async fn create_rejects_duplicate_ids() {
        let repo = repository();
        let booked = repo.create(appointment("u1", "09:00", 0)).await.unwrap();
        let mut copy = appointment("u1", "10:00", 0);
        copy.id = booked.id.clone();

        assert!(matches!(
            repo.create(copy).await.unwrap_err(),
            PortError::Conflict(_)
        ));
    }

    #[tokio::test]
    async fn cancelling_returns_the_slot_to_availability() {
        let repo = repository();
        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let nine: crate::domain::TimeSlot = "09:00".parse().unwrap();
        let booked = repo.create(appointment("u1", "09:00", 0)).await.unwrap();

        let before = repo.availability(&"p1".into(), date).await.unwrap();
        assert!(!before.is_available(nine));

        repo.cancel(&booked.id).await.unwrap();
        let after = repo.availability(&"p1".into(), date).await.unwrap();
        assert!(after.is_available(nine));
        assert!(after.taken.is_empty());
    }
}
