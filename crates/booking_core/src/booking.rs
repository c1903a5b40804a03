//! crates/booking_core/src/booking.rs
//!
//! The four-step booking wizard: service, professional, date/time, confirm.
//!
//! One instance books at most one appointment: `confirm` consumes it. Starting
//! over means building a fresh instance with nothing selected.

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info};

use crate::appointments::AppointmentRepository;
use crate::availability::DayAvailability;
use crate::catalog::Catalog;
use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, Professional, ProfessionalId, Service,
    ServiceId, TimeSlot, UserId,
};
use crate::ports::PortError;
use crate::session::SessionManager;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BookingStep {
    SelectingService,
    SelectingProfessional,
    SelectingDateTime,
    Confirming,
}

impl BookingStep {
    fn previous(self) -> Self {
        match self {
            BookingStep::SelectingService | BookingStep::SelectingProfessional => {
                BookingStep::SelectingService
            }
            BookingStep::SelectingDateTime => BookingStep::SelectingProfessional,
            BookingStep::Confirming => BookingStep::SelectingDateTime,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error("cannot {action} while at step {step:?}")]
    WrongStep {
        step: BookingStep,
        action: &'static str,
    },
    #[error("a {0} must be chosen first")]
    MissingSelection(&'static str),
    #[error("unknown service {0}")]
    UnknownService(ServiceId),
    #[error("unknown professional {0}")]
    UnknownProfessional(ProfessionalId),
    #[error("{0} is in the past")]
    DateInPast(NaiveDate),
    #[error("{0} is already taken")]
    SlotUnavailable(TimeSlot),
    #[error("availability was computed for another professional or date")]
    StaleAvailability,
    #[error("no active session")]
    NoSession,
    #[error(transparent)]
    Port(#[from] PortError),
}

/// A failed `confirm`. Hands the untouched workflow back with the reason.
#[derive(Debug, thiserror::Error)]
#[error("booking not confirmed: {error}")]
pub struct ConfirmError {
    pub workflow: Box<BookingWorkflow>,
    #[source]
    pub error: BookingError,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingWorkflow {
    step: BookingStep,
    service: Option<Service>,
    professional: Option<Professional>,
    date: Option<NaiveDate>,
    time: Option<TimeSlot>,
}

impl Default for BookingWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl BookingWorkflow {
    pub fn new() -> Self {
        Self {
            step: BookingStep::SelectingService,
            service: None,
            professional: None,
            date: None,
            time: None,
        }
    }

    pub fn step(&self) -> BookingStep {
        self.step
    }

    pub fn service(&self) -> Option<&Service> {
        self.service.as_ref()
    }

    pub fn professional(&self) -> Option<&Professional> {
        self.professional.as_ref()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    pub fn time(&self) -> Option<TimeSlot> {
        self.time
    }

    fn expect_step(&self, step: BookingStep, action: &'static str) -> Result<(), BookingError> {
        if self.step == step {
            Ok(())
        } else {
            Err(BookingError::WrongStep {
                step: self.step,
                action,
            })
        }
    }

    pub async fn select_service(
        &mut self,
        catalog: &Catalog,
        service_id: &ServiceId,
    ) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingService, "select a service")?;
        let service = catalog
            .service(service_id)
            .await?
            .ok_or_else(|| BookingError::UnknownService(service_id.clone()))?;
        self.service = Some(service);
        Ok(())
    }

    /// Changing the professional drops the chosen time, since slots are per professional.
    pub async fn select_professional(
        &mut self,
        catalog: &Catalog,
        professional_id: &ProfessionalId,
    ) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingProfessional, "select a professional")?;
        let professional = catalog
            .professional(professional_id)
            .await?
            .ok_or_else(|| BookingError::UnknownProfessional(professional_id.clone()))?;
        self.set_professional(professional);
        Ok(())
    }

    fn set_professional(&mut self, professional: Professional) {
        if self.professional.as_ref().map(|p| &p.id) != Some(&professional.id) {
            self.time = None;
        }
        self.professional = Some(professional);
    }

    /// Shortcut from the first step straight to date/time with a saved pair.
    pub async fn use_favorite(
        &mut self,
        catalog: &Catalog,
        service_id: &ServiceId,
        professional_id: &ProfessionalId,
    ) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingService, "use a favorite")?;
        let service = catalog
            .service(service_id)
            .await?
            .ok_or_else(|| BookingError::UnknownService(service_id.clone()))?;
        let professional = catalog
            .professional(professional_id)
            .await?
            .ok_or_else(|| BookingError::UnknownProfessional(professional_id.clone()))?;

        self.service = Some(service);
        self.set_professional(professional);
        self.step = BookingStep::SelectingDateTime;
        debug!(%service_id, %professional_id, "Favorite shortcut taken.");
        Ok(())
    }

    /// Picks the day. Any previously chosen time is cleared.
    pub fn select_date(&mut self, date: NaiveDate, today: NaiveDate) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingDateTime, "select a date")?;
        if date < today {
            return Err(BookingError::DateInPast(date));
        }
        self.date = Some(date);
        self.time = None;
        Ok(())
    }

    /// Picks a slot from `availability`, which must be for the current professional and date.
    pub fn select_time(
        &mut self,
        slot: TimeSlot,
        availability: &DayAvailability,
    ) -> Result<(), BookingError> {
        self.expect_step(BookingStep::SelectingDateTime, "select a time")?;
        let professional = self
            .professional
            .as_ref()
            .ok_or(BookingError::MissingSelection("professional"))?;
        let date = self.date.ok_or(BookingError::MissingSelection("date"))?;
        if !availability.covers(&professional.id, date) {
            return Err(BookingError::StaleAvailability);
        }
        if !availability.is_available(slot) {
            return Err(BookingError::SlotUnavailable(slot));
        }
        self.time = Some(slot);
        Ok(())
    }

    /// Advances one step when the current step's selection is made.
    pub fn next(&mut self) -> Result<BookingStep, BookingError> {
        self.step = match self.step {
            BookingStep::SelectingService => {
                self.service
                    .as_ref()
                    .ok_or(BookingError::MissingSelection("service"))?;
                BookingStep::SelectingProfessional
            }
            BookingStep::SelectingProfessional => {
                self.professional
                    .as_ref()
                    .ok_or(BookingError::MissingSelection("professional"))?;
                BookingStep::SelectingDateTime
            }
            BookingStep::SelectingDateTime => {
                self.date.ok_or(BookingError::MissingSelection("date"))?;
                self.time.ok_or(BookingError::MissingSelection("time"))?;
                BookingStep::Confirming
            }
            BookingStep::Confirming => {
                return Err(BookingError::WrongStep {
                    step: self.step,
                    action: "advance",
                })
            }
        };
        Ok(self.step)
    }

    /// Goes back one step, keeping every selection. A no-op on the first step.
    pub fn back(&mut self) -> BookingStep {
        self.step = self.step.previous();
        self.step
    }

    fn draft(&self, user_id: UserId, now: DateTime<Utc>) -> Result<Appointment, BookingError> {
        self.expect_step(BookingStep::Confirming, "confirm")?;
        let service = self
            .service
            .as_ref()
            .ok_or(BookingError::MissingSelection("service"))?;
        let professional = self
            .professional
            .as_ref()
            .ok_or(BookingError::MissingSelection("professional"))?;
        let date = self.date.ok_or(BookingError::MissingSelection("date"))?;
        let time = self.time.ok_or(BookingError::MissingSelection("time"))?;

        Ok(Appointment {
            id: AppointmentId::generate(),
            user_id,
            service_id: service.id.clone(),
            professional_id: professional.id.clone(),
            date,
            time,
            status: AppointmentStatus::Confirmed,
            created_at: now,
        })
    }

    /// Books the appointment for the session user and consumes the workflow.
    pub async fn confirm(
        self,
        sessions: &SessionManager,
        appointments: &AppointmentRepository,
        now: DateTime<Utc>,
    ) -> Result<Appointment, ConfirmError> {
        if let Err(error) = self.expect_step(BookingStep::Confirming, "confirm") {
            return Err(self.fail(error));
        }
        let user = match sessions.current_user().await {
            Ok(Some(user)) => user,
            Ok(None) => return Err(self.fail(BookingError::NoSession)),
            Err(e) => return Err(self.fail(e.into())),
        };
        let appointment = match self.draft(user.id, now) {
            Ok(appointment) => appointment,
            Err(error) => return Err(self.fail(error)),
        };

        match appointments.create(appointment).await {
            Ok(created) => {
                info!(appointment_id = %created.id, "Booking confirmed.");
                Ok(created)
            }
            Err(e) => Err(self.fail(e.into())),
        }
    }

    fn fail(self, error: BookingError) -> ConfirmError {
        ConfirmError {
            workflow: Box::new(self),
            error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::memory::MemoryStore;
    use std::sync::Arc;

    struct Fixture {
        catalog: Catalog,
        sessions: SessionManager,
        appointments: AppointmentRepository,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        catalog.seed_defaults().await.unwrap();
        Fixture {
            catalog,
            sessions: SessionManager::new(store.clone()),
            appointments: AppointmentRepository::new(store),
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn next_requires_the_current_selection() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();

        assert!(matches!(
            wizard.next(),
            Err(BookingError::MissingSelection("service"))
        ));
        wizard.select_service(&f.catalog, &"s1".into()).await.unwrap();
        assert_eq!(wizard.next().unwrap(), BookingStep::SelectingProfessional);

        assert!(wizard.next().is_err());
        wizard
            .select_professional(&f.catalog, &"p1".into())
            .await
            .unwrap();
        assert_eq!(wizard.next().unwrap(), BookingStep::SelectingDateTime);

        wizard.select_date(day(10), day(9)).unwrap();
        assert!(matches!(
            wizard.next(),
            Err(BookingError::MissingSelection("time"))
        ));
    }

    #[tokio::test]
    async fn selections_only_in_their_own_step() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();
        let err = wizard
            .select_professional(&f.catalog, &"p1".into())
            .await
            .unwrap_err();
        assert!(matches!(err, BookingError::WrongStep { .. }));
        assert!(wizard.select_date(day(10), day(9)).is_err());
    }

    #[tokio::test]
    async fn unknown_catalog_ids_are_rejected() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();
        assert!(matches!(
            wizard.select_service(&f.catalog, &"s42".into()).await,
            Err(BookingError::UnknownService(_))
        ));
        assert!(matches!(
            wizard.use_favorite(&f.catalog, &"s1".into(), &"p42".into()).await,
            Err(BookingError::UnknownProfessional(_))
        ));
        assert_eq!(wizard.step(), BookingStep::SelectingService);
    }

    #[tokio::test]
    async fn back_keeps_selections_and_stops_at_the_first_step() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();
        wizard.select_service(&f.catalog, &"s2".into()).await.unwrap();
        wizard.next().unwrap();

        assert_eq!(wizard.back(), BookingStep::SelectingService);
        assert_eq!(wizard.back(), BookingStep::SelectingService);
        assert_eq!(wizard.service().unwrap().id, ServiceId::from("s2"));
    }

    #[tokio::test]
    async fn favorite_shortcut_jumps_to_date_time() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();
        wizard
            .use_favorite(&f.catalog, &"s3".into(), &"p2".into())
            .await
            .unwrap();

        assert_eq!(wizard.step(), BookingStep::SelectingDateTime);
        assert_eq!(wizard.professional().unwrap().id, ProfessionalId::from("p2"));
        assert_eq!(wizard.back(), BookingStep::SelectingProfessional);
    }

    #[tokio::test]
    async fn date_changes_clear_the_time_and_past_dates_are_refused() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();
        wizard
            .use_favorite(&f.catalog, &"s1".into(), &"p1".into())
            .await
            .unwrap();

        assert!(matches!(
            wizard.select_date(day(8), day(9)),
            Err(BookingError::DateInPast(_))
        ));

        wizard.select_date(day(10), day(9)).unwrap();
        let availability = f.appointments.availability(&"p1".into(), day(10)).await.unwrap();
        wizard
            .select_time("10:00".parse().unwrap(), &availability)
            .unwrap();
        assert!(wizard.time().is_some());

        wizard.select_date(day(11), day(9)).unwrap();
        assert!(wizard.time().is_none());
        // availability of the previous day no longer applies
        assert!(matches!(
            wizard.select_time("10:00".parse().unwrap(), &availability),
            Err(BookingError::StaleAvailability)
        ));
    }

    #[tokio::test]
    async fn confirm_books_for_the_session_user() {
        let f = fixture().await;
        f.sessions
            .save(User::new(UserId::from("u1"), "Ana", "ana@x.com"))
            .await
            .unwrap();

        let mut wizard = BookingWorkflow::new();
        wizard
            .use_favorite(&f.catalog, &"s1".into(), &"p1".into())
            .await
            .unwrap();
        wizard.select_date(day(10), day(9)).unwrap();
        let availability = f.appointments.availability(&"p1".into(), day(10)).await.unwrap();
        wizard
            .select_time("09:00".parse().unwrap(), &availability)
            .unwrap();
        wizard.next().unwrap();

        let booked = wizard
            .confirm(&f.sessions, &f.appointments, Utc::now())
            .await
            .unwrap();
        assert_eq!(booked.user_id, UserId::from("u1"));
        assert_eq!(booked.status, AppointmentStatus::Confirmed);

        let availability = f.appointments.availability(&"p1".into(), day(10)).await.unwrap();
        assert!(!availability.is_available("09:00".parse().unwrap()));
    }

    #[tokio::test]
    async fn failed_confirm_hands_the_workflow_back() {
        let f = fixture().await;
        let mut wizard = BookingWorkflow::new();
        wizard
            .use_favorite(&f.catalog, &"s1".into(), &"p1".into())
            .await
            .unwrap();
        wizard.select_date(day(10), day(9)).unwrap();
        let availability = f.appointments.availability(&"p1".into(), day(10)).await.unwrap();
        wizard
            .select_time("09:00".parse().unwrap(), &availability)
            .unwrap();
        wizard.next().unwrap();

        let err = wizard
            .confirm(&f.sessions, &f.appointments, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err.error, BookingError::NoSession));
        assert_eq!(err.workflow.step(), BookingStep::Confirming);
        assert!(f.appointments.list_all().await.unwrap().is_empty());
    }
}
