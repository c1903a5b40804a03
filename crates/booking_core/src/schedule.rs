//! crates/booking_core/src/schedule.rs
//!
//! Splits a user's appointments into the "upcoming" and "history" views.
//!
//! There is no stored "completed" transition: an appointment whose start has
//! passed lands in history by time alone, whatever its status says.

use chrono::NaiveDateTime;

use crate::domain::{Appointment, AppointmentStatus};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleViews {
    /// Nearest first.
    pub upcoming: Vec<Appointment>,
    /// Most recent first.
    pub history: Vec<Appointment>,
}

pub fn is_history(appointment: &Appointment, now: NaiveDateTime) -> bool {
    appointment.starts_at() < now
        || matches!(
            appointment.status,
            AppointmentStatus::Cancelled | AppointmentStatus::Completed
        )
}

pub fn partition(appointments: &[Appointment], now: NaiveDateTime) -> ScheduleViews {
    let (mut history, mut upcoming): (Vec<Appointment>, Vec<Appointment>) = appointments
        .iter()
        .cloned()
        .partition(|a| is_history(a, now));

    upcoming.sort_by_key(|a| a.starts_at());
    history.sort_by_key(|a| std::cmp::Reverse(a.starts_at()));

    ScheduleViews { upcoming, history }
}

/// The nearest appointment that is still ahead and not cancelled or completed.
pub fn next_appointment(appointments: &[Appointment], now: NaiveDateTime) -> Option<Appointment> {
    appointments
        .iter()
        .filter(|a| !is_history(a, now))
        .min_by_key(|a| a.starts_at())
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppointmentId, UserId};
    use chrono::{NaiveDate, Utc};

    fn at(date: (i32, u32, u32), time: &str, status: AppointmentStatus) -> Appointment {
        Appointment {
            id: AppointmentId::generate(),
            user_id: UserId::from("u1"),
            service_id: "s1".into(),
            professional_id: "p1".into(),
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            time: time.parse().unwrap(),
            status,
            created_at: Utc::now(),
        }
    }

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap()
    }

    #[test]
    fn partition_orders_each_view() {
        let later_today = at((2025, 6, 10), "14:00", AppointmentStatus::Confirmed);
        let tomorrow = at((2025, 6, 11), "09:00", AppointmentStatus::Confirmed);
        let this_morning = at((2025, 6, 10), "09:00", AppointmentStatus::Confirmed);
        let last_week = at((2025, 6, 3), "17:00", AppointmentStatus::Confirmed);
        let cancelled_future = at((2025, 6, 20), "10:00", AppointmentStatus::Cancelled);

        let views = partition(
            &[
                tomorrow.clone(),
                last_week.clone(),
                later_today.clone(),
                cancelled_future.clone(),
                this_morning.clone(),
            ],
            now(),
        );

        assert_eq!(views.upcoming, vec![later_today, tomorrow]);
        assert_eq!(views.history, vec![cancelled_future, this_morning, last_week]);
    }

    #[test]
    fn completed_is_history_even_when_in_the_future() {
        let done = at((2025, 7, 1), "10:00", AppointmentStatus::Completed);
        assert!(is_history(&done, now()));
    }

    #[test]
    fn next_appointment_skips_cancelled_and_past() {
        let cancelled = at((2025, 6, 10), "13:00", AppointmentStatus::Cancelled);
        let past = at((2025, 6, 10), "11:00", AppointmentStatus::Confirmed);
        let later = at((2025, 6, 12), "15:00", AppointmentStatus::Confirmed);
        let sooner = at((2025, 6, 10), "16:00", AppointmentStatus::Pending);

        let next = next_appointment(&[cancelled, past, later, sooner.clone()], now());
        assert_eq!(next, Some(sooner));
        assert_eq!(next_appointment(&[], now()), None);
    }
}
