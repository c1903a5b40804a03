//! crates/booking_core/src/availability.rs
//!
//! Slot availability for one professional on one day. Derived from the
//! appointment list, never stored.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::domain::{Appointment, ProfessionalId, TimeSlot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayAvailability {
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    /// Slots held by a non-cancelled appointment, in enumeration order.
    pub taken: Vec<TimeSlot>,
    /// The enumeration minus `taken`, in enumeration order.
    pub available: Vec<TimeSlot>,
}

impl DayAvailability {
    pub fn compute(
        appointments: &[Appointment],
        professional_id: &ProfessionalId,
        date: NaiveDate,
    ) -> Self {
        let taken: BTreeSet<TimeSlot> = appointments
            .iter()
            .filter(|a| a.holds_slot(professional_id, date))
            .map(|a| a.time)
            .collect();

        let available = TimeSlot::all().filter(|s| !taken.contains(s)).collect();

        Self {
            professional_id: professional_id.clone(),
            date,
            taken: taken.into_iter().collect(),
            available,
        }
    }

    pub fn is_full(&self) -> bool {
        self.available.is_empty()
    }

    pub fn is_available(&self, slot: TimeSlot) -> bool {
        self.available.contains(&slot)
    }

    pub fn covers(&self, professional_id: &ProfessionalId, date: NaiveDate) -> bool {
        &self.professional_id == professional_id && self.date == date
    }
}
