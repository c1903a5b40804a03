//! crates/booking_core/src/domain.rs
//!
//! Defines the pure, core data structures for the booking application.
//! These structs are independent of any storage or serialization format.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Identifiers
//=========================================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Opaque, stable identity of a user. Survives logins matched by email.
    UserId
);
string_id!(ServiceId);
string_id!(ProfessionalId);
string_id!(
    /// Opaque appointment id. Generated ids embed a UUIDv7, so they roughly follow creation order.
    AppointmentId
);

impl UserId {
    pub fn generate() -> Self {
        Self(format!("u_{}", Uuid::now_v7().simple()))
    }
}

impl AppointmentId {
    pub fn generate() -> Self {
        Self(format!("apt_{}", Uuid::now_v7().simple()))
    }
}

//=========================================================================================
// Users
//=========================================================================================

/// A (service, professional) shortcut saved by a user. Identity is the pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FavoriteItem {
    pub service_id: ServiceId,
    pub professional_id: ProfessionalId,
}

impl FavoriteItem {
    pub fn new(service_id: ServiceId, professional_id: ProfessionalId) -> Self {
        Self {
            service_id,
            professional_id,
        }
    }

    pub fn matches(&self, service_id: &ServiceId, professional_id: &ProfessionalId) -> bool {
        &self.service_id == service_id && &self.professional_id == professional_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: Option<String>,
    /// Case-insensitive unique key within the store. Empty for phone-only users.
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    /// Data URI or URL.
    pub avatar: Option<String>,
    pub completed_onboarding: bool,
    pub favorites: Option<Vec<FavoriteItem>>,
}

impl User {
    /// A fresh identity that still has to go through onboarding.
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            surname: None,
            email: email.into(),
            phone: None,
            birth_date: None,
            avatar: None,
            completed_onboarding: false,
            favorites: None,
        }
    }

    pub fn favorites(&self) -> &[FavoriteItem] {
        self.favorites.as_deref().unwrap_or_default()
    }

    /// Email comparison used for identity lookups. Blank emails never match.
    pub fn has_email(&self, email: &str) -> bool {
        !email.trim().is_empty() && self.email.eq_ignore_ascii_case(email.trim())
    }
}

//=========================================================================================
// Catalog
//=========================================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Professional {
    pub id: ProfessionalId,
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    pub avatar: String,
}

//=========================================================================================
// Appointments
//=========================================================================================

const SLOT_HOURS: [u8; 9] = [9, 10, 11, 13, 14, 15, 16, 17, 18];

/// One bookable wall-clock label of the fixed daily enumeration.
///
/// Slots sit on the hour from 09:00 to 18:00 with no 12:00 slot (lunch).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeSlot {
    hour: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not one of the daily time slots")]
pub struct InvalidTimeSlot(pub String);

impl TimeSlot {
    /// The daily enumeration, in order.
    pub fn all() -> impl Iterator<Item = TimeSlot> {
        SLOT_HOURS.iter().map(|&hour| TimeSlot { hour })
    }

    pub fn label(&self) -> String {
        format!("{:02}:00", self.hour)
    }

    pub fn as_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(u32::from(self.hour), 0, 0).unwrap_or_default()
    }
}

impl fmt::Display for TimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.hour)
    }
}

impl FromStr for TimeSlot {
    type Err = InvalidTimeSlot;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim();
        TimeSlot::all()
            .find(|slot| slot.label() == label)
            .ok_or_else(|| InvalidTimeSlot(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentStatus {
    Confirmed,
    Pending,
    Cancelled,
    Completed,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "pending" => Ok(AppointmentStatus::Pending),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "completed" => Ok(AppointmentStatus::Completed),
            other => Err(format!("unknown appointment status '{other}'")),
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Appointment {
    pub id: AppointmentId,
    pub user_id: UserId,
    pub service_id: ServiceId,
    pub professional_id: ProfessionalId,
    pub date: NaiveDate,
    pub time: TimeSlot,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
}

impl Appointment {
    /// The wall-clock instant the appointment starts at.
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time.as_time())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == AppointmentStatus::Cancelled
    }

    /// Whether this appointment keeps its slot out of the availability pool.
    pub fn holds_slot(&self, professional_id: &ProfessionalId, date: NaiveDate) -> bool {
        !self.is_cancelled() && &self.professional_id == professional_id && self.date == date
    }
}

//=========================================================================================
// Assistant chat
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_enumeration_skips_lunch() {
        let labels: Vec<String> = TimeSlot::all().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["09:00", "10:00", "11:00", "13:00", "14:00", "15:00", "16:00", "17:00", "18:00"]
        );
        assert!("12:00".parse::<TimeSlot>().is_err());
        assert!("9:00".parse::<TimeSlot>().is_err());
    }

    #[test]
    fn slot_parses_its_own_label() {
        let slot: TimeSlot = "13:00".parse().unwrap();
        assert_eq!(slot.to_string(), "13:00");
        assert_eq!(slot.as_time(), NaiveTime::from_hms_opt(13, 0, 0).unwrap());
    }

    #[test]
    fn blank_email_never_matches() {
        let user = User::new(UserId::from("u1"), "Phone", "");
        assert!(!user.has_email(""));
        assert!(!user.has_email("   "));

        let user = User::new(UserId::from("u2"), "Ana", "Ana@Example.com");
        assert!(user.has_email("ana@example.COM"));
    }
}
