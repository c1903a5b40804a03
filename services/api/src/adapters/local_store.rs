//! services/api/src/adapters/local_store.rs
//!
//! This module contains the file-backed store, the concrete implementation of the
//! `SessionStore`, `AppointmentStore` and `CatalogStore` ports from the core crate.
//!
//! The store is a flat map of key -> JSON text, written back to a single JSON file
//! after every change. Each key holds one whole collection, so a write always
//! replaces the previous value for that key.

use async_trait::async_trait;
use booking_core::domain::{
    Appointment, AppointmentStatus, FavoriteItem, Professional, Service, TimeSlot, User,
};
use booking_core::ports::{AppointmentStore, CatalogStore, PortError, PortResult, SessionStore};
use chrono::{DateTime, NaiveDate};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info};

const KEY_SESSION: &str = "user";
const KEY_USERS: &str = "users";
const KEY_APPOINTMENTS: &str = "appointments";
const KEY_SERVICES: &str = "services";
const KEY_PROFESSIONALS: &str = "professionals";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A key-value store that implements every storage port.
pub struct LocalStore {
    /// `None` keeps everything in memory.
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, String>>,
}

impl LocalStore {
    /// Opens the store at `path`, starting empty when the file does not exist yet.
    pub async fn open(path: impl AsRef<Path>) -> PortResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                PortError::Unexpected(format!("Store file {} is corrupt: {}", path.display(), e))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(io_error(&path, e)),
        };
        info!(path = %path.display(), "Local store opened.");
        Ok(Self {
            path: Some(path),
            entries: Mutex::new(entries),
        })
    }

    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> PortResult<Option<T>> {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .map(|text| {
                serde_json::from_str(text).map_err(|e| {
                    PortError::Unexpected(format!("Stored value under '{}' is invalid: {}", key, e))
                })
            })
            .transpose()
    }

    async fn write<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> PortResult<()> {
        let text =
            serde_json::to_string(value).map_err(|e| PortError::Unexpected(e.to_string()))?;
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), text);
        self.flush(&entries).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        let mut entries = self.entries.lock().await;
        if entries.remove(key).is_some() {
            self.flush(&entries).await?;
        }
        Ok(())
    }

    /// Rewrites the whole file. Called with the entries lock held, so writes never interleave.
    async fn flush(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(parent, e))?;
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        tokio::fs::write(path, text)
            .await
            .map_err(|e| io_error(path, e))?;
        debug!(path = %path.display(), keys = entries.len(), "Store flushed.");
        Ok(())
    }
}

fn io_error(path: &Path, e: std::io::Error) -> PortError {
    PortError::Unexpected(format!("I/O on {} failed: {}", path.display(), e))
}

//=========================================================================================
// "Impure" Stored Record Structs
//=========================================================================================

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoriteRecord {
    service_id: String,
    professional_id: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    surname: Option<String>,
    #[serde(default)]
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    birth_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    avatar: Option<String>,
    #[serde(default)]
    completed_onboarding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    favorites: Option<Vec<FavoriteRecord>>,
}

impl UserRecord {
    fn from_domain(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
            avatar: user.avatar.clone(),
            completed_onboarding: user.completed_onboarding,
            favorites: user.favorites.as_ref().map(|favorites| {
                favorites
                    .iter()
                    .map(|f| FavoriteRecord {
                        service_id: f.service_id.to_string(),
                        professional_id: f.professional_id.to_string(),
                    })
                    .collect()
            }),
        }
    }

    fn to_domain(self) -> User {
        User {
            id: self.id.into(),
            name: self.name,
            surname: self.surname,
            email: self.email,
            phone: self.phone,
            birth_date: self.birth_date,
            avatar: self.avatar,
            completed_onboarding: self.completed_onboarding,
            favorites: self.favorites.map(|favorites| {
                favorites
                    .into_iter()
                    .map(|f| FavoriteItem::new(f.service_id.into(), f.professional_id.into()))
                    .collect()
            }),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceRecord {
    id: String,
    name: String,
    description: String,
    price: f64,
    duration_minutes: u32,
    image: String,
}

impl ServiceRecord {
    fn from_domain(service: &Service) -> Self {
        Self {
            id: service.id.to_string(),
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price,
            duration_minutes: service.duration_minutes,
            image: service.image.clone(),
        }
    }

    fn to_domain(self) -> Service {
        Service {
            id: self.id.into(),
            name: self.name,
            description: self.description,
            price: self.price,
            duration_minutes: self.duration_minutes,
            image: self.image,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfessionalRecord {
    id: String,
    name: String,
    specialty: String,
    avatar: String,
    rating: f64,
}

impl ProfessionalRecord {
    fn from_domain(professional: &Professional) -> Self {
        Self {
            id: professional.id.to_string(),
            name: professional.name.clone(),
            specialty: professional.specialty.clone(),
            avatar: professional.avatar.clone(),
            rating: professional.rating,
        }
    }

    fn to_domain(self) -> Professional {
        Professional {
            id: self.id.into(),
            name: self.name,
            specialty: self.specialty,
            rating: self.rating,
            avatar: self.avatar,
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppointmentRecord {
    id: String,
    user_id: String,
    service_id: String,
    professional_id: String,
    date: NaiveDate,
    /// "HH:MM"
    time: String,
    status: String,
    /// Epoch milliseconds.
    created_at: i64,
}

impl AppointmentRecord {
    fn from_domain(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.to_string(),
            user_id: appointment.user_id.to_string(),
            service_id: appointment.service_id.to_string(),
            professional_id: appointment.professional_id.to_string(),
            date: appointment.date,
            time: appointment.time.label(),
            status: appointment.status.to_string(),
            created_at: appointment.created_at.timestamp_millis(),
        }
    }

    fn to_domain(self) -> PortResult<Appointment> {
        let time = self
            .time
            .parse::<TimeSlot>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let status = self
            .status
            .parse::<AppointmentStatus>()
            .map_err(PortError::Unexpected)?;
        let created_at = DateTime::from_timestamp_millis(self.created_at).ok_or_else(|| {
            PortError::Unexpected(format!("createdAt {} is out of range", self.created_at))
        })?;

        Ok(Appointment {
            id: self.id.into(),
            user_id: self.user_id.into(),
            service_id: self.service_id.into(),
            professional_id: self.professional_id.into(),
            date: self.date,
            time,
            status,
            created_at,
        })
    }
}

//=========================================================================================
// Port Implementations
//=========================================================================================

#[async_trait]
impl SessionStore for LocalStore {
    async fn load_session(&self) -> PortResult<Option<User>> {
        let record: Option<UserRecord> = self.read(KEY_SESSION).await?;
        Ok(record.map(UserRecord::to_domain))
    }

    async fn store_session(&self, user: &User) -> PortResult<()> {
        self.write(KEY_SESSION, &UserRecord::from_domain(user)).await
    }

    async fn clear_session(&self) -> PortResult<()> {
        self.remove(KEY_SESSION).await
    }

    async fn load_users(&self) -> PortResult<Vec<User>> {
        let records: Vec<UserRecord> = self.read(KEY_USERS).await?.unwrap_or_default();
        Ok(records.into_iter().map(UserRecord::to_domain).collect())
    }

    async fn store_users(&self, users: &[User]) -> PortResult<()> {
        let records: Vec<UserRecord> = users.iter().map(UserRecord::from_domain).collect();
        self.write(KEY_USERS, &records).await
    }
}

#[async_trait]
impl AppointmentStore for LocalStore {
    async fn load_appointments(&self) -> PortResult<Vec<Appointment>> {
        let records: Vec<AppointmentRecord> =
            self.read(KEY_APPOINTMENTS).await?.unwrap_or_default();
        records
            .into_iter()
            .map(AppointmentRecord::to_domain)
            .collect()
    }

    async fn store_appointments(&self, appointments: &[Appointment]) -> PortResult<()> {
        let records: Vec<AppointmentRecord> = appointments
            .iter()
            .map(AppointmentRecord::from_domain)
            .collect();
        self.write(KEY_APPOINTMENTS, &records).await
    }
}

#[async_trait]
impl CatalogStore for LocalStore {
    async fn load_services(&self) -> PortResult<Vec<Service>> {
        let records: Vec<ServiceRecord> = self.read(KEY_SERVICES).await?.unwrap_or_default();
        Ok(records.into_iter().map(ServiceRecord::to_domain).collect())
    }

    async fn load_professionals(&self) -> PortResult<Vec<Professional>> {
        let records: Vec<ProfessionalRecord> =
            self.read(KEY_PROFESSIONALS).await?.unwrap_or_default();
        Ok(records
            .into_iter()
            .map(ProfessionalRecord::to_domain)
            .collect())
    }

    async fn seed_if_absent(
        &self,
        services: &[Service],
        professionals: &[Professional],
    ) -> PortResult<()> {
        if self.read::<serde_json::Value>(KEY_SERVICES).await?.is_none() {
            let records: Vec<ServiceRecord> =
                services.iter().map(ServiceRecord::from_domain).collect();
            self.write(KEY_SERVICES, &records).await?;
        }
        if self
            .read::<serde_json::Value>(KEY_PROFESSIONALS)
            .await?
            .is_none()
        {
            let records: Vec<ProfessionalRecord> = professionals
                .iter()
                .map(ProfessionalRecord::from_domain)
                .collect();
            self.write(KEY_PROFESSIONALS, &records).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booking_core::catalog::{default_professionals, default_services};
    use booking_core::domain::UserId;
    use chrono::{TimeZone, Utc};

    fn appointment() -> Appointment {
        Appointment {
            id: "apt_1".into(),
            user_id: "u1".into(),
            service_id: "s1".into(),
            professional_id: "p1".into(),
            date: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            time: "09:00".parse().unwrap(),
            status: AppointmentStatus::Confirmed,
            created_at: Utc.timestamp_millis_opt(1_749_000_000_123).unwrap(),
        }
    }

    #[tokio::test]
    async fn reopening_the_file_returns_what_was_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = LocalStore::open(&path).await.unwrap();
        let mut user = User::new(UserId::from("u1"), "Ana", "ana@x.com");
        user.favorites = Some(vec![FavoriteItem::new("s1".into(), "p2".into())]);
        user.birth_date = NaiveDate::from_ymd_opt(1990, 2, 1);
        store.store_users(std::slice::from_ref(&user)).await.unwrap();
        store.store_session(&user).await.unwrap();
        store.store_appointments(&[appointment()]).await.unwrap();
        drop(store);

        let reopened = LocalStore::open(&path).await.unwrap();
        assert_eq!(reopened.load_users().await.unwrap(), vec![user.clone()]);
        assert_eq!(reopened.load_session().await.unwrap(), Some(user));
        assert_eq!(
            reopened.load_appointments().await.unwrap(),
            vec![appointment()]
        );
    }

    #[tokio::test]
    async fn records_use_camel_case_fields() {
        let store = LocalStore::in_memory();
        store.store_appointments(&[appointment()]).await.unwrap();

        let raw: serde_json::Value = store.read(KEY_APPOINTMENTS).await.unwrap().unwrap();
        assert_eq!(raw[0]["userId"], "u1");
        assert_eq!(raw[0]["time"], "09:00");
        assert_eq!(raw[0]["date"], "2025-06-10");
        assert_eq!(raw[0]["createdAt"], 1_749_000_000_123_i64);
    }

    #[tokio::test]
    async fn clearing_the_session_keeps_the_users() {
        let store = LocalStore::in_memory();
        let user = User::new(UserId::from("u1"), "Ana", "ana@x.com");
        store.store_users(std::slice::from_ref(&user)).await.unwrap();
        store.store_session(&user).await.unwrap();

        store.clear_session().await.unwrap();
        assert!(store.load_session().await.unwrap().is_none());
        assert_eq!(store.load_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn seeding_never_overwrites_existing_lists() {
        let store = LocalStore::in_memory();
        let mut services = default_services();
        services.truncate(1);
        store.seed_if_absent(&services, &[]).await.unwrap();
        store
            .seed_if_absent(&default_services(), &default_professionals())
            .await
            .unwrap();

        assert_eq!(store.load_services().await.unwrap().len(), 1);
        // an empty list still counts as seeded
        assert!(store.load_professionals().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn a_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(matches!(
            LocalStore::open(&path).await,
            Err(PortError::Unexpected(_))
        ));
    }
}
