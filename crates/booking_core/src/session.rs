//! crates/booking_core/src/session.rs
//!
//! Tracks the single logged-in user and keeps the full user collection in step
//! with it through identity reconciliation.

use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::User;
use crate::ports::{PortResult, SessionStore};

/// Merges `incoming` into the stored identity it matched, if any.
///
/// The stored id always wins so an existing identity is never renumbered. Every
/// other field comes from `incoming`; optional fields only overwrite when they
/// are present.
pub fn reconcile(existing: Option<User>, incoming: User) -> User {
    let Some(existing) = existing else {
        return incoming;
    };

    User {
        id: existing.id,
        name: incoming.name,
        surname: incoming.surname.or(existing.surname),
        email: incoming.email,
        phone: incoming.phone.or(existing.phone),
        birth_date: incoming.birth_date.or(existing.birth_date),
        avatar: incoming.avatar.or(existing.avatar),
        completed_onboarding: incoming.completed_onboarding,
        favorites: incoming.favorites.or(existing.favorites),
    }
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub async fn current_user(&self) -> PortResult<Option<User>> {
        self.store.load_session().await
    }

    /// Searches the whole user collection, not just the session.
    pub async fn find_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let users = self.store.load_users().await?;
        Ok(users.into_iter().find(|u| u.has_email(email)))
    }

    /// Makes `user` the active session and upserts it into the user collection.
    ///
    /// A stored record with the same id, or failing that the same email, is the
    /// same identity. The returned user is the merged record the session now holds.
    pub async fn save(&self, user: User) -> PortResult<User> {
        let mut users = self.store.load_users().await?;
        let position = users
            .iter()
            .position(|u| u.id == user.id)
            .or_else(|| users.iter().position(|u| u.has_email(&user.email)));

        let merged = match position {
            Some(index) => {
                let merged = reconcile(Some(users[index].clone()), user);
                debug!(user_id = %merged.id, "Updating stored identity.");
                users[index] = merged.clone();
                merged
            }
            None => {
                info!(user_id = %user.id, "Storing new identity.");
                users.push(user.clone());
                user
            }
        };

        self.store.store_users(&users).await?;
        self.store.store_session(&merged).await?;
        Ok(merged)
    }

    /// Logs out. Stored users are untouched.
    pub async fn clear(&self) -> PortResult<()> {
        self.store.clear_session().await?;
        info!("Session cleared.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FavoriteItem, UserId};
    use crate::memory::MemoryStore;

    fn manager() -> (Arc<MemoryStore>, SessionManager) {
        let store = Arc::new(MemoryStore::new());
        (store.clone(), SessionManager::new(store))
    }

    #[test]
    fn reconcile_keeps_existing_id_and_takes_supplied_fields() {
        let mut existing = User::new(UserId::from("u_old"), "Old", "a@b.com");
        existing.phone = Some("555".to_string());
        existing.favorites = Some(vec![FavoriteItem::new("s1".into(), "p1".into())]);

        let mut incoming = User::new(UserId::from("u_new"), "New", "A@B.com");
        incoming.surname = Some("Silva".to_string());

        let merged = reconcile(Some(existing), incoming);
        assert_eq!(merged.id, UserId::from("u_old"));
        assert_eq!(merged.name, "New");
        assert_eq!(merged.email, "A@B.com");
        assert_eq!(merged.surname.as_deref(), Some("Silva"));
        assert_eq!(merged.phone.as_deref(), Some("555"));
        assert_eq!(merged.favorites().len(), 1);
    }

    #[test]
    fn reconcile_without_existing_is_identity() {
        let incoming = User::new(UserId::from("u1"), "Ana", "ana@x.com");
        assert_eq!(reconcile(None, incoming.clone()), incoming);
    }

    #[tokio::test]
    async fn same_email_different_transient_ids_yield_one_identity() {
        let (store, sessions) = manager();

        sessions
            .save(User::new(UserId::from("u_1"), "Ana", "ana@x.com"))
            .await
            .unwrap();
        let merged = sessions
            .save(User::new(UserId::from("u_2"), "Ana B", "ANA@x.com"))
            .await
            .unwrap();

        let users = store.load_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, UserId::from("u_1"));
        assert_eq!(users[0].name, "Ana B");
        assert_eq!(merged.id, UserId::from("u_1"));

        // the session mirrors the reconciled identity, not the transient one
        let current = sessions.current_user().await.unwrap().unwrap();
        assert_eq!(current.id, UserId::from("u_1"));
    }

    #[tokio::test]
    async fn find_by_email_is_case_insensitive_and_searches_all_users() {
        let (_, sessions) = manager();
        sessions
            .save(User::new(UserId::from("u_1"), "Ana", "ana@x.com"))
            .await
            .unwrap();
        sessions
            .save(User::new(UserId::from("u_2"), "Bia", "bia@x.com"))
            .await
            .unwrap();

        let found = sessions.find_by_email("ANA@X.COM").await.unwrap().unwrap();
        assert_eq!(found.id, UserId::from("u_1"));
        assert!(sessions.find_by_email("nobody@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn phone_only_users_are_not_merged_by_blank_email() {
        let (store, sessions) = manager();
        sessions
            .save(User::new(UserId::from("u_1"), "Mobile", ""))
            .await
            .unwrap();
        sessions
            .save(User::new(UserId::from("u_2"), "Mobile", ""))
            .await
            .unwrap();

        assert_eq!(store.load_users().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn clear_drops_only_the_session() {
        let (store, sessions) = manager();
        sessions
            .save(User::new(UserId::from("u_1"), "Ana", "ana@x.com"))
            .await
            .unwrap();

        sessions.clear().await.unwrap();

        assert!(sessions.current_user().await.unwrap().is_none());
        assert_eq!(store.load_users().await.unwrap().len(), 1);
    }
}
