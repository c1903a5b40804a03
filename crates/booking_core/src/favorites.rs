//! crates/booking_core/src/favorites.rs
//!
//! Favorite (service, professional) shortcuts stored on the session user.

use tracing::info;

use crate::catalog::Catalog;
use crate::domain::{FavoriteItem, Professional, ProfessionalId, Service, ServiceId, User};
use crate::ports::PortResult;
use crate::session::SessionManager;

/// A favorite whose service and professional both still exist in the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFavorite {
    pub service: Service,
    pub professional: Professional,
}

#[derive(Clone)]
pub struct FavoritesManager {
    sessions: SessionManager,
    catalog: Catalog,
}

impl FavoritesManager {
    pub fn new(sessions: SessionManager, catalog: Catalog) -> Self {
        Self { sessions, catalog }
    }

    /// Adds the pair if missing, removes it if present. `None` without a session.
    pub async fn toggle(
        &self,
        service_id: &ServiceId,
        professional_id: &ProfessionalId,
    ) -> PortResult<Option<User>> {
        let Some(mut user) = self.sessions.current_user().await? else {
            return Ok(None);
        };

        let favorites = user.favorites.get_or_insert_with(Vec::new);
        match favorites
            .iter()
            .position(|f| f.matches(service_id, professional_id))
        {
            Some(index) => {
                favorites.remove(index);
                info!(%service_id, %professional_id, "Favorite removed.");
            }
            None => {
                favorites.push(FavoriteItem::new(
                    service_id.clone(),
                    professional_id.clone(),
                ));
                info!(%service_id, %professional_id, "Favorite added.");
            }
        }

        self.sessions.save(user).await.map(Some)
    }

    /// Favorites of `user` matching `query` on the service or professional name.
    ///
    /// Pairs pointing at missing catalog entries are skipped. A blank query matches all.
    pub async fn search(&self, user: &User, query: &str) -> PortResult<Vec<ResolvedFavorite>> {
        let services = self.catalog.services().await?;
        let professionals = self.catalog.professionals().await?;
        let query = query.trim().to_lowercase();

        let resolved = user
            .favorites()
            .iter()
            .filter_map(|fav| {
                let service = services.iter().find(|s| s.id == fav.service_id)?;
                let professional = professionals
                    .iter()
                    .find(|p| p.id == fav.professional_id)?;
                Some(ResolvedFavorite {
                    service: service.clone(),
                    professional: professional.clone(),
                })
            })
            .filter(|r| {
                r.service.name.to_lowercase().contains(&query)
                    || r.professional.name.to_lowercase().contains(&query)
            })
            .collect();
        Ok(resolved)
    }
}

pub fn is_favorite(user: &User, service_id: &ServiceId, professional_id: &ProfessionalId) -> bool {
    user.favorites()
        .iter()
        .any(|f| f.matches(service_id, professional_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UserId;
    use crate::memory::MemoryStore;
    use crate::ports::SessionStore;
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryStore>, FavoritesManager) {
        let store = Arc::new(MemoryStore::new());
        let catalog = Catalog::new(store.clone());
        catalog.seed_defaults().await.unwrap();
        let sessions = SessionManager::new(store.clone());
        (store, FavoritesManager::new(sessions, catalog))
    }

    #[tokio::test]
    async fn toggle_without_session_returns_none() {
        let (_, favorites) = setup().await;
        let result = favorites.toggle(&"s1".into(), &"p1".into()).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn toggle_twice_restores_membership_and_persists_to_users() {
        let (store, favorites) = setup().await;
        let sessions = SessionManager::new(store.clone());
        sessions
            .save(User::new(UserId::from("u1"), "Ana", "ana@x.com"))
            .await
            .unwrap();

        let added = favorites.toggle(&"s1".into(), &"p2".into()).await.unwrap().unwrap();
        assert!(is_favorite(&added, &"s1".into(), &"p2".into()));
        // the pair is the key: same service with another professional is a different favorite
        assert!(!is_favorite(&added, &"s1".into(), &"p1".into()));

        let stored = store.load_users().await.unwrap();
        assert_eq!(stored[0].favorites().len(), 1);

        let removed = favorites.toggle(&"s1".into(), &"p2".into()).await.unwrap().unwrap();
        assert!(removed.favorites().is_empty());
        assert!(store.load_users().await.unwrap()[0].favorites().is_empty());
    }

    #[tokio::test]
    async fn search_matches_names_and_skips_orphans() {
        let (_, favorites) = setup().await;
        let mut user = User::new(UserId::from("u1"), "Ana", "ana@x.com");
        user.favorites = Some(vec![
            FavoriteItem::new("s1".into(), "p1".into()),
            FavoriteItem::new("s2".into(), "p3".into()),
            FavoriteItem::new("s9".into(), "p1".into()),
        ]);

        assert_eq!(favorites.search(&user, "").await.unwrap().len(), 2);

        let beard = favorites.search(&user, "BEARD").await.unwrap();
        assert_eq!(beard.len(), 1);
        assert_eq!(beard[0].professional.name, "Mariana Cortes");

        let carlos = favorites.search(&user, "carlos").await.unwrap();
        assert_eq!(carlos.len(), 1);
        assert_eq!(carlos[0].service.id, ServiceId::from("s1"));
    }
}
