//! crates/booking_core/src/catalog.rs
//!
//! Read-only access to the services and professionals, plus the default
//! barbershop catalog seeded on first start.

use std::sync::Arc;
use tracing::info;

use crate::domain::{Professional, ProfessionalId, Service, ServiceId};
use crate::ports::{CatalogStore, PortResult};

#[derive(Clone)]
pub struct Catalog {
    store: Arc<dyn CatalogStore>,
}

impl Catalog {
    pub fn new(store: Arc<dyn CatalogStore>) -> Self {
        Self { store }
    }

    /// Seeds the default lists into the store. Lists already present are kept as is.
    pub async fn seed_defaults(&self) -> PortResult<()> {
        self.store
            .seed_if_absent(&default_services(), &default_professionals())
            .await?;
        info!("Catalog ready.");
        Ok(())
    }

    pub async fn services(&self) -> PortResult<Vec<Service>> {
        self.store.load_services().await
    }

    pub async fn professionals(&self) -> PortResult<Vec<Professional>> {
        self.store.load_professionals().await
    }

    pub async fn service(&self, id: &ServiceId) -> PortResult<Option<Service>> {
        let services = self.store.load_services().await?;
        Ok(services.into_iter().find(|s| &s.id == id))
    }

    pub async fn professional(&self, id: &ProfessionalId) -> PortResult<Option<Professional>> {
        let professionals = self.store.load_professionals().await?;
        Ok(professionals.into_iter().find(|p| &p.id == id))
    }

    /// The first `count` services, in catalog order. Shown as "popular" on the dashboard.
    pub async fn featured_services(&self, count: usize) -> PortResult<Vec<Service>> {
        let mut services = self.store.load_services().await?;
        services.truncate(count);
        Ok(services)
    }
}

pub fn default_services() -> Vec<Service> {
    vec![
        Service {
            id: ServiceId::from("s1"),
            name: "Haircut".to_string(),
            description: "Modern cut with razor finish and wash.".to_string(),
            price: 45.00,
            duration_minutes: 45,
            image: "https://picsum.photos/200/200?random=1".to_string(),
        },
        Service {
            id: ServiceId::from("s2"),
            name: "Beard Therapy".to_string(),
            description: "Beard shaping with hot towel and hydration.".to_string(),
            price: 35.00,
            duration_minutes: 30,
            image: "https://picsum.photos/200/200?random=2".to_string(),
        },
        Service {
            id: ServiceId::from("s3"),
            name: "Full Combo".to_string(),
            description: "Haircut + beard + eyebrows.".to_string(),
            price: 75.00,
            duration_minutes: 75,
            image: "https://picsum.photos/200/200?random=3".to_string(),
        },
        Service {
            id: ServiceId::from("s4"),
            name: "Pigmentation".to_string(),
            description: "Camouflage of gaps in beard or hair.".to_string(),
            price: 50.00,
            duration_minutes: 40,
            image: "https://picsum.photos/200/200?random=4".to_string(),
        },
    ]
}

pub fn default_professionals() -> Vec<Professional> {
    vec![
        Professional {
            id: ProfessionalId::from("p1"),
            name: "Carlos \"The Barber\"".to_string(),
            specialty: "Fade & Razor".to_string(),
            rating: 4.9,
            avatar: "https://picsum.photos/100/100?random=10".to_string(),
        },
        Professional {
            id: ProfessionalId::from("p2"),
            name: "André Style".to_string(),
            specialty: "Beard & Colorimetry".to_string(),
            rating: 4.8,
            avatar: "https://picsum.photos/100/100?random=11".to_string(),
        },
        Professional {
            id: ProfessionalId::from("p3"),
            name: "Mariana Cortes".to_string(),
            specialty: "Classic Cuts".to_string(),
            rating: 5.0,
            avatar: "https://picsum.photos/100/100?random=12".to_string(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    #[tokio::test]
    async fn seeding_twice_keeps_the_first_lists() {
        let store = Arc::new(MemoryStore::new());
        store
            .seed_if_absent(&default_services()[..1], &default_professionals()[..1])
            .await
            .unwrap();

        let catalog = Catalog::new(store);
        catalog.seed_defaults().await.unwrap();

        assert_eq!(catalog.services().await.unwrap().len(), 1);
        assert_eq!(catalog.professionals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn lookups_by_id() {
        let catalog = Catalog::new(Arc::new(MemoryStore::new()));
        catalog.seed_defaults().await.unwrap();

        let combo = catalog.service(&ServiceId::from("s3")).await.unwrap().unwrap();
        assert_eq!(combo.duration_minutes, 75);
        assert!(catalog.professional(&ProfessionalId::from("p9")).await.unwrap().is_none());
        assert_eq!(catalog.featured_services(3).await.unwrap().len(), 3);
    }
}
