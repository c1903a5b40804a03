pub mod appointments;
pub mod assistant;
pub mod auth;
pub mod availability;
pub mod booking;
pub mod catalog;
pub mod domain;
pub mod favorites;
pub mod memory;
pub mod ports;
pub mod schedule;
pub mod session;

pub use appointments::AppointmentRepository;
pub use assistant::StyleAssistant;
pub use auth::{AuthError, AuthService, LoginOutcome, OnboardingProfile};
pub use availability::DayAvailability;
pub use booking::{BookingError, BookingStep, BookingWorkflow, ConfirmError};
pub use catalog::Catalog;
pub use domain::{
    Appointment, AppointmentId, AppointmentStatus, ChatMessage, ChatRole, FavoriteItem,
    Professional, ProfessionalId, Service, ServiceId, TimeSlot, User, UserId,
};
pub use favorites::{FavoritesManager, ResolvedFavorite};
pub use memory::MemoryStore;
pub use ports::{
    AppointmentStore, CatalogStore, PortError, PortResult, SessionStore, StyleAssistantService,
};
pub use session::{reconcile, SessionManager};
