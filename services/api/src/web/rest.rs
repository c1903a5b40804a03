//! services/api/src/web/rest.rs
//!
//! Contains the master definition for the OpenAPI specification, the response
//! payloads shared by several handler modules, and the health and catalog
//! endpoints.

use crate::web::{appointments, assistant, auth, booking, favorites, state::AppState};
use axum::{extract::State, http::StatusCode, response::Json};
use booking_core::{
    domain::{Appointment, Professional, Service, User},
    favorites::is_favorite,
    ports::PortError,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        list_services_handler,
        list_professionals_handler,
        auth::login_handler,
        auth::register_handler,
        auth::request_sms_handler,
        auth::verify_sms_handler,
        auth::password_reset_handler,
        auth::logout_handler,
        auth::me_handler,
        auth::onboarding_handler,
        auth::dashboard_handler,
        appointments::list_appointments_handler,
        appointments::appointment_views_handler,
        appointments::cancel_appointment_handler,
        appointments::availability_handler,
        favorites::list_favorites_handler,
        favorites::toggle_favorite_handler,
        booking::start_booking_handler,
        booking::get_booking_handler,
        booking::select_service_handler,
        booking::select_professional_handler,
        booking::select_date_handler,
        booking::select_time_handler,
        booking::use_favorite_handler,
        booking::next_step_handler,
        booking::previous_step_handler,
        booking::confirm_booking_handler,
        assistant::history_handler,
        assistant::send_message_handler,
    ),
    components(
        schemas(
            HealthResponse,
            UserResponse,
            FavoriteResponse,
            ServiceResponse,
            ProfessionalResponse,
            AppointmentResponse,
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::SmsRequest,
            auth::SmsVerifyRequest,
            auth::SmsCodeResponse,
            auth::PasswordResetRequest,
            auth::PasswordResetResponse,
            auth::LoginResponse,
            auth::OnboardingRequest,
            auth::DashboardResponse,
            appointments::ScheduleViewsResponse,
            appointments::AvailabilityResponse,
            favorites::ToggleFavoriteRequest,
            favorites::ResolvedFavoriteResponse,
            booking::BookingResponse,
            booking::SelectServiceRequest,
            booking::SelectProfessionalRequest,
            booking::SelectDateRequest,
            booking::SelectTimeRequest,
            booking::UseFavoriteRequest,
            assistant::ChatMessageResponse,
            assistant::SendMessageRequest,
        )
    ),
    tags(
        (name = "Barber Styles API", description = "Booking, favorites and style-assistant endpoints for the barbershop app.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// What every handler returns on failure, as in `(StatusCode, message)`.
pub type HandlerError = (StatusCode, String);

/// Maps a port failure. Unexpected failures are logged and hidden behind `context`.
pub fn port_failure(context: &str, e: PortError) -> HandlerError {
    match e {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Conflict(message) => (StatusCode::CONFLICT, message),
        PortError::Unexpected(message) => {
            error!("{}: {}", context, message);
            (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
        }
    }
}

//=========================================================================================
// Shared Response Payloads
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    /// Model the style assistant is configured to call.
    pub assistant_model: String,
    /// False when no API key is set and the assistant only apologizes.
    pub assistant_configured: bool,
}

#[derive(Serialize, ToSchema)]
pub struct FavoriteResponse {
    pub service_id: String,
    pub professional_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub surname: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub avatar: Option<String>,
    pub completed_onboarding: bool,
    pub favorites: Vec<FavoriteResponse>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            name: user.name.clone(),
            surname: user.surname.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            birth_date: user.birth_date,
            avatar: user.avatar.clone(),
            completed_onboarding: user.completed_onboarding,
            favorites: user
                .favorites()
                .iter()
                .map(|f| FavoriteResponse {
                    service_id: f.service_id.to_string(),
                    professional_id: f.professional_id.to_string(),
                })
                .collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ServiceResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub image: String,
}

impl From<&Service> for ServiceResponse {
    fn from(service: &Service) -> Self {
        Self {
            id: service.id.to_string(),
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price,
            duration_minutes: service.duration_minutes,
            image: service.image.clone(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ProfessionalResponse {
    pub id: String,
    pub name: String,
    pub specialty: String,
    pub rating: f64,
    pub avatar: String,
}

impl From<&Professional> for ProfessionalResponse {
    fn from(professional: &Professional) -> Self {
        Self {
            id: professional.id.to_string(),
            name: professional.name.clone(),
            specialty: professional.specialty.clone(),
            rating: professional.rating,
            avatar: professional.avatar.clone(),
        }
    }
}

/// An appointment with the catalog names resolved, when they still exist.
#[derive(Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: String,
    pub user_id: String,
    pub service_id: String,
    pub service_name: Option<String>,
    pub professional_id: String,
    pub professional_name: Option<String>,
    pub date: NaiveDate,
    /// "HH:MM"
    pub time: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Whether the (service, professional) pair is one of the user's favorites.
    pub favorite: bool,
}

impl AppointmentResponse {
    pub fn resolve(
        appointment: &Appointment,
        user: &User,
        services: &[Service],
        professionals: &[Professional],
    ) -> Self {
        Self {
            id: appointment.id.to_string(),
            user_id: appointment.user_id.to_string(),
            service_id: appointment.service_id.to_string(),
            service_name: services
                .iter()
                .find(|s| s.id == appointment.service_id)
                .map(|s| s.name.clone()),
            professional_id: appointment.professional_id.to_string(),
            professional_name: professionals
                .iter()
                .find(|p| p.id == appointment.professional_id)
                .map(|p| p.name.clone()),
            date: appointment.date,
            time: appointment.time.label(),
            status: appointment.status.to_string(),
            created_at: appointment.created_at,
            favorite: is_favorite(
                user,
                &appointment.service_id,
                &appointment.professional_id,
            ),
        }
    }
}

/// Resolves a list of appointments against the current catalog.
pub async fn resolve_appointments(
    state: &AppState,
    user: &User,
    appointments: &[Appointment],
) -> Result<Vec<AppointmentResponse>, HandlerError> {
    let services = state
        .catalog
        .services()
        .await
        .map_err(|e| port_failure("Failed to load services", e))?;
    let professionals = state
        .catalog
        .professionals()
        .await
        .map_err(|e| port_failure("Failed to load professionals", e))?;
    Ok(appointments
        .iter()
        .map(|a| AppointmentResponse::resolve(a, user, &services, &professionals))
        .collect())
}

//=========================================================================================
// Health and Catalog Handlers
//=========================================================================================

/// Liveness probe.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        assistant_model: state.config.assistant_model.clone(),
        assistant_configured: state.config.assistant_api_key.is_some(),
    })
}

/// List the services offered by the shop, in catalog order.
#[utoipa::path(
    get,
    path = "/catalog/services",
    responses(
        (status = 200, description = "All services", body = [ServiceResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_services_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ServiceResponse>>, HandlerError> {
    let services = state
        .catalog
        .services()
        .await
        .map_err(|e| port_failure("Failed to load services", e))?;
    Ok(Json(services.iter().map(ServiceResponse::from).collect()))
}

/// List the professionals working at the shop.
#[utoipa::path(
    get,
    path = "/catalog/professionals",
    responses(
        (status = 200, description = "All professionals", body = [ProfessionalResponse]),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_professionals_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProfessionalResponse>>, HandlerError> {
    let professionals = state
        .catalog
        .professionals()
        .await
        .map_err(|e| port_failure("Failed to load professionals", e))?;
    Ok(Json(
        professionals.iter().map(ProfessionalResponse::from).collect(),
    ))
}
