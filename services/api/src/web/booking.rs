//! services/api/src/web/booking.rs
//!
//! Endpoints that drive the booking wizard held in the shared state.
//!
//! Every step returns the wizard as it stands afterwards, so the client can
//! render it without a second request.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use booking_core::{
    BookingError, BookingStep, BookingWorkflow, ProfessionalId, ServiceId, TimeSlot, User,
};
use chrono::{Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::web::rest::{
    port_failure, resolve_appointments, AppointmentResponse, HandlerError,
    ProfessionalResponse, ServiceResponse,
};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct BookingResponse {
    /// One of `selecting_service`, `selecting_professional`, `selecting_date_time`, `confirming`.
    pub step: String,
    pub service: Option<ServiceResponse>,
    pub professional: Option<ProfessionalResponse>,
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
}

impl From<&BookingWorkflow> for BookingResponse {
    fn from(workflow: &BookingWorkflow) -> Self {
        Self {
            step: step_name(workflow.step()).to_string(),
            service: workflow.service().map(ServiceResponse::from),
            professional: workflow.professional().map(ProfessionalResponse::from),
            date: workflow.date(),
            time: workflow.time().map(|slot| slot.label()),
        }
    }
}

fn step_name(step: BookingStep) -> &'static str {
    match step {
        BookingStep::SelectingService => "selecting_service",
        BookingStep::SelectingProfessional => "selecting_professional",
        BookingStep::SelectingDateTime => "selecting_date_time",
        BookingStep::Confirming => "confirming",
    }
}

#[derive(Deserialize, ToSchema)]
pub struct SelectServiceRequest {
    pub service_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectProfessionalRequest {
    pub professional_id: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectDateRequest {
    pub date: NaiveDate,
}

#[derive(Deserialize, ToSchema)]
pub struct SelectTimeRequest {
    /// "HH:MM", one of the daily slots.
    pub time: String,
}

#[derive(Deserialize, ToSchema)]
pub struct UseFavoriteRequest {
    pub service_id: String,
    pub professional_id: String,
}

//=========================================================================================
// Error Mapping
//=========================================================================================

fn booking_failure(e: BookingError) -> HandlerError {
    match e {
        BookingError::UnknownService(_) | BookingError::UnknownProfessional(_) => {
            (StatusCode::NOT_FOUND, e.to_string())
        }
        BookingError::SlotUnavailable(_) => (StatusCode::CONFLICT, e.to_string()),
        BookingError::NoSession => (StatusCode::UNAUTHORIZED, e.to_string()),
        BookingError::Port(e) => port_failure("Booking failed", e),
        BookingError::WrongStep { .. }
        | BookingError::MissingSelection(_)
        | BookingError::DateInPast(_)
        | BookingError::StaleAvailability => (StatusCode::BAD_REQUEST, e.to_string()),
    }
}

fn no_booking() -> HandlerError {
    (
        StatusCode::NOT_FOUND,
        "No booking in progress. Start one with POST /booking.".to_string(),
    )
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /booking - Start a fresh booking, discarding any unfinished one
#[utoipa::path(
    post,
    path = "/booking",
    responses(
        (status = 201, description = "Booking started", body = BookingResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn start_booking_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let workflow = BookingWorkflow::new();
    let response = BookingResponse::from(&workflow);
    *state.booking.lock().await = Some(workflow);
    (StatusCode::CREATED, Json(response))
}

/// GET /booking - The booking in progress
#[utoipa::path(
    get,
    path = "/booking",
    responses(
        (status = 200, description = "Current booking", body = BookingResponse),
        (status = 401, description = "No active session"),
        (status = 404, description = "No booking in progress")
    )
)]
pub async fn get_booking_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let slot = state.booking.lock().await;
    let workflow = slot.as_ref().ok_or_else(no_booking)?;
    Ok(Json(BookingResponse::from(workflow)))
}

/// POST /booking/service - Choose the service (first step)
#[utoipa::path(
    post,
    path = "/booking/service",
    request_body = SelectServiceRequest,
    responses(
        (status = 200, description = "Service chosen", body = BookingResponse),
        (status = 400, description = "Wrong step"),
        (status = 404, description = "Unknown service or no booking in progress")
    )
)]
pub async fn select_service_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectServiceRequest>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    workflow
        .select_service(&state.catalog, &ServiceId::from(req.service_id))
        .await
        .map_err(booking_failure)?;
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/professional - Choose the professional (second step)
#[utoipa::path(
    post,
    path = "/booking/professional",
    request_body = SelectProfessionalRequest,
    responses(
        (status = 200, description = "Professional chosen", body = BookingResponse),
        (status = 400, description = "Wrong step"),
        (status = 404, description = "Unknown professional or no booking in progress")
    )
)]
pub async fn select_professional_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectProfessionalRequest>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    workflow
        .select_professional(&state.catalog, &ProfessionalId::from(req.professional_id))
        .await
        .map_err(booking_failure)?;
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/favorite - Jump to the date step with a saved pair
#[utoipa::path(
    post,
    path = "/booking/favorite",
    request_body = UseFavoriteRequest,
    responses(
        (status = 200, description = "Pair chosen", body = BookingResponse),
        (status = 400, description = "Wrong step"),
        (status = 404, description = "Unknown service/professional or no booking in progress")
    )
)]
pub async fn use_favorite_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UseFavoriteRequest>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    workflow
        .use_favorite(
            &state.catalog,
            &ServiceId::from(req.service_id),
            &ProfessionalId::from(req.professional_id),
        )
        .await
        .map_err(booking_failure)?;
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/date - Choose the day; today or later
#[utoipa::path(
    post,
    path = "/booking/date",
    request_body = SelectDateRequest,
    responses(
        (status = 200, description = "Date chosen, time cleared", body = BookingResponse),
        (status = 400, description = "Wrong step or date in the past"),
        (status = 404, description = "No booking in progress")
    )
)]
pub async fn select_date_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectDateRequest>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    workflow
        .select_date(req.date, Local::now().date_naive())
        .map_err(booking_failure)?;
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/time - Choose a free slot of the chosen professional and day
#[utoipa::path(
    post,
    path = "/booking/time",
    request_body = SelectTimeRequest,
    responses(
        (status = 200, description = "Time chosen", body = BookingResponse),
        (status = 400, description = "Not a daily slot, wrong step, or date not chosen"),
        (status = 404, description = "No booking in progress"),
        (status = 409, description = "Slot already taken")
    )
)]
pub async fn select_time_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SelectTimeRequest>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let time = req
        .time
        .parse::<TimeSlot>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    let professional_id = workflow
        .professional()
        .map(|p| p.id.clone())
        .ok_or_else(|| booking_failure(BookingError::MissingSelection("professional")))?;
    let date = workflow
        .date()
        .ok_or_else(|| booking_failure(BookingError::MissingSelection("date")))?;

    let availability = state
        .appointments
        .availability(&professional_id, date)
        .await
        .map_err(|e| port_failure("Failed to compute availability", e))?;
    workflow
        .select_time(time, &availability)
        .map_err(booking_failure)?;
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/next - Advance once the current step's choice is made
#[utoipa::path(
    post,
    path = "/booking/next",
    responses(
        (status = 200, description = "Advanced", body = BookingResponse),
        (status = 400, description = "Selection missing or already at the last step"),
        (status = 404, description = "No booking in progress")
    )
)]
pub async fn next_step_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    workflow.next().map_err(booking_failure)?;
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/back - Go back one step, keeping the choices
#[utoipa::path(
    post,
    path = "/booking/back",
    responses(
        (status = 200, description = "Went back", body = BookingResponse),
        (status = 404, description = "No booking in progress")
    )
)]
pub async fn previous_step_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<BookingResponse>, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.as_mut().ok_or_else(no_booking)?;
    workflow.back();
    Ok(Json(BookingResponse::from(&*workflow)))
}

/// POST /booking/confirm - Book the appointment
///
/// On success the wizard is finished and removed. On failure it stays as it was.
#[utoipa::path(
    post,
    path = "/booking/confirm",
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentResponse),
        (status = 400, description = "Not at the confirmation step"),
        (status = 401, description = "No active session"),
        (status = 404, description = "No booking in progress"),
        (status = 409, description = "Slot was booked in the meantime")
    )
)]
pub async fn confirm_booking_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut slot = state.booking.lock().await;
    let workflow = slot.take().ok_or_else(no_booking)?;

    match workflow
        .confirm(&state.sessions, &state.appointments, Utc::now())
        .await
    {
        Ok(appointment) => {
            info!(appointment_id = %appointment.id, "Appointment booked over HTTP.");
            let mut resolved = resolve_appointments(&state, &user, &[appointment]).await?;
            let body = resolved.pop().ok_or_else(|| {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Booked appointment could not be rendered".to_string(),
                )
            })?;
            Ok((StatusCode::CREATED, Json(body)))
        }
        Err(failed) => {
            warn!(error = %failed.error, "Booking not confirmed.");
            *slot = Some(*failed.workflow);
            Err(booking_failure(failed.error))
        }
    }
}
