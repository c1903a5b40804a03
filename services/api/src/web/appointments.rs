//! services/api/src/web/appointments.rs
//!
//! Endpoints for the session user's appointments and for slot availability.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use booking_core::{schedule, AppointmentId, ProfessionalId, User};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::web::rest::{port_failure, resolve_appointments, AppointmentResponse, HandlerError};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct ScheduleViewsResponse {
    /// Soonest first.
    pub upcoming: Vec<AppointmentResponse>,
    /// Most recent first.
    pub history: Vec<AppointmentResponse>,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub professional_id: String,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: NaiveDate,
}

#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub professional_id: String,
    pub date: NaiveDate,
    pub taken: Vec<String>,
    pub available: Vec<String>,
    pub full: bool,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /appointments - The session user's appointments, newest booking first
#[utoipa::path(
    get,
    path = "/appointments",
    responses(
        (status = 200, description = "Appointments of the session user", body = [AppointmentResponse]),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_appointments_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<Vec<AppointmentResponse>>, HandlerError> {
    let appointments = state
        .appointments
        .list_for_user(&user.id)
        .await
        .map_err(|e| port_failure("Failed to load appointments", e))?;
    Ok(Json(resolve_appointments(&state, &user, &appointments).await?))
}

/// GET /appointments/views - The upcoming and history tabs
#[utoipa::path(
    get,
    path = "/appointments/views",
    responses(
        (status = 200, description = "Upcoming and past appointments", body = ScheduleViewsResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn appointment_views_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<ScheduleViewsResponse>, HandlerError> {
    let appointments = state
        .appointments
        .list_for_user(&user.id)
        .await
        .map_err(|e| port_failure("Failed to load appointments", e))?;

    let views = schedule::partition(&appointments, Local::now().naive_local());
    Ok(Json(ScheduleViewsResponse {
        upcoming: resolve_appointments(&state, &user, &views.upcoming).await?,
        history: resolve_appointments(&state, &user, &views.history).await?,
    }))
}

/// POST /appointments/{id}/cancel - Cancel one of the session user's appointments
///
/// Cancelling twice is harmless.
#[utoipa::path(
    post,
    path = "/appointments/{id}/cancel",
    params(("id" = String, Path, description = "The appointment id")),
    responses(
        (status = 204, description = "Appointment cancelled"),
        (status = 401, description = "No active session"),
        (status = 404, description = "No such appointment for this user"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn cancel_appointment_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
) -> Result<StatusCode, HandlerError> {
    let id = AppointmentId::from(id);
    let not_found = || (StatusCode::NOT_FOUND, format!("Appointment {} not found", id));

    let appointment = state
        .appointments
        .get(&id)
        .await
        .map_err(|e| port_failure("Failed to load the appointment", e))?
        .ok_or_else(not_found)?;
    if appointment.user_id != user.id {
        return Err(not_found());
    }

    state
        .appointments
        .cancel(&id)
        .await
        .map_err(|e| port_failure("Failed to cancel the appointment", e))?;
    info!(appointment_id = %id, user_id = %user.id, "Cancellation requested.");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /availability - Free and taken slots of a professional on a date
#[utoipa::path(
    get,
    path = "/availability",
    params(AvailabilityQuery),
    responses(
        (status = 200, description = "Slots of the day", body = AvailabilityResponse),
        (status = 404, description = "Unknown professional"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn availability_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, HandlerError> {
    let professional_id = ProfessionalId::from(query.professional_id);
    let known = state
        .catalog
        .professional(&professional_id)
        .await
        .map_err(|e| port_failure("Failed to load the professional", e))?;
    if known.is_none() {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Professional {} not found", professional_id),
        ));
    }

    let day = state
        .appointments
        .availability(&professional_id, query.date)
        .await
        .map_err(|e| port_failure("Failed to compute availability", e))?;
    Ok(Json(AvailabilityResponse {
        professional_id: day.professional_id.to_string(),
        date: day.date,
        taken: day.taken.iter().map(|slot| slot.label()).collect(),
        available: day.available.iter().map(|slot| slot.label()).collect(),
        full: day.is_full(),
    }))
}
