//! services/api/src/web/auth.rs
//!
//! Authentication endpoints (email, registration, SMS code), the onboarding form,
//! and the per-user profile and dashboard reads.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use booking_core::{
    auth::{AuthError, LoginOutcome, OnboardingProfile},
    schedule, User,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use utoipa::ToSchema;

use crate::web::rest::{
    port_failure, resolve_appointments, AppointmentResponse, HandlerError, ServiceResponse,
    UserResponse,
};
use crate::web::state::AppState;

/// Number of services highlighted on the dashboard.
const FEATURED_SERVICES: usize = 3;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    /// Accepted and ignored.
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SmsRequest {
    pub phone: String,
}

#[derive(Deserialize, ToSchema)]
pub struct SmsVerifyRequest {
    pub phone: String,
    pub code: String,
}

/// There is no SMS gateway; the code is handed back so the client can show it.
#[derive(Serialize, ToSchema)]
pub struct SmsCodeResponse {
    pub demo_code: String,
}

#[derive(Deserialize, ToSchema)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct PasswordResetResponse {
    pub sent_to: String,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub needs_onboarding: bool,
}

impl From<LoginOutcome> for LoginResponse {
    fn from(outcome: LoginOutcome) -> Self {
        Self {
            user: UserResponse::from(&outcome.user),
            needs_onboarding: outcome.needs_onboarding,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct OnboardingRequest {
    pub name: String,
    pub surname: Option<String>,
    pub phone: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub avatar: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct DashboardResponse {
    pub user: UserResponse,
    pub next_appointment: Option<AppointmentResponse>,
    pub featured_services: Vec<ServiceResponse>,
}

fn auth_failure(e: AuthError) -> HandlerError {
    match e {
        AuthError::ValidationFailure(message) => (StatusCode::BAD_REQUEST, message),
        AuthError::EmailTaken => (StatusCode::CONFLICT, e.to_string()),
        AuthError::NoSession => (StatusCode::UNAUTHORIZED, e.to_string()),
        AuthError::Port(e) => port_failure("Authentication failed", e),
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /auth/login - Log in with an email, creating the account on first use
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HandlerError> {
    let outcome = state.auth.login(&req.email).await.map_err(auth_failure)?;
    Ok(Json(outcome.into()))
}

/// POST /auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully", body = LoginResponse),
        (status = 400, description = "Password and confirmation differ"),
        (status = 409, description = "Email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let outcome = state
        .auth
        .register(&req.email, &req.password, &req.confirm_password)
        .await
        .map_err(auth_failure)?;
    Ok((StatusCode::CREATED, Json(LoginResponse::from(outcome))))
}

/// POST /auth/sms/request - Ask for a login code
#[utoipa::path(
    post,
    path = "/auth/sms/request",
    request_body = SmsRequest,
    responses(
        (status = 200, description = "Code issued", body = SmsCodeResponse),
        (status = 400, description = "Missing phone number")
    )
)]
pub async fn request_sms_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SmsRequest>,
) -> Result<Json<SmsCodeResponse>, HandlerError> {
    let code = state
        .auth
        .request_sms_code(&req.phone)
        .map_err(auth_failure)?;
    Ok(Json(SmsCodeResponse {
        demo_code: code.to_string(),
    }))
}

/// POST /auth/recovery - Ask for a password recovery link
#[utoipa::path(
    post,
    path = "/auth/recovery",
    request_body = PasswordResetRequest,
    responses(
        (status = 202, description = "Recovery link sent", body = PasswordResetResponse),
        (status = 400, description = "Missing email")
    )
)]
pub async fn password_reset_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<(StatusCode, Json<PasswordResetResponse>), HandlerError> {
    let sent_to = state
        .auth
        .request_password_reset(&req.email)
        .map_err(auth_failure)?;
    Ok((StatusCode::ACCEPTED, Json(PasswordResetResponse { sent_to })))
}

/// POST /auth/sms/verify - Log in with the code received by SMS
#[utoipa::path(
    post,
    path = "/auth/sms/verify",
    request_body = SmsVerifyRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Incorrect code"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn verify_sms_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SmsVerifyRequest>,
) -> Result<Json<LoginResponse>, HandlerError> {
    let outcome = state
        .auth
        .login_with_phone(&req.phone, &req.code)
        .await
        .map_err(auth_failure)?;
    Ok(Json(outcome.into()))
}

/// POST /auth/logout - End the session
///
/// Any booking in progress is dropped with it.
#[utoipa::path(
    post,
    path = "/auth/logout",
    responses(
        (status = 204, description = "Logout successful"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, HandlerError> {
    state.auth.logout().await.map_err(auth_failure)?;
    state.booking.lock().await.take();
    info!("Logged out.");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /me - The session user
#[utoipa::path(
    get,
    path = "/me",
    responses(
        (status = 200, description = "The session user", body = UserResponse),
        (status = 401, description = "No active session")
    )
)]
pub async fn me_handler(Extension(user): Extension<User>) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// POST /onboarding - Complete the profile after the first login
#[utoipa::path(
    post,
    path = "/onboarding",
    request_body = OnboardingRequest,
    responses(
        (status = 200, description = "Profile saved", body = UserResponse),
        (status = 400, description = "Name missing"),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn onboarding_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OnboardingRequest>,
) -> Result<Json<UserResponse>, HandlerError> {
    if req.name.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "A name is required.".to_string()));
    }

    let profile = OnboardingProfile {
        name: req.name.trim().to_string(),
        surname: req.surname,
        phone: req.phone,
        birth_date: req.birth_date,
        avatar: req.avatar,
    };
    let user = state
        .auth
        .complete_onboarding(profile)
        .await
        .map_err(auth_failure)?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /dashboard - Greeting data: next appointment and featured services
#[utoipa::path(
    get,
    path = "/dashboard",
    responses(
        (status = 200, description = "Dashboard data", body = DashboardResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
) -> Result<Json<DashboardResponse>, HandlerError> {
    let appointments = state
        .appointments
        .list_for_user(&user.id)
        .await
        .map_err(|e| port_failure("Failed to load appointments", e))?;
    let now = Local::now().naive_local();
    let next_appointment = match schedule::next_appointment(&appointments, now) {
        Some(appointment) => resolve_appointments(&state, &user, &[appointment]).await?.pop(),
        None => None,
    };

    let featured_services = state
        .catalog
        .featured_services(FEATURED_SERVICES)
        .await
        .map_err(|e| {
            error!("Failed to load featured services: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to load the dashboard".to_string(),
            )
        })?;

    Ok(Json(DashboardResponse {
        user: UserResponse::from(&user),
        next_appointment,
        featured_services: featured_services.iter().map(ServiceResponse::from).collect(),
    }))
}
