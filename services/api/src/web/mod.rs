pub mod appointments;
pub mod assistant;
pub mod auth;
pub mod booking;
pub mod favorites;
pub mod middleware;
pub mod rest;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

pub use middleware::require_session;
pub use rest::ApiDoc;
pub use state::AppState;

/// Builds every API route. CORS and the Swagger UI are layered on by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/catalog/services", get(rest::list_services_handler))
        .route("/catalog/professionals", get(rest::list_professionals_handler))
        .route("/availability", get(appointments::availability_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/sms/request", post(auth::request_sms_handler))
        .route("/auth/sms/verify", post(auth::verify_sms_handler))
        .route("/auth/recovery", post(auth::password_reset_handler))
        .route("/auth/logout", post(auth::logout_handler));

    // Session-scoped routes
    let protected_routes = Router::new()
        .route("/me", get(auth::me_handler))
        .route("/onboarding", post(auth::onboarding_handler))
        .route("/dashboard", get(auth::dashboard_handler))
        .route("/appointments", get(appointments::list_appointments_handler))
        .route("/appointments/views", get(appointments::appointment_views_handler))
        .route(
            "/appointments/{id}/cancel",
            post(appointments::cancel_appointment_handler),
        )
        .route("/favorites", get(favorites::list_favorites_handler))
        .route("/favorites/toggle", post(favorites::toggle_favorite_handler))
        .route(
            "/booking",
            post(booking::start_booking_handler).get(booking::get_booking_handler),
        )
        .route("/booking/service", post(booking::select_service_handler))
        .route("/booking/professional", post(booking::select_professional_handler))
        .route("/booking/favorite", post(booking::use_favorite_handler))
        .route("/booking/date", post(booking::select_date_handler))
        .route("/booking/time", post(booking::select_time_handler))
        .route("/booking/next", post(booking::next_step_handler))
        .route("/booking/back", post(booking::previous_step_handler))
        .route("/booking/confirm", post(booking::confirm_booking_handler))
        .route(
            "/assistant/messages",
            get(assistant::history_handler).post(assistant::send_message_handler),
        )
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(app_state)
}
