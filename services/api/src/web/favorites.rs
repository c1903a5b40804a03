//! services/api/src/web/favorites.rs
//!
//! Endpoints for the session user's favorite (service, professional) pairs.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use booking_core::{ProfessionalId, ServiceId, User};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use crate::web::rest::{
    port_failure, HandlerError, ProfessionalResponse, ServiceResponse, UserResponse,
};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FavoritesQuery {
    /// Case-insensitive match on the service or professional name.
    #[serde(default)]
    pub q: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ToggleFavoriteRequest {
    pub service_id: String,
    pub professional_id: String,
}

#[derive(Serialize, ToSchema)]
pub struct ResolvedFavoriteResponse {
    pub service: ServiceResponse,
    pub professional: ProfessionalResponse,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /favorites - The session user's favorites, resolved against the catalog
#[utoipa::path(
    get,
    path = "/favorites",
    params(FavoritesQuery),
    responses(
        (status = 200, description = "Matching favorites", body = [ResolvedFavoriteResponse]),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn list_favorites_handler(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<User>,
    Query(query): Query<FavoritesQuery>,
) -> Result<Json<Vec<ResolvedFavoriteResponse>>, HandlerError> {
    let found = state
        .favorites
        .search(&user, &query.q)
        .await
        .map_err(|e| port_failure("Failed to load favorites", e))?;
    Ok(Json(
        found
            .iter()
            .map(|f| ResolvedFavoriteResponse {
                service: ServiceResponse::from(&f.service),
                professional: ProfessionalResponse::from(&f.professional),
            })
            .collect(),
    ))
}

/// POST /favorites/toggle - Add the pair, or remove it when already saved
#[utoipa::path(
    post,
    path = "/favorites/toggle",
    request_body = ToggleFavoriteRequest,
    responses(
        (status = 200, description = "The updated user", body = UserResponse),
        (status = 401, description = "No active session"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn toggle_favorite_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleFavoriteRequest>,
) -> Result<Json<UserResponse>, HandlerError> {
    let user = state
        .favorites
        .toggle(
            &ServiceId::from(req.service_id),
            &ProfessionalId::from(req.professional_id),
        )
        .await
        .map_err(|e| port_failure("Failed to update favorites", e))?
        .ok_or((StatusCode::UNAUTHORIZED, "No active session".to_string()))?;
    Ok(Json(UserResponse::from(&user)))
}
