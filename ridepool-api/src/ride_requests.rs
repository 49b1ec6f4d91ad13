use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use ridepool_booking::NewRideRequest;
use ridepool_core::RideRequest;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/ride-requests", post(create_request).get(list_requests))
        .route("/ride-requests/my", get(my_requests))
        .route("/ride-requests/{id}/cancel", patch(cancel_request))
}

/// POST /ride-requests
async fn create_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<NewRideRequest>,
) -> Result<(StatusCode, Json<RideRequest>), AppError> {
    let request = state.listings.create_request(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// GET /ride-requests
async fn list_requests(State(state): State<AppState>) -> Result<Json<Vec<RideRequest>>, AppError> {
    Ok(Json(state.listings.list_active_requests().await?))
}

/// GET /ride-requests/my
async fn my_requests(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<RideRequest>>, AppError> {
    Ok(Json(state.listings.requests_for(user_id).await?))
}

/// PATCH /ride-requests/{id}/cancel
async fn cancel_request(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<RideRequest>, AppError> {
    Ok(Json(state.listings.cancel_request(user_id, id).await?))
}
