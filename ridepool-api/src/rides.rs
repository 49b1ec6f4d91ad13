use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use ridepool_booking::NewRide;
use ridepool_core::Ride;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rides", post(create_ride).get(list_rides))
        .route("/rides/my", get(my_rides))
        .route("/rides/{id}/cancel", patch(cancel_ride))
}

/// POST /rides
async fn create_ride(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<NewRide>,
) -> Result<(StatusCode, Json<Ride>), AppError> {
    let ride = state.listings.create_ride(user_id, req).await?;
    Ok((StatusCode::CREATED, Json(ride)))
}

/// GET /rides
async fn list_rides(State(state): State<AppState>) -> Result<Json<Vec<Ride>>, AppError> {
    Ok(Json(state.listings.list_active_rides().await?))
}

/// GET /rides/my
async fn my_rides(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<Ride>>, AppError> {
    Ok(Json(state.listings.rides_for(user_id).await?))
}

/// PATCH /rides/{id}/cancel
async fn cancel_ride(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Ride>, AppError> {
    Ok(Json(state.listings.cancel_ride(user_id, id).await?))
}
