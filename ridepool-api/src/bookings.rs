use axum::{
    extract::{Extension, Json, Path, State},
    http::StatusCode,
    routing::{get, patch, post},
    Router,
};
use ridepool_booking::{CreateBookingInput, DeclinedCounterOffer, NegotiatedBooking, RideAvailability};
use ridepool_core::{Booking, BookingStatus};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct UpdateBookingStatus {
    status: BookingStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/my", get(my_bookings))
        .route("/bookings/{id}", patch(update_booking))
        .route("/bookings/{id}/decline-counter-offer", patch(decline_counter_offer))
        .route("/bookings/ride/{ride_id}", get(ride_bookings))
}

/// POST /bookings
async fn create_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateBookingInput>,
) -> Result<(StatusCode, Json<NegotiatedBooking>), AppError> {
    let created = state.negotiator.create_booking(user_id, req).await?;
    info!("Booking {} created by {}", created.booking.id, user_id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /bookings/my
async fn my_bookings(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<Booking>>, AppError> {
    Ok(Json(state.negotiator.bookings_for(user_id).await?))
}

/// PATCH /bookings/{id}
async fn update_booking(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateBookingStatus>,
) -> Result<Json<Booking>, AppError> {
    Ok(Json(state.negotiator.update_status(user_id, id, req.status).await?))
}

/// PATCH /bookings/{id}/decline-counter-offer
async fn decline_counter_offer(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeclinedCounterOffer>, AppError> {
    Ok(Json(state.negotiator.decline_counter_offer(user_id, id).await?))
}

/// GET /bookings/ride/{ride_id}
async fn ride_bookings(
    State(state): State<AppState>,
    Path(ride_id): Path<Uuid>,
) -> Result<Json<RideAvailability>, AppError> {
    Ok(Json(state.negotiator.ride_availability(ride_id).await?))
}
