use ridepool_core::booking::{BookingPatch, BookingStatus};
use ridepool_core::listing::{
    Itinerary, RecurringData, RequestStatus, Ride, RidePatch, RideRequest, RideRequestPatch, RideStatus,
};
use ridepool_core::repository::{BookingRepository, ListingRepository, NotificationEmitter};
use ridepool_core::{schedule, CoreError, CoreResult};
use ridepool_shared::{NotificationEvent, NotificationKind};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// Body of a "publish a ride" call.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRide {
    pub from_location: String,
    pub to_location: String,
    pub departure_date: Option<String>,
    pub departure_time: String,
    pub available_seats: i32,
    pub price: i32,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurring_data: Option<RecurringData>,
}

/// Body of a "publish a ride request" call.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRideRequest {
    pub from_location: String,
    pub to_location: String,
    pub departure_date: Option<String>,
    pub departure_time: String,
    pub passengers: i32,
    pub max_price: Option<i32>,
}

fn validated_itinerary(
    from_location: String,
    to_location: String,
    departure_date: Option<String>,
    departure_time: String,
) -> CoreResult<Itinerary> {
    let from_location = from_location.trim().to_string();
    let to_location = to_location.trim().to_string();
    if from_location.is_empty() || to_location.is_empty() {
        return Err(CoreError::ValidationError("Origin and destination are required".to_string()));
    }

    let departure_date = departure_date.filter(|d| !d.trim().is_empty());
    schedule::validate(departure_date.as_deref(), &departure_time)?;

    Ok(Itinerary { from_location, to_location, departure_date, departure_time })
}

/// Publishing, listing and owner-cancelling rides and ride requests
pub struct ListingService {
    listings: Arc<dyn ListingRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn NotificationEmitter>,
}

impl ListingService {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn NotificationEmitter>,
    ) -> Self {
        Self { listings, bookings, notifier }
    }

    pub async fn create_ride(&self, driver_id: Uuid, req: NewRide) -> CoreResult<Ride> {
        let itinerary = validated_itinerary(req.from_location, req.to_location, req.departure_date, req.departure_time)?;

        if req.available_seats < 1 {
            return Err(CoreError::ValidationError("A ride needs at least one seat".to_string()));
        }
        if req.price < 0 {
            return Err(CoreError::ValidationError("Price cannot be negative".to_string()));
        }

        let recurring_data = if req.is_recurring {
            match req.recurring_data {
                Some(data) if !data.days.is_empty() => Some(data),
                _ => {
                    return Err(CoreError::ValidationError(
                        "Recurring rides need at least one day of the week".to_string(),
                    ))
                }
            }
        } else {
            None
        };

        let mut ride = Ride::new(driver_id, itinerary, req.available_seats, req.price);
        ride.is_recurring = req.is_recurring;
        ride.recurring_data = recurring_data;

        self.listings.create_ride(&ride).await?;
        info!("Ride published: {} by driver {}", ride.id, driver_id);
        Ok(ride)
    }

    pub async fn list_active_rides(&self) -> CoreResult<Vec<Ride>> {
        Ok(self.listings.list_active_rides().await?)
    }

    pub async fn rides_for(&self, driver_id: Uuid) -> CoreResult<Vec<Ride>> {
        Ok(self.listings.list_rides_by_driver(driver_id).await?)
    }

    /// Driver withdraws a ride. Every booking still holding seats is cancelled with it.
    pub async fn cancel_ride(&self, caller: Uuid, ride_id: Uuid) -> CoreResult<Ride> {
        let ride = self
            .listings
            .get_ride(ride_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride {}", ride_id)))?;

        if ride.driver_id != caller {
            return Err(CoreError::Forbidden("Only the driver can cancel this ride".to_string()));
        }
        if ride.status == RideStatus::Cancelled {
            return Ok(ride);
        }

        let ride = self
            .listings
            .update_ride(ride_id, RidePatch::status(RideStatus::Cancelled))
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride {}", ride_id)))?;

        for booking in self.bookings.list_bookings_by_ride(ride_id).await? {
            if !booking.holds_seats() {
                continue;
            }
            self.bookings.update_booking(booking.id, BookingPatch::status(BookingStatus::Cancelled)).await?;
            self.notifier
                .emit(NotificationEvent::new(
                    booking.rider_id,
                    NotificationKind::BookingCancelled,
                    "Booking cancelled",
                    format!(
                        "The driver cancelled the ride from {} to {}",
                        ride.from_location, ride.to_location
                    ),
                    Some(booking.id),
                ))
                .await;
        }

        info!("Ride cancelled by driver: {}", ride_id);
        Ok(ride)
    }

    pub async fn create_request(&self, rider_id: Uuid, req: NewRideRequest) -> CoreResult<RideRequest> {
        let itinerary = validated_itinerary(req.from_location, req.to_location, req.departure_date, req.departure_time)?;

        if req.passengers < 1 {
            return Err(CoreError::ValidationError("A request needs at least one passenger".to_string()));
        }
        if req.max_price.is_some_and(|p| p < 0) {
            return Err(CoreError::ValidationError("Max price cannot be negative".to_string()));
        }

        let request = RideRequest::new(rider_id, itinerary, req.passengers, req.max_price);
        self.listings.create_request(&request).await?;
        info!("Ride request published: {} by rider {}", request.id, rider_id);
        Ok(request)
    }

    pub async fn list_active_requests(&self) -> CoreResult<Vec<RideRequest>> {
        Ok(self.listings.list_active_requests().await?)
    }

    pub async fn requests_for(&self, rider_id: Uuid) -> CoreResult<Vec<RideRequest>> {
        Ok(self.listings.list_requests_by_rider(rider_id).await?)
    }

    pub async fn cancel_request(&self, caller: Uuid, request_id: Uuid) -> CoreResult<RideRequest> {
        let request = self
            .listings
            .get_request(request_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride request {}", request_id)))?;

        if request.rider_id != caller {
            return Err(CoreError::Forbidden("Only the rider can cancel this request".to_string()));
        }

        self.listings
            .update_request(request_id, RideRequestPatch::status(RequestStatus::Cancelled))
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride request {}", request_id)))
    }
}
