use async_trait::async_trait;
use ridepool_shared::NotificationEvent;
use uuid::Uuid;

use crate::booking::{Booking, BookingPatch, BookingStatus, Notification};
use crate::listing::{Ride, RidePatch, RideRequest, RideRequestPatch};

pub type RepoError = Box<dyn std::error::Error + Send + Sync>;
pub type RepoResult<T> = Result<T, RepoError>;

/// Repository trait for ride and ride request data access
#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create_ride(&self, ride: &Ride) -> RepoResult<()>;

    async fn get_ride(&self, id: Uuid) -> RepoResult<Option<Ride>>;

    async fn list_active_rides(&self) -> RepoResult<Vec<Ride>>;

    async fn list_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>>;

    /// Returns the updated ride, or `None` if it does not exist.
    async fn update_ride(&self, id: Uuid, patch: RidePatch) -> RepoResult<Option<Ride>>;

    /// Returns whether a ride was removed.
    async fn delete_ride(&self, id: Uuid) -> RepoResult<bool>;

    async fn create_request(&self, request: &RideRequest) -> RepoResult<()>;

    async fn get_request(&self, id: Uuid) -> RepoResult<Option<RideRequest>>;

    async fn list_active_requests(&self) -> RepoResult<Vec<RideRequest>>;

    async fn list_requests_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<RideRequest>>;

    async fn update_request(&self, id: Uuid, patch: RideRequestPatch) -> RepoResult<Option<RideRequest>>;

    async fn delete_request(&self, id: Uuid) -> RepoResult<bool>;
}

/// Repository trait for booking and notification data access
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create_booking(&self, booking: &Booking) -> RepoResult<()>;

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>>;

    /// Bookings where the user is either rider or driver.
    async fn list_bookings_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Booking>>;

    async fn list_bookings_by_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Booking>>;

    async fn list_bookings_by_status(&self, status: BookingStatus) -> RepoResult<Vec<Booking>>;

    async fn update_booking(&self, id: Uuid, patch: BookingPatch) -> RepoResult<Option<Booking>>;

    async fn create_notification(&self, notification: &Notification) -> RepoResult<()>;

    async fn list_notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>>;

    async fn mark_notification_read(&self, id: Uuid) -> RepoResult<Option<Notification>>;
}

/// Delivers notifications to users.
///
/// Fire-and-forget: implementations log their own failures and never report
/// them back to the caller.
#[async_trait]
pub trait NotificationEmitter: Send + Sync {
    async fn emit(&self, event: NotificationEvent);
}
