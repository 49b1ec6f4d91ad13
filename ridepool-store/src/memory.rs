use async_trait::async_trait;
use ridepool_core::booking::{Booking, BookingPatch, BookingStatus, Notification};
use ridepool_core::listing::{RequestStatus, Ride, RidePatch, RideRequest, RideRequestPatch, RideStatus};
use ridepool_core::repository::{BookingRepository, ListingRepository, RepoResult};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory store backing both repositories.
///
/// Used for local development when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    rides: RwLock<HashMap<Uuid, Ride>>,
    requests: RwLock<HashMap<Uuid, RideRequest>>,
    bookings: RwLock<HashMap<Uuid, Booking>>,
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn newest_first<T, F>(mut items: Vec<T>, created_at: F) -> Vec<T>
where
    F: Fn(&T) -> chrono::DateTime<chrono::Utc>,
{
    items.sort_by_key(|item| std::cmp::Reverse(created_at(item)));
    items
}

#[async_trait]
impl ListingRepository for MemoryStore {
    async fn create_ride(&self, ride: &Ride) -> RepoResult<()> {
        self.rides.write().await.insert(ride.id, ride.clone());
        Ok(())
    }

    async fn get_ride(&self, id: Uuid) -> RepoResult<Option<Ride>> {
        Ok(self.rides.read().await.get(&id).cloned())
    }

    async fn list_active_rides(&self) -> RepoResult<Vec<Ride>> {
        let rides = self.rides.read().await;
        let active: Vec<Ride> = rides.values().filter(|r| r.status == RideStatus::Active).cloned().collect();
        Ok(newest_first(active, |r: &Ride| r.created_at))
    }

    async fn list_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>> {
        let rides = self.rides.read().await;
        let owned: Vec<Ride> = rides.values().filter(|r| r.driver_id == driver_id).cloned().collect();
        Ok(newest_first(owned, |r: &Ride| r.created_at))
    }

    async fn update_ride(&self, id: Uuid, patch: RidePatch) -> RepoResult<Option<Ride>> {
        let mut rides = self.rides.write().await;
        Ok(rides.get_mut(&id).map(|ride| {
            patch.apply(ride);
            ride.clone()
        }))
    }

    async fn delete_ride(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.rides.write().await.remove(&id).is_some())
    }

    async fn create_request(&self, request: &RideRequest) -> RepoResult<()> {
        self.requests.write().await.insert(request.id, request.clone());
        Ok(())
    }

    async fn get_request(&self, id: Uuid) -> RepoResult<Option<RideRequest>> {
        Ok(self.requests.read().await.get(&id).cloned())
    }

    async fn list_active_requests(&self) -> RepoResult<Vec<RideRequest>> {
        let requests = self.requests.read().await;
        let active: Vec<RideRequest> = requests.values().filter(|r| r.status == RequestStatus::Active).cloned().collect();
        Ok(newest_first(active, |r: &RideRequest| r.created_at))
    }

    async fn list_requests_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<RideRequest>> {
        let requests = self.requests.read().await;
        let owned: Vec<RideRequest> = requests.values().filter(|r| r.rider_id == rider_id).cloned().collect();
        Ok(newest_first(owned, |r: &RideRequest| r.created_at))
    }

    async fn update_request(&self, id: Uuid, patch: RideRequestPatch) -> RepoResult<Option<RideRequest>> {
        let mut requests = self.requests.write().await;
        Ok(requests.get_mut(&id).map(|request| {
            patch.apply(request);
            request.clone()
        }))
    }

    async fn delete_request(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.requests.write().await.remove(&id).is_some())
    }
}

#[async_trait]
impl BookingRepository for MemoryStore {
    async fn create_booking(&self, booking: &Booking) -> RepoResult<()> {
        self.bookings.write().await.insert(booking.id, booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
        Ok(self.bookings.read().await.get(&id).cloned())
    }

    async fn list_bookings_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let involved: Vec<Booking> = bookings.values().filter(|b| b.involves(user_id)).cloned().collect();
        Ok(newest_first(involved, |b: &Booking| b.created_at))
    }

    async fn list_bookings_by_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut on_ride: Vec<Booking> = bookings.values().filter(|b| b.ride_id == ride_id).cloned().collect();
        on_ride.sort_by_key(|b| b.created_at);
        Ok(on_ride)
    }

    async fn list_bookings_by_status(&self, status: BookingStatus) -> RepoResult<Vec<Booking>> {
        let bookings = self.bookings.read().await;
        let mut matching: Vec<Booking> = bookings.values().filter(|b| b.status == status).cloned().collect();
        matching.sort_by_key(|b| b.created_at);
        Ok(matching)
    }

    async fn update_booking(&self, id: Uuid, patch: BookingPatch) -> RepoResult<Option<Booking>> {
        let mut bookings = self.bookings.write().await;
        Ok(bookings.get_mut(&id).map(|booking| {
            patch.apply(booking);
            booking.clone()
        }))
    }

    async fn create_notification(&self, notification: &Notification) -> RepoResult<()> {
        self.notifications.write().await.insert(notification.id, notification.clone());
        Ok(())
    }

    async fn list_notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>> {
        let notifications = self.notifications.read().await;
        let mine: Vec<Notification> = notifications.values().filter(|n| n.user_id == user_id).cloned().collect();
        Ok(newest_first(mine, |n: &Notification| n.created_at))
    }

    async fn mark_notification_read(&self, id: Uuid) -> RepoResult<Option<Notification>> {
        let mut notifications = self.notifications.write().await;
        Ok(notifications.get_mut(&id).map(|n| {
            n.is_read = true;
            n.clone()
        }))
    }
}
