use ridepool_core::booking::{Booking, BookingPatch, BookingStatus};
use ridepool_core::listing::{RequestStatus, Ride, RidePatch, RideRequest, RideRequestPatch, RideStatus};
use ridepool_core::repository::{BookingRepository, ListingRepository, NotificationEmitter};
use ridepool_core::schedule::DepartureResolver;
use ridepool_core::{Clock, CoreResult};
use ridepool_shared::{NotificationEvent, NotificationKind};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy)]
pub struct SweeperSettings {
    /// Time between cycles.
    pub interval: Duration,
    /// How far ahead of departure an unfilled listing is given up on.
    pub cutoff: chrono::Duration,
}

impl SweeperSettings {
    pub fn new(interval_seconds: u64, cutoff_minutes: i64) -> Self {
        Self {
            interval: Duration::from_secs(interval_seconds.max(1)),
            cutoff: chrono::Duration::minutes(cutoff_minutes),
        }
    }
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self::new(60, 15)
    }
}

/// What one cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub rides_cancelled: usize,
    pub requests_cancelled: usize,
    pub bookings_cancelled: usize,
    pub failures: usize,
}

impl SweepReport {
    pub fn is_idle(&self) -> bool {
        *self == SweepReport::default()
    }
}

/// Cancels rides, ride requests and pending bookings whose departure is too close to still fill.
pub struct ExpirySweeper {
    listings: Arc<dyn ListingRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn NotificationEmitter>,
    clock: Arc<dyn Clock>,
    resolver: DepartureResolver,
    settings: SweeperSettings,
}

/// Running sweeper task. Dropping the handle leaves the task running until process exit.
pub struct SweeperHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            error!("Expiry sweeper task ended abnormally: {}", e);
        }
    }
}

impl ExpirySweeper {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn NotificationEmitter>,
        clock: Arc<dyn Clock>,
        resolver: DepartureResolver,
        settings: SweeperSettings,
    ) -> Self {
        Self { listings, bookings, notifier, clock, resolver, settings }
    }

    /// Spawn the periodic loop. The first cycle runs immediately.
    pub fn start(self: Arc<Self>) -> SweeperHandle {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.settings.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Expiry sweeper started, every {:?}", self.settings.interval);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let report = self.run_cycle().await;
                        if report.is_idle() {
                            debug!("Sweep: nothing to expire");
                        } else {
                            info!(
                                "Sweep: {} rides, {} requests, {} bookings cancelled ({} failures)",
                                report.rides_cancelled,
                                report.requests_cancelled,
                                report.bookings_cancelled,
                                report.failures
                            );
                        }
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }

            info!("Expiry sweeper stopped");
        });

        SweeperHandle { shutdown, task }
    }

    /// One full pass over rides, ride requests and pending bookings.
    pub async fn run_cycle(&self) -> SweepReport {
        let now = self.clock.now();
        let cutoff = now + self.settings.cutoff;
        let mut report = SweepReport::default();

        self.sweep_rides(now, cutoff, &mut report).await;
        self.sweep_requests(now, cutoff, &mut report).await;
        self.sweep_bookings(now, cutoff, &mut report).await;

        report
    }

    // ==========================================
    // Rides
    // ==========================================

    async fn sweep_rides(&self, now: DateTime<Utc>, cutoff: DateTime<Utc>, report: &mut SweepReport) {
        let rides = match self.listings.list_active_rides().await {
            Ok(rides) => rides,
            Err(e) => {
                error!("Sweep: failed to list active rides: {}", e);
                report.failures += 1;
                return;
            }
        };

        for ride in rides {
            if ride.is_recurring
                || !self.resolver.departs_by(ride.departure_date.as_deref(), &ride.departure_time, now, cutoff)
            {
                continue;
            }

            match self.expire_ride(&ride).await {
                Ok(Some(cascaded)) => {
                    report.rides_cancelled += 1;
                    report.bookings_cancelled += cascaded;
                }
                Ok(None) => {}
                Err(e) => {
                    error!("Sweep: failed to expire ride {}: {}", ride.id, e);
                    report.failures += 1;
                }
            }
        }
    }

    /// Returns the number of pending bookings cancelled with the ride, or `None` if the ride was kept.
    async fn expire_ride(&self, candidate: &Ride) -> CoreResult<Option<usize>> {
        let ride = match self.listings.get_ride(candidate.id).await? {
            Some(ride) if ride.status == RideStatus::Active && !ride.is_recurring => ride,
            _ => return Ok(None),
        };

        let bookings = self.bookings.list_bookings_by_ride(ride.id).await?;
        if bookings.iter().any(|b| b.status == BookingStatus::Confirmed) {
            return Ok(None);
        }

        if self.listings.update_ride(ride.id, RidePatch::status(RideStatus::Cancelled)).await?.is_none() {
            debug!("Sweep: ride {} removed before it could expire", ride.id);
            return Ok(None);
        }
        info!("Ride {} expired unfilled", ride.id);

        let mut cascaded = 0;
        for booking in bookings.iter().filter(|b| b.status == BookingStatus::Pending) {
            self.bookings.update_booking(booking.id, BookingPatch::status(BookingStatus::Cancelled)).await?;
            cascaded += 1;
            self.notifier
                .emit(NotificationEvent::new(
                    booking.rider_id,
                    NotificationKind::BookingCancelled,
                    "Booking cancelled",
                    format!(
                        "The ride from {} to {} was cancelled before departure",
                        ride.from_location, ride.to_location
                    ),
                    Some(booking.id),
                ))
                .await;
        }

        self.notifier
            .emit(NotificationEvent::new(
                ride.driver_id,
                NotificationKind::RideCancelled,
                "Ride cancelled",
                format!(
                    "Your ride from {} to {} at {} had no confirmed passengers and was cancelled",
                    ride.from_location, ride.to_location, ride.departure_time
                ),
                Some(ride.id),
            ))
            .await;

        Ok(Some(cascaded))
    }

    // ==========================================
    // Ride requests
    // ==========================================

    async fn sweep_requests(&self, now: DateTime<Utc>, cutoff: DateTime<Utc>, report: &mut SweepReport) {
        let requests = match self.listings.list_active_requests().await {
            Ok(requests) => requests,
            Err(e) => {
                error!("Sweep: failed to list active ride requests: {}", e);
                report.failures += 1;
                return;
            }
        };

        for request in requests {
            if !self.resolver.departs_by(request.departure_date.as_deref(), &request.departure_time, now, cutoff) {
                continue;
            }

            match self.expire_request(&request).await {
                Ok(true) => report.requests_cancelled += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Sweep: failed to expire ride request {}: {}", request.id, e);
                    report.failures += 1;
                }
            }
        }
    }

    async fn expire_request(&self, candidate: &RideRequest) -> CoreResult<bool> {
        let request = match self.listings.get_request(candidate.id).await? {
            Some(request) if request.status == RequestStatus::Active => request,
            _ => return Ok(false),
        };

        self.listings
            .update_request(request.id, RideRequestPatch::status(RequestStatus::Cancelled))
            .await?;
        info!("Ride request {} expired unanswered", request.id);

        self.notifier
            .emit(NotificationEvent::new(
                request.rider_id,
                NotificationKind::RequestCancelled,
                "Ride request expired",
                format!(
                    "No driver took your request from {} to {} at {}",
                    request.from_location, request.to_location, request.departure_time
                ),
                Some(request.id),
            ))
            .await;

        Ok(true)
    }

    // ==========================================
    // Pending bookings
    // ==========================================

    async fn sweep_bookings(&self, now: DateTime<Utc>, cutoff: DateTime<Utc>, report: &mut SweepReport) {
        let pending = match self.bookings.list_bookings_by_status(BookingStatus::Pending).await {
            Ok(pending) => pending,
            Err(e) => {
                error!("Sweep: failed to list pending bookings: {}", e);
                report.failures += 1;
                return;
            }
        };

        for booking in pending {
            match self.expire_booking(&booking, now, cutoff).await {
                Ok(true) => report.bookings_cancelled += 1,
                Ok(false) => {}
                Err(e) => {
                    error!("Sweep: failed to expire booking {}: {}", booking.id, e);
                    report.failures += 1;
                }
            }
        }
    }

    async fn expire_booking(&self, candidate: &Booking, now: DateTime<Utc>, cutoff: DateTime<Utc>) -> CoreResult<bool> {
        let ride = match self.listings.get_ride(candidate.ride_id).await? {
            Some(ride) => ride,
            None => {
                warn!("Sweep: booking {} points at missing ride {}, skipping", candidate.id, candidate.ride_id);
                return Ok(false);
            }
        };

        // A date picked for a recurring ride wins over the ride's own date.
        let date = match candidate.selected_date.as_deref() {
            Some(picked) if ride.is_recurring => Some(picked),
            _ => ride.departure_date.as_deref(),
        };
        if !self.resolver.departs_by(date, &ride.departure_time, now, cutoff) {
            return Ok(false);
        }

        let booking = match self.bookings.get_booking(candidate.id).await? {
            Some(booking) if booking.status == BookingStatus::Pending => booking,
            _ => return Ok(false),
        };

        self.bookings.update_booking(booking.id, BookingPatch::status(BookingStatus::Cancelled)).await?;
        info!("Pending booking {} expired before departure", booking.id);

        for user_id in [booking.rider_id, booking.driver_id] {
            self.notifier
                .emit(NotificationEvent::new(
                    user_id,
                    NotificationKind::BookingCancelled,
                    "Booking expired",
                    format!(
                        "The booking from {} to {} was not confirmed in time",
                        ride.from_location, ride.to_location
                    ),
                    Some(booking.id),
                ))
                .await;
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::Harness;
    use async_trait::async_trait;
    use ridepool_core::booking::Notification;
    use ridepool_core::repository::RepoResult;
    use ridepool_core::RecurringData;
    use ridepool_store::MemoryStore;
    use uuid::Uuid;

    /// Listings that hand out a snapshot taken before other writers got in.
    struct StaleListings {
        inner: Arc<MemoryStore>,
        rides: Vec<Ride>,
        requests: Vec<RideRequest>,
        /// Rides disappear the moment the sweeper tries to update them.
        vanish_on_update: bool,
    }

    impl StaleListings {
        async fn snapshot(inner: Arc<MemoryStore>) -> Self {
            let rides = inner.list_active_rides().await.unwrap();
            let requests = inner.list_active_requests().await.unwrap();
            Self { inner, rides, requests, vanish_on_update: false }
        }
    }

    #[async_trait]
    impl ListingRepository for StaleListings {
        async fn create_ride(&self, ride: &Ride) -> RepoResult<()> {
            self.inner.create_ride(ride).await
        }

        async fn get_ride(&self, id: Uuid) -> RepoResult<Option<Ride>> {
            self.inner.get_ride(id).await
        }

        async fn list_active_rides(&self) -> RepoResult<Vec<Ride>> {
            Ok(self.rides.clone())
        }

        async fn list_rides_by_driver(&self, driver_id: Uuid) -> RepoResult<Vec<Ride>> {
            self.inner.list_rides_by_driver(driver_id).await
        }

        async fn update_ride(&self, id: Uuid, patch: RidePatch) -> RepoResult<Option<Ride>> {
            if self.vanish_on_update {
                self.inner.delete_ride(id).await?;
                return Ok(None);
            }
            self.inner.update_ride(id, patch).await
        }

        async fn delete_ride(&self, id: Uuid) -> RepoResult<bool> {
            self.inner.delete_ride(id).await
        }

        async fn create_request(&self, request: &RideRequest) -> RepoResult<()> {
            self.inner.create_request(request).await
        }

        async fn get_request(&self, id: Uuid) -> RepoResult<Option<RideRequest>> {
            self.inner.get_request(id).await
        }

        async fn list_active_requests(&self) -> RepoResult<Vec<RideRequest>> {
            Ok(self.requests.clone())
        }

        async fn list_requests_by_rider(&self, rider_id: Uuid) -> RepoResult<Vec<RideRequest>> {
            self.inner.list_requests_by_rider(rider_id).await
        }

        async fn update_request(&self, id: Uuid, patch: RideRequestPatch) -> RepoResult<Option<RideRequest>> {
            self.inner.update_request(id, patch).await
        }

        async fn delete_request(&self, id: Uuid) -> RepoResult<bool> {
            self.inner.delete_request(id).await
        }
    }

    /// Bookings whose pending list is a snapshot taken before other writers got in.
    struct StaleBookings {
        inner: Arc<MemoryStore>,
        pending: Vec<Booking>,
    }

    #[async_trait]
    impl BookingRepository for StaleBookings {
        async fn create_booking(&self, booking: &Booking) -> RepoResult<()> {
            self.inner.create_booking(booking).await
        }

        async fn get_booking(&self, id: Uuid) -> RepoResult<Option<Booking>> {
            self.inner.get_booking(id).await
        }

        async fn list_bookings_by_user(&self, user_id: Uuid) -> RepoResult<Vec<Booking>> {
            self.inner.list_bookings_by_user(user_id).await
        }

        async fn list_bookings_by_ride(&self, ride_id: Uuid) -> RepoResult<Vec<Booking>> {
            self.inner.list_bookings_by_ride(ride_id).await
        }

        async fn list_bookings_by_status(&self, _status: BookingStatus) -> RepoResult<Vec<Booking>> {
            Ok(self.pending.clone())
        }

        async fn update_booking(&self, id: Uuid, patch: BookingPatch) -> RepoResult<Option<Booking>> {
            self.inner.update_booking(id, patch).await
        }

        async fn create_notification(&self, notification: &Notification) -> RepoResult<()> {
            self.inner.create_notification(notification).await
        }

        async fn list_notifications(&self, user_id: Uuid) -> RepoResult<Vec<Notification>> {
            self.inner.list_notifications(user_id).await
        }

        async fn mark_notification_read(&self, id: Uuid) -> RepoResult<Option<Notification>> {
            self.inner.mark_notification_read(id).await
        }
    }

    fn sweeper_over(h: &Harness, listings: StaleListings, bookings: StaleBookings) -> ExpirySweeper {
        ExpirySweeper::new(
            Arc::new(listings),
            Arc::new(bookings),
            h.emitter.clone(),
            h.clock.clone(),
            DepartureResolver::utc(),
            SweeperSettings::default(),
        )
    }

    #[tokio::test]
    async fn test_unfilled_ride_expires() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let ride = h.seed_ride(driver, None, "09:10").await;

        let report = h.sweeper().run_cycle().await;

        assert_eq!(report.rides_cancelled, 1);
        let stored = h.store.get_ride(ride.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RideStatus::Cancelled);
        assert_eq!(h.emitter.count(driver, NotificationKind::RideCancelled), 1);
        assert_eq!(h.emitter.events().len(), 1);
    }

    #[tokio::test]
    async fn test_confirmed_booking_keeps_ride() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let ride = h.seed_ride(driver, Some("2026-10-18"), "09:10").await;
        let booking = Booking::new(ride.id, Uuid::new_v4(), driver, 1, 12, BookingStatus::Confirmed);
        h.store.create_booking(&booking).await.unwrap();

        let report = h.sweeper().run_cycle().await;

        assert!(report.is_idle());
        let stored = h.store.get_ride(ride.id).await.unwrap().unwrap();
        assert_eq!(stored.status, RideStatus::Active);
        assert!(h.emitter.events().is_empty());
    }

    #[tokio::test]
    async fn test_ride_expiry_cascades_to_pending_bookings() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let rider = Uuid::new_v4();
        let ride = h.seed_ride(driver, None, "09:05").await;
        let booking = Booking::new(ride.id, rider, driver, 1, 12, BookingStatus::Pending);
        h.store.create_booking(&booking).await.unwrap();

        let report = h.sweeper().run_cycle().await;

        assert_eq!(report, SweepReport { rides_cancelled: 1, bookings_cancelled: 1, ..Default::default() });
        let stored = h.store.get_booking(booking.id).await.unwrap().unwrap();
        assert_eq!(stored.status, BookingStatus::Cancelled);
        assert_eq!(h.emitter.count(rider, NotificationKind::BookingCancelled), 1);
        assert_eq!(h.emitter.count(driver, NotificationKind::RideCancelled), 1);
    }

    #[tokio::test]
    async fn test_second_cycle_is_idle() {
        let h = Harness::new();
        h.seed_ride(Uuid::new_v4(), None, "09:10").await;
        h.seed_request(Uuid::new_v4(), None, "09:00").await;
        let sweeper = h.sweeper();

        let first = sweeper.run_cycle().await;
        assert_eq!(first.rides_cancelled, 1);
        assert_eq!(first.requests_cancelled, 1);

        let second = sweeper.run_cycle().await;
        assert!(second.is_idle());
        assert_eq!(h.emitter.events().len(), 2);
    }

    #[tokio::test]
    async fn test_far_departures_and_recurring_rides_survive() {
        let h = Harness::new();
        let later = h.seed_ride(Uuid::new_v4(), None, "09:30").await;
        let tomorrow = h.seed_ride(Uuid::new_v4(), Some("2026-10-19"), "08:00").await;
        let mut recurring = Ride::new(Uuid::new_v4(), Harness::itinerary(None, "09:05"), 2, 5);
        recurring.is_recurring = true;
        recurring.recurring_data = Some(RecurringData { days: vec![chrono::Weekday::Sun], until: None });
        h.store.create_ride(&recurring).await.unwrap();

        let sweeper = h.sweeper();
        assert!(sweeper.run_cycle().await.is_idle());

        // Past its departure a plain ride goes; the recurring one never does.
        h.clock.advance(chrono::Duration::minutes(20));
        let report = sweeper.run_cycle().await;
        assert_eq!(report.rides_cancelled, 1);
        assert_eq!(h.store.get_ride(later.id).await.unwrap().unwrap().status, RideStatus::Cancelled);
        assert_eq!(h.store.get_ride(tomorrow.id).await.unwrap().unwrap().status, RideStatus::Active);
        assert_eq!(h.store.get_ride(recurring.id).await.unwrap().unwrap().status, RideStatus::Active);
    }

    #[tokio::test]
    async fn test_malformed_schedule_fails_open() {
        let h = Harness::new();
        let mut ride = Ride::new(Uuid::new_v4(), Harness::itinerary(None, "quarter past"), 2, 5);
        ride.departure_date = Some("tomorrow".to_string());
        h.store.create_ride(&ride).await.unwrap();

        let report = h.sweeper().run_cycle().await;

        assert!(report.is_idle());
        assert_eq!(h.store.get_ride(ride.id).await.unwrap().unwrap().status, RideStatus::Active);
    }

    #[tokio::test]
    async fn test_request_expiry_notifies_rider() {
        let h = Harness::new();
        let rider = Uuid::new_v4();
        let soon = h.seed_request(rider, Some("2026-10-18"), "09:14").await;
        let later = h.seed_request(rider, Some("2026-10-18"), "09:16").await;

        let report = h.sweeper().run_cycle().await;

        assert_eq!(report.requests_cancelled, 1);
        assert_eq!(h.store.get_request(soon.id).await.unwrap().unwrap().status, RequestStatus::Cancelled);
        assert_eq!(h.store.get_request(later.id).await.unwrap().unwrap().status, RequestStatus::Active);
        assert_eq!(h.emitter.count(rider, NotificationKind::RequestCancelled), 1);
    }

    #[tokio::test]
    async fn test_pending_bookings_use_selected_date() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let rider = Uuid::new_v4();
        let mut ride = Ride::new(driver, Harness::itinerary(None, "09:05"), 4, 5);
        ride.is_recurring = true;
        h.store.create_ride(&ride).await.unwrap();

        let today = Booking::new(ride.id, rider, driver, 1, 5, BookingStatus::Pending)
            .with_selected_date(Some("2026-10-18".to_string()));
        let next_week = Booking::new(ride.id, rider, driver, 1, 5, BookingStatus::Pending)
            .with_selected_date(Some("2026-10-25".to_string()));
        h.store.create_booking(&today).await.unwrap();
        h.store.create_booking(&next_week).await.unwrap();

        let report = h.sweeper().run_cycle().await;

        assert_eq!(report.bookings_cancelled, 1);
        assert_eq!(h.store.get_booking(today.id).await.unwrap().unwrap().status, BookingStatus::Cancelled);
        assert_eq!(h.store.get_booking(next_week.id).await.unwrap().unwrap().status, BookingStatus::Pending);
        assert_eq!(h.emitter.count(rider, NotificationKind::BookingCancelled), 1);
        assert_eq!(h.emitter.count(driver, NotificationKind::BookingCancelled), 1);
    }

    #[tokio::test]
    async fn test_records_changed_since_listing_are_left_alone() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let rider = Uuid::new_v4();
        let ride = h.seed_ride(driver, None, "09:10").await;
        let request = h.seed_request(rider, None, "09:00").await;
        let mut recurring = Ride::new(driver, Harness::itinerary(None, "09:05"), 2, 5);
        recurring.is_recurring = true;
        h.store.create_ride(&recurring).await.unwrap();
        let booking = Booking::new(recurring.id, rider, driver, 1, 5, BookingStatus::Pending);
        h.store.create_booking(&booking).await.unwrap();

        let listings = StaleListings::snapshot(h.store.clone()).await;
        let bookings = StaleBookings {
            inner: h.store.clone(),
            pending: h.store.list_bookings_by_status(BookingStatus::Pending).await.unwrap(),
        };

        // Everything moves on after the sweeper listed it.
        h.store.update_ride(ride.id, RidePatch::status(RideStatus::Completed)).await.unwrap();
        h.store.update_request(request.id, RideRequestPatch::status(RequestStatus::Matched)).await.unwrap();
        h.store.update_booking(booking.id, BookingPatch::status(BookingStatus::Confirmed)).await.unwrap();

        let report = sweeper_over(&h, listings, bookings).run_cycle().await;

        assert!(report.is_idle());
        assert!(h.emitter.events().is_empty());
        assert_eq!(h.store.get_ride(ride.id).await.unwrap().unwrap().status, RideStatus::Completed);
        assert_eq!(h.store.get_request(request.id).await.unwrap().unwrap().status, RequestStatus::Matched);
        assert_eq!(h.store.get_booking(booking.id).await.unwrap().unwrap().status, BookingStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_ride_deleted_during_expiry_is_not_reported() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let ride = h.seed_ride(driver, None, "09:10").await;
        let booking = Booking::new(ride.id, Uuid::new_v4(), driver, 1, 12, BookingStatus::Pending);
        h.store.create_booking(&booking).await.unwrap();

        let mut listings = StaleListings::snapshot(h.store.clone()).await;
        listings.vanish_on_update = true;
        let bookings = StaleBookings { inner: h.store.clone(), pending: Vec::new() };

        let report = sweeper_over(&h, listings, bookings).run_cycle().await;

        assert_eq!(report.rides_cancelled, 0);
        assert_eq!(report.bookings_cancelled, 0);
        assert!(h.store.get_ride(ride.id).await.unwrap().is_none());
        assert_eq!(h.emitter.count(driver, NotificationKind::RideCancelled), 0);
        assert!(h.emitter.events().is_empty());
    }

    #[tokio::test]
    async fn test_picked_date_ignored_on_one_off_ride() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let rider = Uuid::new_v4();
        let ride = h.seed_ride(driver, None, "09:30").await;
        let confirmed = Booking::new(ride.id, Uuid::new_v4(), driver, 1, 12, BookingStatus::Confirmed);
        let stray = Booking::new(ride.id, rider, driver, 1, 12, BookingStatus::Pending)
            .with_selected_date(Some("2030-01-01".to_string()));
        h.store.create_booking(&confirmed).await.unwrap();
        h.store.create_booking(&stray).await.unwrap();

        h.clock.advance(chrono::Duration::hours(3));
        let report = h.sweeper().run_cycle().await;

        // The confirmed booking keeps the ride; the pending one goes by the ride's own date.
        assert_eq!(report, SweepReport { bookings_cancelled: 1, ..Default::default() });
        assert_eq!(h.store.get_ride(ride.id).await.unwrap().unwrap().status, RideStatus::Active);
        assert_eq!(h.store.get_booking(stray.id).await.unwrap().unwrap().status, BookingStatus::Cancelled);
        assert_eq!(h.emitter.count(rider, NotificationKind::BookingCancelled), 1);
    }

    #[tokio::test]
    async fn test_booking_without_ride_is_skipped() {
        let h = Harness::new();
        let orphan = Booking::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), 1, 5, BookingStatus::Pending);
        h.store.create_booking(&orphan).await.unwrap();

        let report = h.sweeper().run_cycle().await;

        assert!(report.is_idle());
        assert_eq!(h.store.get_booking(orphan.id).await.unwrap().unwrap().status, BookingStatus::Pending);
    }

    #[tokio::test(start_paused = true)]
    async fn test_started_sweeper_ticks_until_stopped() {
        let h = Harness::new();
        let driver = Uuid::new_v4();
        let first = h.seed_ride(driver, None, "09:10").await;
        let second = h.seed_ride(driver, None, "09:25").await;

        let handle = Arc::new(h.sweeper()).start();

        // The first tick fires right away.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(h.store.get_ride(first.id).await.unwrap().unwrap().status, RideStatus::Cancelled);
        assert_eq!(h.store.get_ride(second.id).await.unwrap().unwrap().status, RideStatus::Active);

        h.clock.advance(chrono::Duration::minutes(10));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(h.store.get_ride(second.id).await.unwrap().unwrap().status, RideStatus::Cancelled);

        handle.stop().await;

        let third = h.seed_ride(driver, None, "09:20").await;
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(h.store.get_ride(third.id).await.unwrap().unwrap().status, RideStatus::Active);
        assert_eq!(h.emitter.count(driver, NotificationKind::RideCancelled), 2);
    }
}
