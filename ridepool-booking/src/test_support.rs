use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ridepool_core::listing::{Itinerary, Ride, RideRequest};
use ridepool_core::repository::{ListingRepository, NotificationEmitter};
use ridepool_core::schedule::DepartureResolver;
use ridepool_core::ManualClock;
use ridepool_shared::{NotificationEvent, NotificationKind};
use ridepool_store::MemoryStore;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::expiry::{ExpirySweeper, SweeperSettings};
use crate::listings::ListingService;
use crate::negotiator::BookingNegotiator;

/// Emitter that remembers everything it was asked to send.
#[derive(Default)]
pub struct RecordingEmitter {
    events: Mutex<Vec<NotificationEvent>>,
}

impl RecordingEmitter {
    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, user_id: Uuid, kind: NotificationKind) -> usize {
        self.events().iter().filter(|e| e.user_id == user_id && e.kind == kind).count()
    }
}

#[async_trait]
impl NotificationEmitter for RecordingEmitter {
    async fn emit(&self, event: NotificationEvent) {
        self.events.lock().unwrap().push(event);
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub emitter: Arc<RecordingEmitter>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            emitter: Arc::new(RecordingEmitter::default()),
            clock: Arc::new(ManualClock::new(Self::start())),
        }
    }

    /// 2026-10-18 09:00 UTC
    pub fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()
    }

    pub fn negotiator(&self) -> BookingNegotiator {
        BookingNegotiator::new(
            self.store.clone(),
            self.store.clone(),
            self.emitter.clone(),
            self.clock.clone(),
            DepartureResolver::utc(),
        )
    }

    pub fn listings(&self) -> ListingService {
        ListingService::new(self.store.clone(), self.store.clone(), self.emitter.clone())
    }

    pub fn sweeper(&self) -> ExpirySweeper {
        ExpirySweeper::new(
            self.store.clone(),
            self.store.clone(),
            self.emitter.clone(),
            self.clock.clone(),
            DepartureResolver::utc(),
            SweeperSettings::default(),
        )
    }

    pub fn itinerary(date: Option<&str>, time: &str) -> Itinerary {
        Itinerary {
            from_location: "Manchester".to_string(),
            to_location: "Liverpool".to_string(),
            departure_date: date.map(str::to_string),
            departure_time: time.to_string(),
        }
    }

    pub async fn seed_ride(&self, driver_id: Uuid, date: Option<&str>, time: &str) -> Ride {
        let ride = Ride::new(driver_id, Self::itinerary(date, time), 3, 12);
        self.store.create_ride(&ride).await.unwrap();
        ride
    }

    pub async fn seed_request(&self, rider_id: Uuid, date: Option<&str>, time: &str) -> RideRequest {
        let request = RideRequest::new(rider_id, Self::itinerary(date, time), 2, Some(25));
        self.store.create_request(&request).await.unwrap();
        request
    }
}
