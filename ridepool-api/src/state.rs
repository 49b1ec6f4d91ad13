use std::sync::Arc;
use ridepool_booking::{BookingNegotiator, ListingService};
use ridepool_core::repository::{BookingRepository, ListingRepository, NotificationEmitter};
use ridepool_core::schedule::DepartureResolver;
use ridepool_core::Clock;
use ridepool_store::{DbClient, MemoryStore, StoreBookingRepository, StoreListingRepository, StoreNotifier};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub expiration: u64,
}

/// Storage backends shared by the HTTP handlers and the sweeper.
#[derive(Clone)]
pub struct Repositories {
    pub listings: Arc<dyn ListingRepository>,
    pub bookings: Arc<dyn BookingRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            listings: store.clone() as Arc<dyn ListingRepository>,
            bookings: store as Arc<dyn BookingRepository>,
        }
    }

    pub fn postgres(db: &DbClient) -> Self {
        Self {
            listings: Arc::new(StoreListingRepository::new(db.pool.clone())),
            bookings: Arc::new(StoreBookingRepository::new(db.pool.clone())),
        }
    }

    /// Notifications land in the same store as bookings.
    pub fn notifier(&self) -> Arc<dyn NotificationEmitter> {
        Arc::new(StoreNotifier::new(self.bookings.clone()))
    }
}

#[derive(Clone)]
pub struct AppState {
    pub listings: Arc<ListingService>,
    pub negotiator: Arc<BookingNegotiator>,
    /// Direct access for the notification inbox routes.
    pub inbox: Arc<dyn BookingRepository>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        repos: &Repositories,
        notifier: Arc<dyn NotificationEmitter>,
        clock: Arc<dyn Clock>,
        resolver: DepartureResolver,
        auth: AuthConfig,
    ) -> Self {
        let listings = ListingService::new(repos.listings.clone(), repos.bookings.clone(), notifier.clone());
        let negotiator = BookingNegotiator::new(
            repos.listings.clone(),
            repos.bookings.clone(),
            notifier,
            clock,
            resolver,
        );

        Self {
            listings: Arc::new(listings),
            negotiator: Arc::new(negotiator),
            inbox: repos.bookings.clone(),
            auth,
        }
    }
}
