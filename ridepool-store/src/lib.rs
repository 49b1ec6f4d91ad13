pub mod app_config;
pub mod booking_repo;
pub mod database;
pub mod events;
pub mod listing_repo;
pub mod memory;

pub use booking_repo::StoreBookingRepository;
pub use database::DbClient;
pub use events::StoreNotifier;
pub use listing_repo::StoreListingRepository;
pub use memory::MemoryStore;
