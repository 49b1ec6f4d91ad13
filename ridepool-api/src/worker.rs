use std::sync::Arc;
use ridepool_booking::{ExpirySweeper, SweeperHandle, SweeperSettings};
use ridepool_core::repository::NotificationEmitter;
use ridepool_core::schedule::DepartureResolver;
use ridepool_core::Clock;
use ridepool_store::app_config::SweeperConfig;
use tracing::info;

use crate::state::Repositories;

/// Start the expiry sweeper in the background unless it is switched off.
pub fn start_expiry_worker(
    config: &SweeperConfig,
    repos: &Repositories,
    notifier: Arc<dyn NotificationEmitter>,
    clock: Arc<dyn Clock>,
    resolver: DepartureResolver,
) -> Option<SweeperHandle> {
    if !config.enabled {
        info!("Expiry sweeper disabled by configuration");
        return None;
    }

    let settings = SweeperSettings::new(config.interval_seconds, config.cutoff_minutes);
    info!(
        "Expiry sweeper: every {}s, cutoff {} min, departures at UTC{}",
        settings.interval.as_secs(),
        config.cutoff_minutes,
        resolver.offset()
    );

    let sweeper = ExpirySweeper::new(
        repos.listings.clone(),
        repos.bookings.clone(),
        notifier,
        clock,
        resolver,
        settings,
    );

    Some(Arc::new(sweeper).start())
}
