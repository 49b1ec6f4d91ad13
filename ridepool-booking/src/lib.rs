pub mod expiry;
pub mod listings;
pub mod negotiator;

#[cfg(test)]
pub(crate) mod test_support;

pub use expiry::{ExpirySweeper, SweepReport, SweeperHandle, SweeperSettings};
pub use listings::{ListingService, NewRide, NewRideRequest};
pub use negotiator::{
    BookingNegotiator, BookingRequest, CreateBookingInput, DeclinedCounterOffer, NegotiatedBooking, RideAvailability,
};
