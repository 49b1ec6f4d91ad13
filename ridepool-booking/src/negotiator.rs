use ridepool_core::booking::{Booking, BookingPatch, BookingStatus, OfferKind};
use ridepool_core::codes::{generate_ride_code, is_counter_offer_code, RideOrigin};
use ridepool_core::listing::{Itinerary, RequestStatus, Ride, RidePatch, RideRequest, RideRequestPatch};
use ridepool_core::repository::{BookingRepository, ListingRepository, NotificationEmitter};
use ridepool_core::schedule::{self, DepartureResolver};
use ridepool_core::{Clock, CoreError, CoreResult};
use ridepool_shared::{NotificationEvent, NotificationKind};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Raw body of `POST /bookings`. Which fields are present decides the shape.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateBookingInput {
    pub ride_request_id: Option<Uuid>,
    pub ride_id: Option<Uuid>,
    pub rider_id: Option<Uuid>,
    pub original_booking_id: Option<Uuid>,
    pub price: Option<i32>,
    pub seats_booked: Option<i32>,
    pub total_cost: Option<i32>,
    pub message: Option<String>,
    #[serde(default)]
    pub offer_kind: OfferKind,
    pub selected_date: Option<String>,
}

/// The three ways a booking can come into existence.
#[derive(Debug, Clone)]
pub enum BookingRequest {
    /// A driver answers a rider's ride request, outright or with a counter-offer.
    FromRideRequest {
        ride_request_id: Uuid,
        price: Option<i32>,
        total_cost: Option<i32>,
        message: Option<String>,
        offer_kind: OfferKind,
    },
    /// A driver answers an existing booking with a new price.
    CounterOffer {
        rider_id: Uuid,
        original_booking_id: Uuid,
        price: Option<i32>,
        total_cost: Option<i32>,
        message: Option<String>,
    },
    /// A rider books seats on a published ride.
    DirectRide {
        ride_id: Uuid,
        seats_booked: Option<i32>,
        total_cost: Option<i32>,
        message: Option<String>,
        selected_date: Option<String>,
    },
}

impl TryFrom<CreateBookingInput> for BookingRequest {
    type Error = CoreError;

    fn try_from(input: CreateBookingInput) -> Result<Self, Self::Error> {
        match (input.ride_request_id, input.ride_id) {
            (Some(_), Some(_)) => Err(CoreError::ValidationError(
                "Provide either ride_request_id or ride_id, not both".to_string(),
            )),
            (Some(ride_request_id), None) => Ok(BookingRequest::FromRideRequest {
                ride_request_id,
                price: input.price,
                total_cost: input.total_cost,
                message: input.message,
                offer_kind: input.offer_kind,
            }),
            (None, Some(_)) if input.offer_kind.is_counter_offer() => Err(CoreError::ValidationError(
                "Counter-offers answer a ride request or an existing booking, not a published ride".to_string(),
            )),
            (None, Some(ride_id)) => Ok(BookingRequest::DirectRide {
                ride_id,
                seats_booked: input.seats_booked,
                total_cost: input.total_cost,
                message: input.message,
                selected_date: input.selected_date,
            }),
            (None, None) => match (input.rider_id, input.original_booking_id, input.offer_kind) {
                (Some(rider_id), Some(original_booking_id), OfferKind::CounterOffer) => {
                    Ok(BookingRequest::CounterOffer {
                        rider_id,
                        original_booking_id,
                        price: input.price,
                        total_cost: input.total_cost,
                        message: input.message,
                    })
                }
                _ => Err(CoreError::ValidationError(
                    "Booking needs ride_request_id, ride_id, or a counter-offer on an existing booking".to_string(),
                )),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NegotiatedBooking {
    pub booking: Booking,
    pub ride: Ride,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeclinedCounterOffer {
    pub booking: Booking,
    /// The ride request reopened on the rider's behalf.
    pub request: RideRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct RideAvailability {
    pub ride: Ride,
    pub bookings: Vec<Booking>,
    pub seats_remaining: i32,
}

fn total_cost(total_cost: Option<i32>, price: i32, seats: i32) -> CoreResult<i32> {
    match total_cost {
        Some(total) if total < 0 => Err(CoreError::ValidationError("Total cost cannot be negative".to_string())),
        Some(total) => Ok(total),
        None => price
            .checked_mul(seats)
            .ok_or_else(|| CoreError::ValidationError("Total cost is out of range".to_string())),
    }
}

fn required_price(price: Option<i32>) -> CoreResult<i32> {
    match price {
        Some(p) if p >= 0 => Ok(p),
        Some(_) => Err(CoreError::ValidationError("Price cannot be negative".to_string())),
        None => Err(CoreError::ValidationError("Price is required".to_string())),
    }
}

/// Turns offers from drivers and riders into bookings and drives their lifecycle
pub struct BookingNegotiator {
    listings: Arc<dyn ListingRepository>,
    bookings: Arc<dyn BookingRepository>,
    notifier: Arc<dyn NotificationEmitter>,
    clock: Arc<dyn Clock>,
    resolver: DepartureResolver,
}

impl BookingNegotiator {
    pub fn new(
        listings: Arc<dyn ListingRepository>,
        bookings: Arc<dyn BookingRepository>,
        notifier: Arc<dyn NotificationEmitter>,
        clock: Arc<dyn Clock>,
        resolver: DepartureResolver,
    ) -> Self {
        Self { listings, bookings, notifier, clock, resolver }
    }

    fn ride_code(&self, origin: RideOrigin) -> String {
        generate_ride_code(origin, self.resolver.today(self.clock.now()))
    }

    async fn load_ride(&self, ride_id: Uuid) -> CoreResult<Ride> {
        self.listings
            .get_ride(ride_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride {}", ride_id)))
    }

    async fn load_booking(&self, booking_id: Uuid) -> CoreResult<Booking> {
        self.bookings
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))
    }

    /// Active requests of `rider_id` describing exactly `itinerary`.
    async fn open_requests_for(&self, rider_id: Uuid, itinerary: &Itinerary) -> CoreResult<Vec<RideRequest>> {
        let requests = self.listings.list_requests_by_rider(rider_id).await?;
        Ok(requests
            .into_iter()
            .filter(|r| r.status == RequestStatus::Active && r.itinerary() == *itinerary)
            .collect())
    }

    pub async fn create_booking(&self, caller: Uuid, input: CreateBookingInput) -> CoreResult<NegotiatedBooking> {
        match BookingRequest::try_from(input)? {
            BookingRequest::FromRideRequest { ride_request_id, price, total_cost, message, offer_kind } => {
                self.answer_ride_request(caller, ride_request_id, price, total_cost, message, offer_kind)
                    .await
            }
            BookingRequest::CounterOffer { rider_id, original_booking_id, price, total_cost, message } => {
                self.counter_existing_booking(caller, rider_id, original_booking_id, price, total_cost, message)
                    .await
            }
            BookingRequest::DirectRide { ride_id, seats_booked, total_cost, message, selected_date } => {
                self.book_ride(caller, ride_id, seats_booked, total_cost, message, selected_date)
                    .await
            }
        }
    }

    async fn answer_ride_request(
        &self,
        driver_id: Uuid,
        ride_request_id: Uuid,
        price: Option<i32>,
        total_cost_input: Option<i32>,
        message: Option<String>,
        offer_kind: OfferKind,
    ) -> CoreResult<NegotiatedBooking> {
        // 1. Resolve the request being answered
        let request = self
            .listings
            .get_request(ride_request_id)
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Ride request {}", ride_request_id)))?;
        if request.status != RequestStatus::Active {
            return Err(CoreError::ValidationError(format!(
                "Ride request {} is {}",
                request.id, request.status
            )));
        }
        let price = required_price(price)?;
        let total = total_cost(total_cost_input, price, request.passengers)?;

        if request.rider_id == driver_id {
            warn!("User {} is answering their own ride request {}", driver_id, request.id);
        }

        // 2. Materialize a ride for the driver
        let counter = offer_kind.is_counter_offer();
        let origin = if counter { RideOrigin::CounterOffer } else { RideOrigin::DirectConfirmation };
        let mut ride = Ride::new(driver_id, request.itinerary(), request.passengers, price);
        ride.external_ride_code = Some(self.ride_code(origin));
        ride.requested_by = Some(request.rider_id);
        self.listings.create_ride(&ride).await?;
        info!(
            "Ride {} materialized from request {} ({})",
            ride.id,
            request.id,
            ride.external_ride_code.as_deref().unwrap_or_default()
        );

        // 3. A direct confirmation consumes the request; a counter-offer leaves it open
        if !counter {
            self.listings.delete_request(request.id).await?;
        }

        // 4. Book the rider onto the new ride
        let status = if counter { BookingStatus::Pending } else { BookingStatus::Confirmed };
        let booking = Booking::new(ride.id, request.rider_id, driver_id, request.passengers, total, status)
            .with_message(message)
            .with_offer_kind(offer_kind);
        self.bookings.create_booking(&booking).await?;
        info!("Booking created: {} ({}) on ride {}", booking.id, booking.status, ride.id);

        // 5. Tell the rider
        let event = if counter {
            NotificationEvent::new(
                booking.rider_id,
                NotificationKind::CounterOffer,
                "New counter-offer",
                format!(
                    "A driver offered {} to {} for {} per seat",
                    ride.from_location, ride.to_location, ride.price
                ),
                Some(booking.id),
            )
        } else {
            NotificationEvent::new(
                booking.rider_id,
                NotificationKind::BookingConfirmed,
                "Ride request accepted",
                format!("A driver accepted your request from {} to {}", ride.from_location, ride.to_location),
                Some(booking.id),
            )
        };
        self.notifier.emit(event).await;

        Ok(NegotiatedBooking { booking, ride })
    }

    async fn counter_existing_booking(
        &self,
        driver_id: Uuid,
        rider_id: Uuid,
        original_booking_id: Uuid,
        price: Option<i32>,
        total_cost_input: Option<i32>,
        message: Option<String>,
    ) -> CoreResult<NegotiatedBooking> {
        let original = self.load_booking(original_booking_id).await?;
        if original.driver_id != driver_id {
            return Err(CoreError::Forbidden("Only the driver of the original booking can counter it".to_string()));
        }
        if original.rider_id != rider_id {
            return Err(CoreError::ValidationError(format!(
                "Rider {} is not the rider of booking {}",
                rider_id, original.id
            )));
        }
        let original_ride = self.load_ride(original.ride_id).await?;

        let price = match price {
            Some(_) => required_price(price)?,
            None => original_ride.price,
        };
        let seats = original.seats_booked;
        let total = total_cost(total_cost_input, price, seats)?;

        let mut ride = Ride::new(driver_id, original_ride.itinerary(), seats, price);
        ride.external_ride_code = Some(self.ride_code(RideOrigin::CounterOffer));
        ride.requested_by = Some(rider_id);
        self.listings.create_ride(&ride).await?;

        let booking = Booking::new(ride.id, rider_id, driver_id, seats, total, BookingStatus::Pending)
            .with_message(message)
            .with_offer_kind(OfferKind::CounterOffer);
        self.bookings.create_booking(&booking).await?;
        info!("Counter-offer {} on booking {} created", booking.id, original.id);

        self.notifier
            .emit(NotificationEvent::new(
                rider_id,
                NotificationKind::CounterOffer,
                "New counter-offer",
                format!(
                    "A driver countered with {} per seat from {} to {}",
                    price, ride.from_location, ride.to_location
                ),
                Some(booking.id),
            ))
            .await;

        Ok(NegotiatedBooking { booking, ride })
    }

    async fn book_ride(
        &self,
        rider_id: Uuid,
        ride_id: Uuid,
        seats_booked: Option<i32>,
        total_cost_input: Option<i32>,
        message: Option<String>,
        selected_date: Option<String>,
    ) -> CoreResult<NegotiatedBooking> {
        let mut ride = self.load_ride(ride_id).await?;
        if !ride.is_active() {
            return Err(CoreError::ValidationError(format!("Ride {} is {}", ride.id, ride.status)));
        }

        let seats = seats_booked.unwrap_or(1);
        if seats < 1 {
            return Err(CoreError::ValidationError("Seats booked must be positive".to_string()));
        }
        if seats > ride.available_seats {
            return Err(CoreError::ValidationError(format!(
                "Ride {} only offers {} seats",
                ride.id, ride.available_seats
            )));
        }
        let selected_date = selected_date.filter(|d| !d.trim().is_empty());
        if let Some(raw) = selected_date.as_deref() {
            let date = schedule::parse_date(raw).map_err(|e| CoreError::ValidationError(e.to_string()))?;
            if !ride.runs_on(date) {
                return Err(CoreError::ValidationError(format!("Ride {} does not run on {}", ride.id, raw)));
            }
        }
        let total = total_cost(total_cost_input, ride.price, seats)?;

        if ride.driver_id == rider_id {
            warn!("User {} is booking their own ride {}", rider_id, ride.id);
        }

        // Recurring rides get their code on first booking; later bookings share it.
        if ride.is_recurring && ride.external_ride_code.is_none() {
            let code = self.ride_code(RideOrigin::RecurringBooking);
            ride = self
                .listings
                .update_ride(ride.id, RidePatch::external_ride_code(code))
                .await?
                .ok_or_else(|| CoreError::NotFound(format!("Ride {}", ride_id)))?;
        }

        let booking = Booking::new(ride.id, rider_id, ride.driver_id, seats, total, BookingStatus::Pending)
            .with_message(message)
            .with_selected_date(selected_date);
        self.bookings.create_booking(&booking).await?;
        info!("Booking created: {} ({} seats) on ride {}", booking.id, seats, ride.id);

        self.notifier
            .emit(NotificationEvent::new(
                ride.driver_id,
                NotificationKind::BookingRequest,
                "New booking request",
                format!(
                    "{} seat(s) requested from {} to {}",
                    seats, ride.from_location, ride.to_location
                ),
                Some(booking.id),
            ))
            .await;

        Ok(NegotiatedBooking { booking, ride })
    }

    /// Move a booking along its status machine on behalf of one of its parties.
    pub async fn update_status(&self, caller: Uuid, booking_id: Uuid, status: BookingStatus) -> CoreResult<Booking> {
        let booking = self.load_booking(booking_id).await?;
        if !booking.involves(caller) {
            return Err(CoreError::Forbidden("Not a party to this booking".to_string()));
        }

        let next = booking.status.transition(status)?;
        if next == booking.status {
            return Ok(booking);
        }

        let updated = self
            .bookings
            .update_booking(booking.id, BookingPatch::status(next))
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))?;
        info!("Booking {} moved from {} to {}", booking.id, booking.status, next);

        if updated.offer_kind.is_counter_offer() && next == BookingStatus::Confirmed {
            if let Some(ride) = self.listings.get_ride(updated.ride_id).await? {
                for request in self.open_requests_for(updated.rider_id, &ride.itinerary()).await? {
                    self.listings
                        .update_request(request.id, RideRequestPatch::status(RequestStatus::Matched))
                        .await?;
                    info!("Ride request {} matched by counter-offer {}", request.id, updated.id);
                }
            }
        }

        self.notifier
            .emit(NotificationEvent::new(
                updated.counterparty(caller),
                NotificationKind::BookingUpdated,
                "Booking updated",
                format!("Your booking is now {}", next),
                Some(updated.id),
            ))
            .await;

        Ok(updated)
    }

    /// Reject a counter-offer: the synthetic ride goes away and the rider's request is reopened.
    pub async fn decline_counter_offer(&self, caller: Uuid, booking_id: Uuid) -> CoreResult<DeclinedCounterOffer> {
        let booking = self.load_booking(booking_id).await?;
        if !booking.involves(caller) {
            return Err(CoreError::Forbidden("Not a party to this booking".to_string()));
        }
        let ride = self.load_ride(booking.ride_id).await?;
        if !is_counter_offer_code(ride.external_ride_code.as_deref()) {
            return Err(CoreError::ValidationError(format!("Booking {} is not a counter-offer", booking.id)));
        }
        if booking.status != BookingStatus::Pending {
            return Err(CoreError::ValidationError(format!(
                "Only pending counter-offers can be declined, booking is {}",
                booking.status
            )));
        }

        // 1. Cancel the booking and drop the synthetic ride
        let booking = self
            .bookings
            .update_booking(booking.id, BookingPatch::status(BookingStatus::Cancelled))
            .await?
            .ok_or_else(|| CoreError::NotFound(format!("Booking {}", booking_id)))?;
        self.listings.delete_ride(ride.id).await?;

        // 2. Retire requests the new one replaces
        let itinerary = ride.itinerary();
        let superseded = self.open_requests_for(booking.rider_id, &itinerary).await?;
        let max_price = superseded.iter().find_map(|r| r.max_price);
        for request in &superseded {
            self.listings
                .update_request(request.id, RideRequestPatch::status(RequestStatus::Cancelled))
                .await?;
        }

        // 3. Reopen the route for the rider
        let request = RideRequest::new(booking.rider_id, itinerary, ride.available_seats, max_price);
        self.listings.create_request(&request).await?;
        info!(
            "Counter-offer {} declined, ride {} removed, request {} reopened",
            booking.id, ride.id, request.id
        );

        self.notifier
            .emit(NotificationEvent::new(
                booking.counterparty(caller),
                NotificationKind::CounterOfferDeclined,
                "Counter-offer declined",
                format!("The counter-offer from {} to {} was declined", ride.from_location, ride.to_location),
                Some(booking.id),
            ))
            .await;

        Ok(DeclinedCounterOffer { booking, request })
    }

    pub async fn ride_availability(&self, ride_id: Uuid) -> CoreResult<RideAvailability> {
        let ride = self.load_ride(ride_id).await?;
        let bookings = self.bookings.list_bookings_by_ride(ride_id).await?;
        let held: i32 = bookings.iter().filter(|b| b.holds_seats()).map(|b| b.seats_booked).sum();
        let seats_remaining = (ride.available_seats - held).max(0);
        Ok(RideAvailability { ride, bookings, seats_remaining })
    }

    pub async fn bookings_for(&self, user_id: Uuid) -> CoreResult<Vec<Booking>> {
        Ok(self.bookings.list_bookings_by_user(user_id).await?)
    }
}
