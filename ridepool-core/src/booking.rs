use chrono::{DateTime, Utc};
use ridepool_shared::{NotificationEvent, NotificationKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{CoreError, CoreResult};

status_enum! {
    /// Booking status in the negotiation lifecycle
    BookingStatus {
        Pending => "pending",
        Confirmed => "confirmed",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

impl BookingStatus {
    /// Whether `next` is reachable from this status in a single step.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        matches!(
            (self, next),
            (BookingStatus::Pending, BookingStatus::Confirmed)
                | (BookingStatus::Pending, BookingStatus::Cancelled)
                | (BookingStatus::Confirmed, BookingStatus::Completed)
                | (BookingStatus::Confirmed, BookingStatus::Cancelled)
        )
    }

    /// Validate a "set to `next`" request. Re-applying the current status is allowed.
    pub fn transition(&self, next: BookingStatus) -> CoreResult<BookingStatus> {
        if *self == next || self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::ValidationError(format!(
                "Invalid booking transition from {} to {}",
                self, next
            )))
        }
    }
}

/// How the party creating a booking meant it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OfferKind {
    #[default]
    Direct,
    #[serde(alias = "counterOffer")]
    CounterOffer,
}

impl OfferKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferKind::Direct => "direct",
            OfferKind::CounterOffer => "counter_offer",
        }
    }

    pub fn is_counter_offer(&self) -> bool {
        *self == OfferKind::CounterOffer
    }
}

impl std::str::FromStr for OfferKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(OfferKind::Direct),
            "counter_offer" => Ok(OfferKind::CounterOffer),
            other => Err(CoreError::ValidationError(format!("unrecognized OfferKind value: {}", other))),
        }
    }
}

/// A seat reservation, always anchored to a concrete Ride
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub ride_id: Uuid,
    pub rider_id: Uuid,
    pub driver_id: Uuid,
    pub seats_booked: i32,
    pub total_cost: i32,
    pub message: Option<String>,
    pub offer_kind: OfferKind,
    /// Concrete travel date picked when booking a recurring ride.
    pub selected_date: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        ride_id: Uuid,
        rider_id: Uuid,
        driver_id: Uuid,
        seats_booked: i32,
        total_cost: i32,
        status: BookingStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            ride_id,
            rider_id,
            driver_id,
            seats_booked,
            total_cost,
            message: None,
            offer_kind: OfferKind::Direct,
            selected_date: None,
            status,
            created_at: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: Option<String>) -> Self {
        self.message = message;
        self
    }

    pub fn with_offer_kind(mut self, offer_kind: OfferKind) -> Self {
        self.offer_kind = offer_kind;
        self
    }

    pub fn with_selected_date(mut self, selected_date: Option<String>) -> Self {
        self.selected_date = selected_date;
        self
    }

    pub fn involves(&self, user_id: Uuid) -> bool {
        self.rider_id == user_id || self.driver_id == user_id
    }

    /// The party on the other side of the booking from `user_id`.
    pub fn counterparty(&self, user_id: Uuid) -> Uuid {
        if self.rider_id == user_id {
            self.driver_id
        } else {
            self.rider_id
        }
    }

    /// Whether the booking still holds seats on its ride.
    pub fn holds_seats(&self) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct BookingPatch {
    pub status: Option<BookingStatus>,
}

impl BookingPatch {
    pub fn status(status: BookingStatus) -> Self {
        Self { status: Some(status) }
    }

    pub fn apply(&self, booking: &mut Booking) {
        if let Some(status) = self.status {
            booking.status = status;
        }
    }
}

/// A stored notification for a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl From<NotificationEvent> for Notification {
    fn from(event: NotificationEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: event.user_id,
            kind: event.kind,
            title: event.title,
            message: event.message,
            related_id: event.related_id,
            is_read: false,
            created_at: DateTime::from_timestamp(event.timestamp, 0).unwrap_or_else(Utc::now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_state_machine() {
        use BookingStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Cancelled.can_transition_to(Confirmed));
        assert!(!Completed.can_transition_to(Cancelled));
    }

    #[test]
    fn test_transition_is_idempotent() {
        assert_eq!(BookingStatus::Cancelled.transition(BookingStatus::Cancelled).unwrap(), BookingStatus::Cancelled);
        assert!(matches!(
            BookingStatus::Cancelled.transition(BookingStatus::Confirmed),
            Err(CoreError::ValidationError(_))
        ));
    }

    #[test]
    fn test_offer_kind_accepts_both_spellings() {
        let kind: OfferKind = serde_json::from_value(serde_json::json!("counterOffer")).unwrap();
        assert_eq!(kind, OfferKind::CounterOffer);
        let kind: OfferKind = serde_json::from_value(serde_json::json!("counter_offer")).unwrap();
        assert!(kind.is_counter_offer());
        assert_eq!(OfferKind::default(), OfferKind::Direct);
    }

    #[test]
    fn test_counterparty() {
        let rider = Uuid::new_v4();
        let driver = Uuid::new_v4();
        let booking = Booking::new(Uuid::new_v4(), rider, driver, 1, 10, BookingStatus::Pending);

        assert_eq!(booking.counterparty(rider), driver);
        assert_eq!(booking.counterparty(driver), rider);
        assert!(booking.involves(driver));
        assert!(!booking.involves(Uuid::new_v4()));
    }
}
