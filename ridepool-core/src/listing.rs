use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

status_enum! {
    /// Ride status in the lifecycle
    RideStatus {
        Active => "active",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

status_enum! {
    /// RideRequest status in the lifecycle
    RequestStatus {
        Active => "active",
        Matched => "matched",
        Cancelled => "cancelled",
    }
}

/// Repeat schedule of a recurring ride.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurringData {
    pub days: Vec<Weekday>,
    pub until: Option<NaiveDate>,
}

/// Route and schedule shared by rides and ride requests.
///
/// Dates are `YYYY-MM-DD` (absent means today) and times `HH:MM`, kept as the
/// text they were stored with; see [`crate::schedule`] for parsing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Itinerary {
    pub from_location: String,
    pub to_location: String,
    pub departure_date: Option<String>,
    pub departure_time: String,
}

/// A driver's published journey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ride {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub from_location: String,
    pub to_location: String,
    pub departure_date: Option<String>,
    pub departure_time: String,
    pub available_seats: i32,
    pub price: i32,
    pub external_ride_code: Option<String>,
    pub is_recurring: bool,
    pub recurring_data: Option<RecurringData>,
    /// Rider the ride was materialized for, when it came out of a request.
    pub requested_by: Option<Uuid>,
    pub status: RideStatus,
    pub created_at: DateTime<Utc>,
}

impl Ride {
    pub fn new(driver_id: Uuid, itinerary: Itinerary, available_seats: i32, price: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            driver_id,
            from_location: itinerary.from_location,
            to_location: itinerary.to_location,
            departure_date: itinerary.departure_date,
            departure_time: itinerary.departure_time,
            available_seats,
            price,
            external_ride_code: None,
            is_recurring: false,
            recurring_data: None,
            requested_by: None,
            status: RideStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn itinerary(&self) -> Itinerary {
        Itinerary {
            from_location: self.from_location.clone(),
            to_location: self.to_location.clone(),
            departure_date: self.departure_date.clone(),
            departure_time: self.departure_time.clone(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == RideStatus::Active
    }

    /// Whether a rider may pick `date` for this ride. Only recurring rides take a
    /// picked date, and it must fall on one of their days before `until`.
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        if !self.is_recurring {
            return false;
        }
        match &self.recurring_data {
            Some(data) => {
                (data.days.is_empty() || data.days.contains(&date.weekday()))
                    && data.until.map_or(true, |until| date <= until)
            }
            None => true,
        }
    }
}

/// A rider's published desired journey
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RideRequest {
    pub id: Uuid,
    pub rider_id: Uuid,
    pub from_location: String,
    pub to_location: String,
    pub departure_date: Option<String>,
    pub departure_time: String,
    pub passengers: i32,
    pub max_price: Option<i32>,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
}

impl RideRequest {
    pub fn new(rider_id: Uuid, itinerary: Itinerary, passengers: i32, max_price: Option<i32>) -> Self {
        Self {
            id: Uuid::new_v4(),
            rider_id,
            from_location: itinerary.from_location,
            to_location: itinerary.to_location,
            departure_date: itinerary.departure_date,
            departure_time: itinerary.departure_time,
            passengers,
            max_price,
            status: RequestStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn itinerary(&self) -> Itinerary {
        Itinerary {
            from_location: self.from_location.clone(),
            to_location: self.to_location.clone(),
            departure_date: self.departure_date.clone(),
            departure_time: self.departure_time.clone(),
        }
    }
}

/// Field updates for a ride; `None` leaves the stored value untouched.
///
/// The external ride code is set once: a patch never replaces a code already stored.
#[derive(Debug, Clone, Default)]
pub struct RidePatch {
    pub status: Option<RideStatus>,
    pub external_ride_code: Option<String>,
}

impl RidePatch {
    pub fn status(status: RideStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn external_ride_code(code: String) -> Self {
        Self { external_ride_code: Some(code), ..Default::default() }
    }

    pub fn apply(&self, ride: &mut Ride) {
        if let Some(status) = self.status {
            ride.status = status;
        }
        if ride.external_ride_code.is_none() {
            ride.external_ride_code = self.external_ride_code.clone();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RideRequestPatch {
    pub status: Option<RequestStatus>,
}

impl RideRequestPatch {
    pub fn status(status: RequestStatus) -> Self {
        Self { status: Some(status) }
    }

    pub fn apply(&self, request: &mut RideRequest) {
        if let Some(status) = self.status {
            request.status = status;
        }
    }
}
