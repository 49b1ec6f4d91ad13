/// Closed status enum stored as lowercase text.
///
/// Generates `as_str`, `Display` and a `FromStr` that rejects anything outside
/// the listed variants, so stored values are checked at the repository edge.
macro_rules! status_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::CoreError::ValidationError(format!(
                        "unrecognized {} value: {}",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }
    };
}

pub mod booking;
pub mod clock;
pub mod codes;
pub mod listing;
pub mod repository;
pub mod schedule;

pub use booking::{Booking, BookingPatch, BookingStatus, Notification, OfferKind};
pub use clock::{Clock, ManualClock, SystemClock};
pub use listing::{Itinerary, RecurringData, RequestStatus, Ride, RidePatch, RideRequest, RideRequestPatch, RideStatus};
pub use repository::{BookingRepository, ListingRepository, NotificationEmitter, RepoError, RepoResult};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Validation failed: {0}")]
    ValidationError(String),
    #[error("Internal service error: {0}")]
    InternalError(String),
}

pub type CoreResult<T> = Result<T, CoreError>;

impl From<RepoError> for CoreError {
    fn from(err: RepoError) -> Self {
        CoreError::InternalError(err.to_string())
    }
}
