use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Every notification type the marketplace emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    CounterOffer,
    CounterOfferDeclined,
    BookingRequest,
    BookingConfirmed,
    BookingUpdated,
    BookingCancelled,
    RideCancelled,
    RequestCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::CounterOffer => "counter_offer",
            NotificationKind::CounterOfferDeclined => "counter_offer_declined",
            NotificationKind::BookingRequest => "booking_request",
            NotificationKind::BookingConfirmed => "booking_confirmed",
            NotificationKind::BookingUpdated => "booking_updated",
            NotificationKind::BookingCancelled => "booking_cancelled",
            NotificationKind::RideCancelled => "ride_cancelled",
            NotificationKind::RequestCancelled => "request_cancelled",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter_offer" => Ok(NotificationKind::CounterOffer),
            "counter_offer_declined" => Ok(NotificationKind::CounterOfferDeclined),
            "booking_request" => Ok(NotificationKind::BookingRequest),
            "booking_confirmed" => Ok(NotificationKind::BookingConfirmed),
            "booking_updated" => Ok(NotificationKind::BookingUpdated),
            "booking_cancelled" => Ok(NotificationKind::BookingCancelled),
            "ride_cancelled" => Ok(NotificationKind::RideCancelled),
            "request_cancelled" => Ok(NotificationKind::RequestCancelled),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// Payload handed to the notification emitter.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct NotificationEvent {
    pub user_id: Uuid,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub related_id: Option<Uuid>,
    pub timestamp: i64,
}

impl NotificationEvent {
    pub fn new(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        related_id: Option<Uuid>,
    ) -> Self {
        Self {
            user_id,
            kind,
            title: title.into(),
            message: message.into(),
            related_id,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_wire_names() {
        assert_eq!(NotificationKind::CounterOffer.as_str(), "counter_offer");
        assert_eq!(
            serde_json::to_value(NotificationKind::RideCancelled).unwrap(),
            serde_json::json!("ride_cancelled")
        );
        assert_eq!("request_cancelled".parse::<NotificationKind>().unwrap(), NotificationKind::RequestCancelled);
        assert!("ride_expired".parse::<NotificationKind>().is_err());
    }
}
