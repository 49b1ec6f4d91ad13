use chrono::NaiveDate;
use rand::Rng;

/// How a ride came into existence, as encoded in its external ride code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideOrigin {
    /// A driver accepted a ride request outright (`HB-`).
    DirectConfirmation,
    /// A driver answered a request or booking with a counter-offer (`CO-`).
    CounterOffer,
    /// First booking of a recurring ride (`RB-`).
    RecurringBooking,
}

impl RideOrigin {
    pub fn prefix(&self) -> &'static str {
        match self {
            RideOrigin::DirectConfirmation => "HB-",
            RideOrigin::CounterOffer => "CO-",
            RideOrigin::RecurringBooking => "RB-",
        }
    }

    pub fn of_code(code: &str) -> Option<RideOrigin> {
        [RideOrigin::DirectConfirmation, RideOrigin::CounterOffer, RideOrigin::RecurringBooking]
            .into_iter()
            .find(|origin| code.starts_with(origin.prefix()))
    }
}

/// Generate `<PREFIX><YYYYMMDD><5 random digits>`.
pub fn generate_ride_code(origin: RideOrigin, date: NaiveDate) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(10_000..100_000);
    format!("{}{}{}", origin.prefix(), date.format("%Y%m%d"), suffix)
}

pub fn is_counter_offer_code(code: Option<&str>) -> bool {
    code.and_then(RideOrigin::of_code) == Some(RideOrigin::CounterOffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_format() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let code = generate_ride_code(RideOrigin::CounterOffer, date);

        assert!(code.starts_with("CO-20261018"));
        assert_eq!(code.len(), "CO-".len() + 8 + 5);
        assert!(code[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_origin_round_trip() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        for origin in [RideOrigin::DirectConfirmation, RideOrigin::CounterOffer, RideOrigin::RecurringBooking] {
            let code = generate_ride_code(origin, date);
            assert_eq!(RideOrigin::of_code(&code), Some(origin));
        }
        assert_eq!(RideOrigin::of_code("XX-2026010212345"), None);
        assert!(is_counter_offer_code(Some("CO-2026010212345")));
        assert!(!is_counter_offer_code(Some("HB-2026010212345")));
        assert!(!is_counter_offer_code(None));
    }
}
