//! Row identifiers.
//!
//! Each table gets its own id newtype so a station id can never be passed
//! where a trip id is expected.

use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

row_id!(
    /// Identifier of a bus station.
    StationId
);
row_id!(
    /// Identifier of a route (from/to label pair).
    RouteId
);
row_id!(
    /// Identifier of a bus trip.
    TripId
);
row_id!(StopTimingId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let id: StationId = "42".parse().unwrap();
        assert_eq!(id, StationId(42));
        assert_eq!(id.to_string(), "42");
        assert!("x".parse::<RouteId>().is_err());
    }

    #[test]
    fn serde_transparent() {
        assert_eq!(serde_json::to_string(&TripId(7)).unwrap(), "7");
        let id: StopTimingId = serde_json::from_str("9").unwrap();
        assert_eq!(id, StopTimingId(9));
    }
}
