//! Stop timings: one station visit within a trip.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Station, StationId, StopTimingId, TimeOfDay, TripId};

/// Error returned when parsing an invalid stop duration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid stop duration: {0:?}")]
pub struct InvalidStopDuration(String);

/// How long a bus waits at a stop, in whole minutes.
///
/// Accepts "5", "5 minutes", "1 minute" and Postgres interval output such
/// as "00:05:00". Always rendered as "<N> minutes".
///
/// # Examples
///
/// ```
/// use bus_server::domain::StopDuration;
///
/// assert_eq!(StopDuration::default().to_string(), "5 minutes");
/// assert_eq!("12 minutes".parse::<StopDuration>().unwrap().minutes(), 12);
/// assert_eq!("00:10:00".parse::<StopDuration>().unwrap().minutes(), 10);
/// assert!("-3".parse::<StopDuration>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopDuration(u32);

impl StopDuration {
    /// Default dwell time for a new stop.
    pub const DEFAULT_MINUTES: u32 = 5;

    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes(&self) -> u32 {
        self.0
    }

    /// Parse any of the accepted textual forms.
    pub fn parse(s: &str) -> Result<Self, InvalidStopDuration> {
        let invalid = || InvalidStopDuration(s.to_string());
        let trimmed = s.trim();

        if let Some((h, rest)) = trimmed.split_once(':') {
            // "HH:MM:SS" interval
            let (m, sec) = rest.split_once(':').ok_or_else(invalid)?;
            let h: u32 = h.parse().map_err(|_| invalid())?;
            let m: u32 = m.parse().map_err(|_| invalid())?;
            let sec: u32 = sec.parse().map_err(|_| invalid())?;
            if m > 59 || sec > 59 {
                return Err(invalid());
            }
            let minutes = h.checked_mul(60).and_then(|x| x.checked_add(m));
            return minutes.map(Self).ok_or_else(invalid);
        }

        let number = trimmed
            .strip_suffix("minutes")
            .or_else(|| trimmed.strip_suffix("minute"))
            .or_else(|| trimmed.strip_suffix("mins"))
            .unwrap_or(trimmed)
            .trim();

        number.parse::<u32>().map(Self).map_err(|_| invalid())
    }
}

impl Default for StopDuration {
    fn default() -> Self {
        Self(Self::DEFAULT_MINUTES)
    }
}

impl fmt::Display for StopDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} minutes", self.0)
    }
}

impl std::str::FromStr for StopDuration {
    type Err = InvalidStopDuration;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for StopDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StopDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Minutes(u32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Minutes(m) => Ok(Self(m)),
            Raw::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}

/// A stored stop timing row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTiming {
    pub id: StopTimingId,
    pub trip_id: TripId,
    pub station_id: StationId,
    pub arrival: Option<TimeOfDay>,
    /// Required at authoring time; stored data may omit it on the final stop.
    pub departure: Option<TimeOfDay>,
    #[serde(default)]
    pub stop_duration: StopDuration,
    /// 1-based position along the trip.
    pub sequence: u32,
}

/// A stop timing not yet written to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStopTiming {
    pub trip_id: TripId,
    pub station_id: StationId,
    pub arrival: Option<TimeOfDay>,
    pub departure: Option<TimeOfDay>,
    pub stop_duration: StopDuration,
    pub sequence: u32,
}

/// A stop timing joined with its station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledStop {
    pub timing: StopTiming,
    pub station: Station,
}

impl ScheduledStop {
    pub fn station_id(&self) -> StationId {
        self.station.id
    }

    pub fn sequence(&self) -> u32 {
        self.timing.sequence
    }
}
