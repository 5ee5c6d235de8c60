//! Trip input → the positional feature vector the fare model was fit on.
//!
//! Schema (25 columns, in this order):
//!
//! | columns | meaning |
//! |---------|---------|
//! | `passenger_count`, `distance_km` | scalars |
//! | `am_rush`, `pm_rush`, `daytime`, `nighttime` | time-of-day indicators |
//! | `month_jan` .. `month_dec` | month one-hot, calendar order |
//! | `day_monday` .. `day_sunday` | weekday one-hot, Monday first |
//!
//! The model consumes the vector by position, so any change here must be
//! matched by a retrained artifact.

use chrono::{DateTime, Datelike, Month, NaiveDateTime, Timelike, Weekday};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{EncodeError, ParseError, ValidationError};

pub const FEATURE_COUNT: usize = 25;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "passenger_count",
    "distance_km",
    "am_rush",
    "pm_rush",
    "daytime",
    "nighttime",
    "month_jan",
    "month_feb",
    "month_mar",
    "month_apr",
    "month_may",
    "month_jun",
    "month_jul",
    "month_aug",
    "month_sep",
    "month_oct",
    "month_nov",
    "month_dec",
    "day_monday",
    "day_tuesday",
    "day_wednesday",
    "day_thursday",
    "day_friday",
    "day_saturday",
    "day_sunday",
];

const TIMESTAMP_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Time-of-day bucket. Every hour of the day falls in exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeOfDay {
    /// 06:00–09:59
    AmRush,
    /// 16:00–19:59
    PmRush,
    /// 10:00–15:59
    Daytime,
    /// 20:00–05:59
    Nighttime,
}

impl TimeOfDay {
    /// Column order of the indicator block.
    pub const ALL: [TimeOfDay; 4] = [
        TimeOfDay::AmRush,
        TimeOfDay::PmRush,
        TimeOfDay::Daytime,
        TimeOfDay::Nighttime,
    ];

    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=9 => TimeOfDay::AmRush,
            10..=15 => TimeOfDay::Daytime,
            16..=19 => TimeOfDay::PmRush,
            _ => TimeOfDay::Nighttime,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            TimeOfDay::AmRush => "am_rush",
            TimeOfDay::PmRush => "pm_rush",
            TimeOfDay::Daytime => "daytime",
            TimeOfDay::Nighttime => "nighttime",
        }
    }
}

/// Validated raw request. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawTripInput {
    pub timestamp: NaiveDateTime,
    pub distance_km: f32,
    pub passenger_count: u32,
}

impl RawTripInput {
    pub fn new(
        timestamp: NaiveDateTime,
        distance_km: f64,
        passenger_count: i64,
    ) -> Result<Self, ValidationError> {
        if !distance_km.is_finite() {
            return Err(ValidationError::NonFiniteDistance(distance_km));
        }
        if distance_km < 0.0 {
            return Err(ValidationError::NegativeDistance(distance_km));
        }
        // The model consumes f32; anything that would round to infinity is out.
        if distance_km > f64::from(f32::MAX) {
            return Err(ValidationError::DistanceTooLarge(distance_km));
        }
        if passenger_count < 1 {
            return Err(ValidationError::PassengerCount(passenger_count));
        }
        let passengers = u32::try_from(passenger_count)
            .map_err(|_| ValidationError::PassengerCountTooLarge(passenger_count))?;

        Ok(Self {
            timestamp,
            distance_km: distance_km as f32,
            passenger_count: passengers,
        })
    }
}

/// Encoded request. The one-hot groups are held as single typed values, so
/// exactly one indicator per group is set by construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector {
    pub passenger_count: u32,
    pub distance_km: f32,
    pub time_of_day: TimeOfDay,
    pub month: Month,
    pub weekday: Weekday,
}

impl FeatureVector {
    pub fn from_input(input: &RawTripInput) -> Self {
        let ts = input.timestamp;
        Self {
            passenger_count: input.passenger_count,
            distance_km: input.distance_km,
            time_of_day: TimeOfDay::from_hour(ts.hour()),
            month: month_of(&ts),
            weekday: ts.weekday(),
        }
    }

    /// Positional vector in `FEATURE_NAMES` order.
    pub fn to_vec(&self) -> Vec<f32> {
        let mut v = Vec::with_capacity(FEATURE_COUNT);
        v.push(self.passenger_count as f32);
        v.push(self.distance_km);
        for bucket in TimeOfDay::ALL {
            v.push(indicator(self.time_of_day == bucket));
        }
        let month = self.month.number_from_month();
        for m in 1..=12 {
            v.push(indicator(month == m));
        }
        let day = self.weekday.num_days_from_monday();
        for d in 0..7 {
            v.push(indicator(day == d));
        }
        v
    }

    /// `(column, value)` pairs in schema order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f32)> {
        FEATURE_NAMES.into_iter().zip(self.to_vec())
    }
}

impl Serialize for FeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FEATURE_COUNT))?;
        for (name, value) in self.named() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

/// Parse, validate and encode one request.
pub fn encode(
    timestamp: &str,
    distance_km: f64,
    passenger_count: i64,
) -> Result<FeatureVector, EncodeError> {
    let ts = parse_timestamp(timestamp)?;
    let input = RawTripInput::new(ts, distance_km, passenger_count)?;
    Ok(FeatureVector::from_input(&input))
}

pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let s = raw.trim();
    for fmt in TIMESTAMP_FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(ts);
        }
    }
    // Offsets are dropped: buckets follow the wall clock the rider saw.
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.naive_local())
        .map_err(|_| ParseError::Timestamp(raw.to_string()))
}

/// Accepts "jul", "July", "JULY"; anything else is an error.
pub fn month_from_name(name: &str) -> Result<Month, ParseError> {
    name.trim()
        .parse::<Month>()
        .map_err(|_| ParseError::Month(name.to_string()))
}

/// Accepts "sat", "Saturday", "SATURDAY"; anything else is an error.
pub fn weekday_from_name(name: &str) -> Result<Weekday, ParseError> {
    name.trim()
        .parse::<Weekday>()
        .map_err(|_| ParseError::Weekday(name.to_string()))
}

fn month_of(ts: &NaiveDateTime) -> Month {
    // month() is always 1..=12, the fallback never fires.
    Month::try_from(ts.month() as u8).unwrap_or(Month::January)
}

fn indicator(on: bool) -> f32 {
    if on {
        1.0
    } else {
        0.0
    }
}
