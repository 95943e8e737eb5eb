//! Telemetry sample types.
//!
//! A `TelemetrySample` is one point-in-time reading from the machine.
//! The backend is lenient about numeric encodings (gear arrives as a float,
//! timestamps may lack an offset), so decoding normalizes both here.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// One timestamped velocity/rpm/gear reading.
///
/// Immutable once constructed. The timestamp is the ordering key but is
/// never used to reorder samples; arrival order wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySample {
    /// Velocity in km/h.
    pub velocity: f64,
    /// Engine revolutions per minute.
    #[serde(deserialize_with = "whole::deserialize")]
    pub rpm: u32,
    /// Current gear (0 = neutral).
    #[serde(deserialize_with = "whole::deserialize")]
    pub gear: u8,
    /// Time the backend recorded the reading.
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
}

impl TelemetrySample {
    pub fn new(velocity: f64, rpm: u32, gear: u8, timestamp: DateTime<Utc>) -> Self {
        Self {
            velocity,
            rpm,
            gear,
            timestamp,
        }
    }

    /// Wall-clock time of the reading in the local timezone (`HH:MM:SS`).
    pub fn display_time(&self) -> String {
        self.timestamp
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }

    /// RPM with thousands separators (e.g. `1,800`).
    pub fn rpm_display(&self) -> String {
        let digits = self.rpm.to_string();
        let mut out = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(',');
            }
            out.push(ch);
        }
        out
    }
}

/// Whole-number decoding that accepts integral floats (`3.0`).
mod whole {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: TryFrom<u64>,
    {
        let value = f64::deserialize(deserializer)?;
        if !value.is_finite() || value.fract() != 0.0 || value < 0.0 || value > u64::MAX as f64 {
            return Err(D::Error::custom(format!(
                "expected a non-negative whole number, got {value}"
            )));
        }
        T::try_from(value as u64)
            .map_err(|_| D::Error::custom(format!("value {value} out of range")))
    }
}

/// Timestamps as RFC 3339, accepting naive ISO-8601 (treated as UTC) on input.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub(super) fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}
