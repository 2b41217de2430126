//! Cached metadata records.
//!
//! A [`CacheRecord`] is the unit of persistence: one per distinct phone-number
//! key, always written and replaced as a whole. Its serialized form uses the
//! column names of the logical record table (`phone`, `formatted`, `valid`,
//! `carrier`, `timezone`, `cached_at`), with `valid` stored as an integer.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::derive::Derived;

/// Metadata derived for one phone-number key, as stored in the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// The lookup key, exactly as it was passed to resolution.
    pub phone: String,

    /// Display-ready representation of the number.
    pub formatted: String,

    /// Whether the number passed validity checks.
    #[serde(with = "bool_as_int")]
    pub valid: bool,

    /// Carrier name, when known.
    #[serde(default)]
    pub carrier: Option<String>,

    /// Time zone identifier, when known.
    #[serde(default)]
    pub timezone: Option<String>,

    /// Time of the last write.
    pub cached_at: DateTime<Utc>,
}

impl CacheRecord {
    /// Builds a record from a successful derivation, stamped with the current time.
    #[must_use]
    pub fn from_derived(phone: impl Into<String>, derived: Derived) -> Self {
        Self {
            phone: phone.into(),
            formatted: derived.formatted,
            valid: derived.valid,
            carrier: non_empty(derived.carrier),
            timezone: non_empty(derived.timezone),
            cached_at: now(),
        }
    }

    /// Builds the degraded record used when derivation fails.
    ///
    /// The raw input doubles as the formatted value and the number is marked invalid.
    #[must_use]
    pub fn degraded(phone: impl Into<String>) -> Self {
        let phone = phone.into();
        Self {
            formatted: phone.clone(),
            phone,
            valid: false,
            carrier: None,
            timezone: None,
            cached_at: now(),
        }
    }

    /// Returns a copy of this record with `cached_at` reset to the current time.
    #[must_use]
    pub fn restamped(mut self) -> Self {
        self.cached_at = now();
        self
    }

    /// `cached_at` rendered as ISO-8601 UTC.
    #[must_use]
    pub fn cached_at_iso(&self) -> String {
        self.cached_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

/// Current UTC time truncated to microseconds, the precision shown to users.
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

mod bool_as_int {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(de::Error::custom(format!("valid must be 0 or 1, got {other}"))),
        }
    }
}
