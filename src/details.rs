//! Human-readable views over cached records.

use std::fmt;

use crate::record::CacheRecord;

/// Marker shown for optional fields that derivation could not determine.
pub const UNKNOWN: &str = "Unknown";

/// Where the data behind a [`ContactDetails`] came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    /// Served from the store; carries the ISO-8601 write time of the record.
    Cached {
        /// `cached_at` of the stored record.
        cached_at: String,
    },
    /// Derived during this resolution.
    Computed,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cached { cached_at } => write!(f, "Cached at: {cached_at}"),
            Self::Computed => f.write_str("Computed locally, not cached previously"),
        }
    }
}

/// Ordered display lines for one resolved phone number.
///
/// Lines are, in order: phone, validity, carrier, timezone, provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    lines: Vec<String>,
    provenance: Provenance,
}

impl ContactDetails {
    /// Renders a record together with its provenance.
    #[must_use]
    pub fn render(record: &CacheRecord, provenance: Provenance) -> Self {
        let lines = vec![
            format!("Phone: {}", record.formatted),
            format!("Valid: {}", if record.valid { "Yes" } else { "No" }),
            format!("Carrier: {}", record.carrier.as_deref().unwrap_or(UNKNOWN)),
            format!("Timezone: {}", record.timezone.as_deref().unwrap_or(UNKNOWN)),
            provenance.to_string(),
        ];
        Self { lines, provenance }
    }

    /// Details for a record served from the store.
    #[must_use]
    pub fn cached(record: &CacheRecord) -> Self {
        Self::render(
            record,
            Provenance::Cached {
                cached_at: record.cached_at_iso(),
            },
        )
    }

    /// Details for a record derived during this resolution.
    #[must_use]
    pub fn computed(record: &CacheRecord) -> Self {
        Self::render(record, Provenance::Computed)
    }

    /// All display lines, provenance last.
    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Display lines without the provenance note.
    #[must_use]
    pub fn fields(&self) -> &[String] {
        &self.lines[..self.lines.len() - 1]
    }

    /// The provenance of these details.
    #[must_use]
    pub const fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    /// True when the details were served from the store.
    #[must_use]
    pub const fn is_cache_hit(&self) -> bool {
        matches!(self.provenance, Provenance::Cached { .. })
    }
}

impl fmt::Display for ContactDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            f.write_str(line)?;
        }
        Ok(())
    }
}
