//! Metadata derivation.
//!
//! Derivation turns a raw phone-number string into display metadata. It is a
//! pure, deterministic, offline function; the resolver consumes it through the
//! [`Deriver`] trait and never retries it.

mod phone;
mod zones;

pub use phone::PhoneNumberDeriver;

use thiserror::Error;

/// Metadata derived from a phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Derived {
    /// Display-ready representation.
    pub formatted: String,
    /// Whether the number passed validity checks.
    pub valid: bool,
    /// Carrier name, when known.
    pub carrier: Option<String>,
    /// Time zone identifier, when known.
    pub timezone: Option<String>,
}

/// The input could not be parsed as a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse '{input}' as a phone number: {reason}")]
pub struct ParseError {
    /// The rejected input.
    pub input: String,
    /// Why it was rejected.
    pub reason: String,
}

impl ParseError {
    /// Creates a parse error for `input`.
    #[must_use]
    pub fn new(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Source of phone-number metadata.
pub trait Deriver: Send + Sync {
    /// Derive metadata for `phone`.
    fn derive(&self, phone: &str) -> Result<Derived, ParseError>;
}

impl<F> Deriver for F
where
    F: Fn(&str) -> Result<Derived, ParseError> + Send + Sync,
{
    fn derive(&self, phone: &str) -> Result<Derived, ParseError> {
        self(phone)
    }
}
