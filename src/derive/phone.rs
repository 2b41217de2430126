//! Offline derivation backed by libphonenumber metadata.

use phonenumber::Mode;
use tracing::trace;

use super::zones;
use super::{Derived, Deriver, ParseError};

/// Default [`Deriver`] using the `phonenumber` crate.
///
/// Numbers must carry their country code (`+<cc>...`); there is no default
/// region. Carrier names are not bundled offline, so `carrier` is always absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneNumberDeriver;

impl PhoneNumberDeriver {
    /// Creates the deriver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Deriver for PhoneNumberDeriver {
    fn derive(&self, phone: &str) -> Result<Derived, ParseError> {
        let number =
            phonenumber::parse(None, phone).map_err(|e| ParseError::new(phone, e.to_string()))?;

        let calling_code = number.code().value();
        let national = number.national().value();
        let derived = Derived {
            formatted: number.format().mode(Mode::International).to_string(),
            valid: phonenumber::is_valid(&number),
            carrier: None,
            timezone: zones::time_zone(calling_code, national).map(str::to_string),
        };

        trace!(phone, calling_code, valid = derived.valid, "derived phone metadata");
        Ok(derived)
    }
}
