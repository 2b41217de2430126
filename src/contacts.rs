//! Contact lists handed to the resolver by the surrounding application.
//!
//! Contacts are plain `(name, phone)` pairs. They are read from a JSON file:
//!
//! ```json
//! [
//!   { "name": "John Doe", "phone": "+11234567890" }
//! ]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// One entry of a contact list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name.
    pub name: String,
    /// Phone number as entered; used verbatim as the cache key.
    pub phone: String,
}

impl Contact {
    /// Creates a contact.
    #[must_use]
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
        }
    }
}

/// Built-in list used when no contact source is available.
#[must_use]
pub fn sample_contacts() -> Vec<Contact> {
    vec![
        Contact::new("John Doe", "+11234567890"),
        Contact::new("Jane Smith", "+449876543210"),
        Contact::new("Emergency", "+911"),
    ]
}

/// Read contacts from a JSON file.
pub fn load_contacts(path: &Path) -> Result<Vec<Contact>, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|e| ConfigError::Parse {
        path: Some(path.to_path_buf()),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_contacts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        std::fs::write(
            &path,
            r#"[{"name":"Ada","phone":"+442079460000"},{"name":"Bob","phone":"0800"}]"#,
        )
        .unwrap();

        let contacts = load_contacts(&path).unwrap();
        assert_eq!(contacts.len(), 2);
        assert_eq!(contacts[1], Contact::new("Bob", "0800"));
    }

    #[test]
    fn test_malformed_contacts_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        std::fs::write(&path, r#"{"name":"Ada"}"#).unwrap();

        assert!(matches!(load_contacts(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_sample_contacts() {
        let contacts = sample_contacts();
        assert_eq!(contacts.len(), 3);
        assert!(contacts.iter().all(|c| c.phone.starts_with('+')));
    }
}
