//! Request DTOs for the cache admin API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

use crate::cache::KEY_DELIMITER;

/// Query string for the CLEAR operation (DELETE /cache)
///
/// # Fields
/// - `prefix`: Namespace to clear; omitted or empty clears everything
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearQuery {
    /// Namespace prefix to invalidate
    #[serde(default)]
    pub prefix: Option<String>,
}

impl ClearQuery {
    /// Validates the query
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        match &self.prefix {
            Some(prefix) if prefix.contains(KEY_DELIMITER) => Some(format!(
                "Prefix cannot contain the key delimiter '{}'",
                KEY_DELIMITER
            )),
            _ => None,
        }
    }

    /// Returns the prefix to clear, treating an empty string as "everything".
    pub fn scope(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}
