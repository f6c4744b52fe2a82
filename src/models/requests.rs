//! Request DTOs for the lookup API
//!
//! Defines the structure of incoming query strings.

use serde::Deserialize;

/// Query string for GET /user
///
/// `id` is optional here so a missing id reaches the service, which
/// rejects it as bad input instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    /// Record id to look up
    #[serde(default)]
    pub id: Option<String>,
}

impl UserQuery {
    /// Returns the supplied id, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }
}
