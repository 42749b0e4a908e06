use serde::{Deserialize, Serialize};

/// Local profile for an identity-provider user.
///
/// The row id is the identity provider's user id - profiles are bootstrapped
/// at signup time, never created independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub session_hours: i64,
    pub created_at: i64,
}

/// Data required to bootstrap a profile after identity-provider signup.
#[derive(Debug, Clone)]
pub struct CreateProfile {
    pub user_id: String,
    pub username: String,
}
