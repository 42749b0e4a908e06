mod user_auth;

pub use user_auth::{require_user, AuthedUser};
