mod from_row;
mod schema;
pub mod queries;

pub use schema::init_db;

use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::identity::IdentityProvider;
use crate::payments::{CheckoutProvider, WebhookVerifier};

pub type DbPool = Pool<SqliteConnectionManager>;

/// Application state: database pool plus the injected external-service
/// clients. Clients are constructed once at startup and passed in so tests
/// can substitute fakes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    /// Hosted identity provider (token verification, signup, login)
    pub identity: Arc<dyn IdentityProvider>,
    /// Payment processor checkout creation
    pub checkout: Arc<dyn CheckoutProvider>,
    /// Webhook signature verification (shared secret, no network)
    pub webhook_verifier: WebhookVerifier,
    /// Base URL of this service (e.g. https://api.example.com)
    pub base_url: String,
    pub success_page_url: String,
    pub cancel_page_url: String,
}

pub fn create_pool(database_path: &str) -> Result<DbPool, r2d2::Error> {
    let manager = SqliteConnectionManager::file(database_path);
    Pool::builder().max_size(10).build(manager)
}
