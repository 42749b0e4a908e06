use serde::{Deserialize, Serialize};

/// One confirmed, settled contribution to a group pool.
///
/// Rows are written exactly once by the webhook reconciler and never mutated
/// or deleted. `checkout_session_id` is the external processor's session id
/// and carries the uniqueness constraint that makes redelivery a no-op.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: String,
    pub checkout_session_id: String,
    pub group_id: String,
    pub user_id: String,
    pub amount_cents: i64,
    pub recorded_at: i64,
}

/// Data extracted from a verified checkout-completed event.
#[derive(Debug, Clone)]
pub struct RecordContribution {
    pub checkout_session_id: String,
    pub group_id: String,
    pub user_id: String,
    pub amount_cents: i64,
}

/// Per-user slice of a group's contributions, with the display name resolved
/// from the profile store. `username` is None when the profile row is missing;
/// the amount is still counted.
#[derive(Debug, Clone, Serialize)]
pub struct UserContribution {
    pub username: Option<String>,
    pub total: f64,
}

/// Raw per-user aggregate as it comes out of the ledger query.
#[derive(Debug, Clone)]
pub struct ContributionRow {
    pub user_id: String,
    pub username: Option<String>,
    pub total_cents: i64,
}

/// Convert stored integer cents to the decimal dollars surfaced by the API.
pub fn cents_to_amount(cents: i64) -> f64 {
    cents as f64 / 100.0
}
