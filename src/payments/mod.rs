mod stripe;

pub use stripe::{
    StripeCheckoutSession, StripeClient, StripeMetadata, StripeWebhookEvent, WebhookVerifier,
};

use async_trait::async_trait;

use crate::error::Result;

/// Everything the processor needs to host a checkout for one deposit.
/// `user_id` and `group_id` ride along as opaque metadata and come back on
/// the completion webhook - the only link between initiation and settlement.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSpec {
    pub amount_cents: i64,
    pub currency: String,
    pub user_id: String,
    pub group_id: String,
    pub success_url: String,
    pub cancel_url: String,
}

/// A created processor-hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Seam over the payment processor's checkout-create API, injectable so
/// tests can substitute a fake that records calls.
#[async_trait]
pub trait CheckoutProvider: Send + Sync {
    async fn create_checkout_session(&self, spec: &CheckoutSpec) -> Result<CheckoutSession>;
}
