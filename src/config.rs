use std::env;

/// Per-tier rate limits (requests per minute, per client IP).
#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    /// Endpoints that make external API calls (deposit checkout creation)
    pub strict_rpm: u32,
    /// Everything else that touches the database
    pub standard_rpm: u32,
    /// Lightweight endpoints (health)
    pub relaxed_rpm: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            strict_rpm: 10,
            standard_rpm: 30,
            relaxed_rpm: 60,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: String,
    pub base_url: String,
    /// Hosted identity provider (token verification, signup, password login)
    pub identity_url: String,
    pub identity_service_key: String,
    /// Stripe API secret key (sk_...)
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret (whsec_...)
    pub stripe_webhook_secret: String,
    /// Where Stripe redirects the payer after checkout
    pub success_page_url: String,
    pub cancel_page_url: String,
    pub rate_limit: RateLimitConfig,
    pub dev_mode: bool,
}

fn env_rpm(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let dev_mode = env::var("CHIPIN_ENV")
            .map(|v| v == "dev" || v == "development")
            .unwrap_or(false);

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port: u16 = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(3001);

        let base_url =
            env::var("BASE_URL").unwrap_or_else(|_| format!("http://{}:{}", host, port));

        // Front-end pages; Stripe substitutes {CHECKOUT_SESSION_ID} itself.
        let success_page_url = env::var("SUCCESS_PAGE_URL").unwrap_or_else(|_| {
            "http://localhost:3000/success?session_id={CHECKOUT_SESSION_ID}".to_string()
        });
        let cancel_page_url = env::var("CANCEL_PAGE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/cancel".to_string());

        let defaults = RateLimitConfig::default();

        Self {
            host,
            port,
            database_path: env::var("DATABASE_PATH").unwrap_or_else(|_| "chipin.db".to_string()),
            base_url,
            identity_url: env::var("IDENTITY_URL")
                .unwrap_or_else(|_| "http://localhost:9999".to_string()),
            identity_service_key: env::var("IDENTITY_SERVICE_KEY").unwrap_or_default(),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            success_page_url,
            cancel_page_url,
            rate_limit: RateLimitConfig {
                strict_rpm: env_rpm("RATE_LIMIT_STRICT_RPM", defaults.strict_rpm),
                standard_rpm: env_rpm("RATE_LIMIT_STANDARD_RPM", defaults.standard_rpm),
                relaxed_rpm: env_rpm("RATE_LIMIT_RELAXED_RPM", defaults.relaxed_rpm),
            },
            dev_mode,
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
