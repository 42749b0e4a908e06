use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chipin::config::Config;
use chipin::db::{create_pool, init_db, queries, AppState};
use chipin::handlers;
use chipin::identity::HostedIdentityClient;
use chipin::models::{CreateGroup, CreateProfile};
use chipin::payments::{StripeClient, WebhookVerifier};

#[derive(Parser, Debug)]
#[command(name = "chipin")]
#[command(about = "Social money pools - group deposits with friends")]
struct Cli {
    /// Seed the database with dev data (profiles, a friendship, a group)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

/// Seeds the database with dev data for local testing.
/// Only runs in dev mode and when the database is empty.
fn seed_dev_data(state: &AppState) {
    let mut conn = state.db.get().expect("Failed to get db connection for seeding");

    let existing = queries::get_profile_by_username(&conn, "alice")
        .expect("Failed to check for seed data");
    if existing.is_some() {
        tracing::info!("Database already has data, skipping seed");
        return;
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let alice = queries::create_profile(
        &conn,
        &CreateProfile {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: "alice".to_string(),
        },
    )
    .expect("Failed to create dev profile");

    let bob = queries::create_profile(
        &conn,
        &CreateProfile {
            user_id: uuid::Uuid::new_v4().to_string(),
            username: "bob".to_string(),
        },
    )
    .expect("Failed to create dev profile");

    let request = queries::create_friend_request(&conn, &alice.id, &bob.id)
        .expect("Failed to create dev friend request");
    queries::set_friendship_status(&conn, &request.id, chipin::models::FriendshipStatus::Accept)
        .expect("Failed to accept dev friend request");

    let group = queries::create_group_with_creator(
        &mut conn,
        &CreateGroup {
            name: "Ski Trip".to_string(),
            creator_id: alice.id.clone(),
        },
    )
    .expect("Failed to create dev group");
    queries::try_add_group_member(&conn, &group.id, &bob.id)
        .expect("Failed to add dev group member");

    tracing::info!("Profiles: alice={}, bob={}", alice.id, bob.id);
    tracing::info!("Group: {} ({})", group.name, group.id);

    // Copy-paste friendly output for local API clients
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  alice_id: {}", alice.id);
    println!("  bob_id: {}", bob.id);
    println!("  group_id: {}", group.id);
    println!("--- END COPY ---");
    println!();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chipin=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    if config.stripe_webhook_secret.is_empty() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set - webhook deliveries will be rejected");
    }

    // Create the database pool and initialize the schema
    let db_pool = create_pool(&config.database_path).expect("Failed to create database pool");
    {
        let conn = db_pool.get().expect("Failed to get connection");
        init_db(&conn).expect("Failed to initialize database");
    }

    // Construct the external-service clients once and inject them; handlers
    // only ever see the trait objects.
    let identity = Arc::new(HostedIdentityClient::new(
        &config.identity_url,
        &config.identity_service_key,
    ));
    let checkout = Arc::new(StripeClient::new(&config.stripe_secret_key));
    let webhook_verifier = WebhookVerifier::new(&config.stripe_webhook_secret);

    let state = AppState {
        db: db_pool,
        identity,
        checkout,
        webhook_verifier,
        base_url: config.base_url.clone(),
        success_page_url: config.success_page_url.clone(),
        cancel_page_url: config.cancel_page_url.clone(),
    };

    // Seed dev data if --seed flag is passed (only in dev mode)
    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set CHIPIN_ENV=dev)");
        } else {
            seed_dev_data(&state);
        }
    }

    // Build the application router
    let app = handlers::app_router(state.clone(), config.rate_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start the server
    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Chipin server listening on {}", addr);

    // Run server with graceful shutdown.
    // Connect info is required for IP-based rate limiting.
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    // Cleanup on exit if ephemeral mode
    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
        tracing::info!("Ephemeral cleanup complete");
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
