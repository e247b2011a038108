#![cfg_attr(test, allow(clippy::disallowed_methods))]
// Forbid unwrap() in production code; a bad config or bind must exit cleanly.
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
use std::net::SocketAddr;
use std::sync::Arc;

use authn::auth::{
    AccessGuard, AccountProvisioner, AccountStore, AuthService, MemoryAccountStore, TokenService,
    default_seed_accounts,
};
use authn::config::ServerConfig;
use authn::http::{AppState, build_router};
use authn::time::{SystemTimeSource, TimeSource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authn=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment variables
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Loaded configuration: bcrypt_cost={}, listen_port={}, seed_default_accounts={}",
        config.bcrypt_cost,
        config.listen_port,
        config.seed_default_accounts
    );

    let hasher = match config.password_hasher() {
        Ok(hasher) => hasher,
        Err(e) => {
            tracing::error!("Failed to configure password hashing: {e}");
            std::process::exit(1);
        }
    };

    let clock: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

    // A missing signing secret is fatal; never start without one.
    let tokens = match TokenService::new(config.jwt_secret.as_bytes(), Arc::clone(&clock)) {
        Ok(tokens) => Arc::new(tokens),
        Err(e) => {
            tracing::error!("Failed to configure token signing: {e}");
            std::process::exit(1);
        }
    };

    let store: Arc<dyn AccountStore> = Arc::new(MemoryAccountStore::new());

    if config.seed_default_accounts {
        let provisioner = AccountProvisioner::new(Arc::clone(&store), hasher, Arc::clone(&clock));
        let report = provisioner.seed(&default_seed_accounts()).await;
        if !report.is_complete() {
            tracing::warn!(
                "{} of {} seed accounts could not be provisioned",
                report.failed(),
                report.entries.len()
            );
        }
    }

    let state = AppState {
        auth: Arc::new(AuthService::new(store, hasher, Arc::clone(&tokens))),
        guard: AccessGuard::new(tokens),
    };
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.listen_port));
    tracing::info!("listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to bind: {e}");
            std::process::exit(1);
        });

    axum::serve(listener, app).await.unwrap_or_else(|e| {
        tracing::error!("Server error: {e}");
        std::process::exit(1);
    });
}
