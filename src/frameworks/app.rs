use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info};

use crate::domain::ports::CredentialBackend;
use crate::frameworks::config::{self, BackendKind};
use crate::interface_adapters::backends::live::LiveBackend;
use crate::interface_adapters::backends::simulated::SimulatedBackend;
use crate::interface_adapters::provider::HttpIdentityProvider;
use crate::interface_adapters::state::{
    InMemoryIdentityStore, PostgresIdentityStore, SystemClock,
};
use crate::use_cases::coordinator::SessionCoordinator;

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

// Build a small PostgreSQL pool for identity persistence.
async fn connect_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await
}

pub async fn run() {
    init_tracing();
    let _ = dotenvy::dotenv();

    let backend: Arc<dyn CredentialBackend> = match config::backend_kind() {
        BackendKind::Live => {
            let provider = match HttpIdentityProvider::new(
                config::provider_base_url(),
                config::provider_timeout(),
            ) {
                Ok(provider) => provider,
                Err(err) => {
                    error!(error = %err, "failed to build identity provider client");
                    return;
                }
            };
            info!(url = %config::provider_base_url(), "using live backend");
            Arc::new(LiveBackend::new(provider, SystemClock))
        }
        BackendKind::Simulated => {
            let backend =
                SimulatedBackend::new(SystemClock).with_latency(config::simulated_latency());
            backend
                .seed_account("dev@knowmycar.local", "wrench-set", Some("Dev Driver"))
                .await;
            info!("using simulated backend");
            Arc::new(backend)
        }
    };

    let coordinator = match config::database_url() {
        Some(url) => match connect_pool(&url).await {
            Ok(pool) => SessionCoordinator::with_identity_store(
                backend,
                Arc::new(PostgresIdentityStore { db: pool }),
            ),
            Err(err) => {
                error!(error = %err, "failed to connect identity database");
                return;
            }
        },
        None => SessionCoordinator::with_identity_store(
            backend,
            Arc::new(InMemoryIdentityStore::default()),
        ),
    };

    smoke_flow(&coordinator).await;
}

// Scripted sign-up/sign-in/sign-out pass used for offline development
// against whichever backend is configured.
async fn smoke_flow(coordinator: &SessionCoordinator) {
    let mut states = coordinator.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            info!(?state, "session state");
        }
    });

    coordinator
        .sign_up("driver@knowmycar.local", "oil-change-due", Some("Smoke Driver"))
        .await;
    coordinator.sign_out().await;

    coordinator
        .sign_in_with_password("driver@knowmycar.local", "wrong-password")
        .await;
    if let Some(message) = coordinator.last_error_message() {
        info!(%message, "sign-in rejected as expected");
    }
    coordinator.acknowledge_error();

    coordinator
        .sign_in_with_password("driver@knowmycar.local", "oil-change-due")
        .await;
    info!(
        valid = coordinator.validate_session().await,
        "session validated"
    );
    coordinator.sign_out().await;
}
