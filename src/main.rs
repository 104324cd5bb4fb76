use std::sync::Arc;

use filehost::{
    adapters::{
        database,
        repositories::{SqliteMetadataRepository, SqliteUserRepository},
        routes::{build_router, cors_layer},
        state::AppState,
    },
    application::{
        cleanup::{CleanupScheduler, CleanupService},
        repositories::{MetadataRepository, UserRepository},
        services::TokenService,
    },
    domain::config::{policy::FilePolicy, server::ServerConfig},
    services,
};
use tokio::signal;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => tracing::error!("Failed to listen for SIGTERM: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("filehost=info,tower_http=info")),
        )
        .init();

    let config = ServerConfig::from_env().expect("ERROR: Invalid server configuration");

    let file_policy = match &config.file_policy_path {
        Some(path) => FilePolicy::load(path).expect("ERROR: Failed to load file policy"),
        None => FilePolicy::default(),
    };
    tracing::info!(
        "File policy: max size {}B, default lifetime {}s",
        file_policy.max_size,
        file_policy.default_lifetime
    );

    let secret_key = match config.secret_key.clone() {
        Some(key) => key,
        None => {
            tracing::info!("SECRET_KEY not set, generating a new one; issued tokens will not survive a restart");
            TokenService::generate_secret_key()
        }
    };
    let token_service =
        TokenService::new(&secret_key, config.token_ttl).expect("ERROR: Invalid SECRET_KEY");

    tracing::info!("Connecting to metadata database...");
    let pool = database::connect(&config.database_url)
        .await
        .expect("ERROR: Failed to open the metadata database. Check DATABASE_URL.");

    let storage_service = services::create_storage_service(config.storage_path.clone())
        .await
        .expect("ERROR: Storage is unusable. Check STORAGE_PATH.");

    let metadata_repository =
        Arc::new(SqliteMetadataRepository::new(pool.clone())) as Arc<dyn MetadataRepository>;
    let user_repository =
        Arc::new(SqliteUserRepository::new(pool.clone())) as Arc<dyn UserRepository>;

    let cleanup = CleanupService::new(metadata_repository.clone(), storage_service.clone());
    let scheduler = CleanupScheduler::new(Arc::new(cleanup), config.cleanup_interval).spawn();

    let app_state = AppState {
        file_policy: Arc::new(file_policy),
        token_service: Arc::new(token_service),
        admin_usernames: Arc::new(config.admin_usernames.clone()),
        user_repository,
        metadata_repository,
        storage_service,
    };

    let router = build_router(
        app_state,
        cors_layer(config.cors_allowed_origins.as_deref()),
    );

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on 0.0.0.0:{}", config.port);

    if let Err(e) = axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    scheduler.shutdown().await;
    pool.close().await;
    tracing::info!("Server stopped");
}
