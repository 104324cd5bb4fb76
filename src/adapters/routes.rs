use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::adapters::{
    controllers::{
        file_controller::FileController, health_controller::HealthController,
        user_controller::UserController,
    },
    middleware::require_auth,
    state::AppState,
};

/// Room for multipart framing on top of the largest allowed file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    match allowed_origins {
        Some(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|origin| match origin.parse() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        warn!("Ignoring invalid CORS origin {}", origin);
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        // Allow all origins if not specified (only for development)
        None => CorsLayer::permissive(),
    }
}

pub fn build_router(app_state: AppState, cors: CorsLayer) -> Router {
    let auth = middleware::from_fn_with_state(app_state.clone(), require_auth);
    let body_limit = usize::try_from(app_state.file_policy.max_size)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    Router::new()
        .route("/health", get(HealthController::health_check))
        .route("/users/register", post(UserController::register))
        .route("/users/login", post(UserController::login))
        .route(
            "/files",
            post(FileController::upload_file)
                .get(FileController::list_files)
                .delete(FileController::delete_all_files)
                .route_layer(auth.clone()),
        )
        .route(
            "/files/{file_id}",
            get(FileController::view_file)
                .merge(delete(FileController::delete_file).route_layer(auth)),
        )
        .route(
            "/files/{file_id}/download",
            get(FileController::download_file),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
