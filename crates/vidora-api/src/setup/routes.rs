//! Route configuration and setup

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use vidora_core::Config;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;

    let api = Router::new()
        // Accounts & sessions
        .route("/users/register", post(handlers::users::register))
        .route("/users/login", post(handlers::users::login))
        .route("/users/logout", post(handlers::users::logout))
        .route("/users/refresh", post(handlers::users::refresh))
        .route(
            "/users/me",
            get(handlers::users::me).patch(handlers::users::update_me),
        )
        .route("/users/me/password", post(handlers::users::change_password))
        .route("/users/me/avatar", patch(handlers::users::update_avatar))
        .route("/users/me/cover", patch(handlers::users::update_cover))
        .route("/users/me/likes", get(handlers::likes::liked_videos))
        .route(
            "/users/me/subscriptions",
            get(handlers::subscriptions::my_subscriptions),
        )
        // Channels
        .route("/channels/{handle}", get(handlers::users::channel_profile))
        .route(
            "/channels/{handle}/subscribe",
            post(handlers::subscriptions::toggle_subscription),
        )
        .route(
            "/channels/{handle}/subscribers",
            get(handlers::subscriptions::list_subscribers),
        )
        .route(
            "/channels/{handle}/playlists",
            get(handlers::playlists::channel_playlists),
        )
        // Videos
        .route(
            "/videos",
            post(handlers::videos::create_video).get(handlers::videos::list_videos),
        )
        .route(
            "/videos/{id}",
            get(handlers::videos::get_video)
                .patch(handlers::videos::update_video)
                .delete(handlers::videos::delete_video),
        )
        .route(
            "/videos/{id}/thumbnail",
            put(handlers::videos::replace_thumbnail),
        )
        .route("/videos/{id}/publish", post(handlers::videos::toggle_publish))
        .route("/videos/{id}/like", post(handlers::likes::toggle_video_like))
        .route(
            "/videos/{id}/comments",
            get(handlers::comments::list_comments).post(handlers::comments::create_comment),
        )
        // Comments
        .route(
            "/comments/{id}",
            patch(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        .route(
            "/comments/{id}/like",
            post(handlers::likes::toggle_comment_like),
        )
        // Playlists
        .route("/playlists", post(handlers::playlists::create_playlist))
        .route(
            "/playlists/{id}",
            get(handlers::playlists::get_playlist)
                .patch(handlers::playlists::update_playlist)
                .delete(handlers::playlists::delete_playlist),
        )
        .route(
            "/playlists/{id}/videos",
            get(handlers::playlists::playlist_videos),
        )
        .route(
            "/playlists/{id}/videos/{video_id}",
            post(handlers::playlists::add_video).delete(handlers::playlists::remove_video),
        )
        // Dashboard
        .route("/dashboard/stats", get(handlers::dashboard::stats))
        .route("/dashboard/videos", get(handlers::dashboard::my_videos));

    let app = Router::new()
        .nest(crate::API_PREFIX, api)
        .route("/healthz", get(handlers::health::healthz))
        .route(
            "/api/openapi.json",
            get(|| async { axum::Json(crate::api_doc::ApiDoc::openapi()) }),
        )
        .nest(
            "/docs",
            utoipa_rapidoc::RapiDoc::new("/api/openapi.json")
                .path("/docs")
                .into(),
        )
        // Body limit must cover the largest accepted upload.
        .layer(RequestBodyLimitLayer::new(
            config.max_video_size_bytes.max(config.max_image_size_bytes) + 1024 * 1024,
        ))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration. Credentialed requests cannot use a wildcard
/// origin, so `*` falls back to permissive-without-credentials (dev only).
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let cors = if config.cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins
            .iter()
            .map(|origin| {
                origin
                    .parse::<HeaderValue>()
                    .map_err(|_| anyhow::anyhow!("Invalid CORS origin: {}", origin))
            })
            .collect::<Result<Vec<_>, _>>()?;

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::PUT,
                Method::DELETE,
            ])
            // Wildcards are rejected for credentialed requests.
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ])
            .allow_credentials(true)
    };

    Ok(cors)
}
