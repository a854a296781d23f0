//! HTTP surface hosting the auth layer.
//!
//! The router is constructible with any [`TokenStore`]/[`AuthRepository`]
//! implementation, so tests run it against in-memory backends while
//! [`new`] wires the production Redis store and Postgres repository.

use crate::auth::{
    admin_guard, Argon2Hasher, Auth, AuthRepository, PasswordHasher, PgRepository,
};
use crate::session::{RedisStore, SessionConfig, SessionInterface, StoreConfig, TokenStore};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Method, Request},
    middleware,
    routing::{get, post},
    Extension, Router,
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
mod layer;

pub use layer::{session_middleware, SessionHandle};

/// Everything a request needs, passed through request context rather than
/// looked up ambiently.
pub struct AppState {
    pub sessions: SessionInterface,
    pub auth: Auth,
    pub hasher: Arc<dyn PasswordHasher>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn TokenStore>,
        repository: Arc<dyn AuthRepository>,
        hasher: Arc<dyn PasswordHasher>,
        session_config: SessionConfig,
    ) -> Self {
        Self {
            sessions: SessionInterface::new(store, session_config),
            auth: Auth::new(repository),
            hasher,
        }
    }
}

/// Build the router with the session layer wrapped around every route.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/login", post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/me", get(handlers::me))
        .route(
            "/admin",
            get(handlers::admin_area).layer(middleware::from_fn(admin_guard)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(Extension(state))
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(
    port: u16,
    dsn: String,
    store_config: &StoreConfig,
    session_config: SessionConfig,
) -> Result<()> {
    // Connect to database
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let store = RedisStore::new(store_config).context("Failed to build token store client")?;
    let repository: Arc<dyn AuthRepository> = Arc::new(PgRepository::new(pool));

    let state = Arc::new(AppState::new(
        Arc::new(store),
        repository,
        Arc::new(Argon2Hasher),
        session_config,
    ));

    let cors = CorsLayer::new()
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            HeaderName::from_static("authentication-token"),
        ])
        .allow_methods([Method::GET, Method::POST]);

    let app = router(state).layer(
        ServiceBuilder::new()
            .layer(SetRequestHeaderLayer::if_not_present(
                HeaderName::from_static("x-request-id"),
                |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
            ))
            .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                "x-request-id",
            )))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(cors),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
