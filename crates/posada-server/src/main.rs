use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router, middleware,
    routing::{get, post, put},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use posada_api::auth::{self, AppState, AppStateInner};
use posada_api::middleware::{jwt_secret, require_admin, require_auth};
use posada_api::{reservations, rooms, settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "posada=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let secret = jwt_secret();
    let db_path = std::env::var("POSADA_DB_PATH").unwrap_or_else(|_| "posada.db".into());
    let host = std::env::var("POSADA_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("POSADA_PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()?;

    // Init database
    let db = posada_db::Database::open(&PathBuf::from(&db_path))?;

    // Optional admin account from the environment
    match (
        std::env::var("POSADA_ADMIN_USER"),
        std::env::var("POSADA_ADMIN_PASSWORD"),
    ) {
        (Ok(username), Ok(password)) => {
            auth::bootstrap_admin(&db, &username, &password)?;
            info!("Admin account '{}' ready", username);
        }
        _ => warn!("POSADA_ADMIN_USER/POSADA_ADMIN_PASSWORD not set; no admin provisioned"),
    }

    // Shared state
    let app_state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret: secret,
    });

    // Routes
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(app_state.clone());

    let user_routes = Router::new()
        .route("/auth/me", get(auth::me))
        .route("/auth/profile", put(auth::update_profile))
        .route("/rooms", get(rooms::list_rooms))
        .route("/rooms/available", get(rooms::available_rooms))
        .route("/rooms/{id}", get(rooms::get_room))
        .route(
            "/reservations",
            get(reservations::list_reservations).post(reservations::create_reservation),
        )
        .route(
            "/reservations/{id}",
            get(reservations::get_reservation)
                .put(reservations::update_reservation)
                .delete(reservations::delete_reservation),
        )
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state.clone());

    let admin_routes = Router::new()
        .route("/rooms", post(rooms::create_room))
        .route(
            "/rooms/{id}",
            put(rooms::update_room).delete(rooms::delete_room),
        )
        .route("/reservations/{id}/checkin", post(reservations::checkin))
        .route("/reservations/{id}/checkout", post(reservations::checkout))
        .route(
            "/settings",
            get(settings::get_settings).put(settings::update_settings),
        )
        .layer(middleware::from_fn(require_admin))
        .layer(middleware::from_fn(require_auth))
        .with_state(app_state);

    let api = Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes);

    let app = Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Posada server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
