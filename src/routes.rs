use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::database::models::{Accessory, Material, MultiCab};
use crate::database::Entity;
use crate::handlers::{inventory, service, session, users};
use crate::middleware::auth_gate;
use crate::state::AppState;

pub fn app(state: AppState, config: &AppConfig) -> Router {
    let router = Router::new()
        // Public
        .route("/", get(service::root))
        .route("/health", get(service::health))
        .merge(user_routes())
        .merge(inventory_routes::<Accessory>("/api/accessories"))
        .merge(inventory_routes::<Material>("/api/materials"))
        .merge(inventory_routes::<MultiCab>("/api/cabs"))
        // One gate for every route; see middleware::policy
        .route_layer(from_fn(auth_gate))
        .with_state(state)
        // Global middleware; inline images need more than the extractor default
        .layer(DefaultBodyLimit::max(config.api.max_request_size_bytes))
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(cors_layer(config));

    if config.api.enable_request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn user_routes() -> Router<AppState> {
    Router::new()
        // Session management
        .route("/api/users/register", post(session::register))
        .route("/api/users/login", post(session::login))
        // Account management
        .route("/api/users", get(users::list).post(users::create))
        .route("/api/users/me", get(users::me))
        .route("/api/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/api/users/:id/activate", put(users::activate))
        .route("/api/users/:id/deactivate", put(users::deactivate))
        .route("/api/users/:id/password", put(users::update_password))
}

fn inventory_routes<T: Entity>(base: &str) -> Router<AppState> {
    Router::new()
        // Collection
        .route(base, get(inventory::list::<T>).post(inventory::create::<T>))
        // Individual record
        .route(
            &format!("{}/:id", base),
            get(inventory::get::<T>)
                .put(inventory::update::<T>)
                .patch(inventory::update::<T>)
                .delete(inventory::delete::<T>),
        )
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins = &config.security.cors_origins;
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| HeaderValue::from_str(o).ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
}
