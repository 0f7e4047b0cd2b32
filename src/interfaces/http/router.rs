//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::application::UserService;
use crate::auth::{auth_middleware, AccessGuard};
use crate::interfaces::http::common::ErrorBody;
use crate::interfaces::http::modules::{auth, health, users};

/// Security scheme modifier for OpenAPI
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("Admin token from POST /login"))
                        .build(),
                ),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        // Health
        health::health_check,
        // Auth
        auth::login,
        // Users
        users::create_user,
        users::list_users,
        users::get_user,
        users::update_user,
        users::delete_user,
    ),
    components(
        schemas(
            ErrorBody,
            auth::LoginRequest,
            auth::LoginResponse,
            users::UserResponse,
            users::CreateUserRequest,
            users::UpdateUserRequest,
            health::HealthResponse,
            health::ComponentHealth,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Authentication", description = "Admin login issuing JWT bearer tokens"),
        (name = "Users", description = "User registration and token-guarded management"),
    ),
    info(
        title = "User Service API",
        version = "1.0.0",
        description = "User management with admin-only JWT login",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(user_service: Arc<UserService>, guard: AccessGuard) -> Router {
    let auth_state = auth::AuthHandlerState {
        user_service: user_service.clone(),
    };
    let user_state = users::UserHandlerState {
        user_service: user_service.clone(),
    };
    let health_state = health::HealthState {
        user_service,
        started_at: Arc::new(Instant::now()),
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Login (public)
    let auth_routes = Router::new()
        .route("/login", post(auth::login))
        .with_state(auth_state);

    // Registration (public)
    let user_public_routes = Router::new()
        .route("/users", post(users::create_user))
        .with_state(user_state.clone());

    // User management (protected). `route_layer` keeps unmatched paths at 404.
    let user_protected_routes = Router::new()
        .route("/users", get(users::list_users))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(guard, auth_middleware))
        .with_state(user_state);

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    // Build router
    Router::new()
        // Swagger UI
        .merge(swagger_routes)
        // Health
        .merge(health_routes)
        // Auth
        .merge(auth_routes)
        // Users
        .merge(user_public_routes)
        .merge(user_protected_routes)
        // Middleware
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
