// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{admin, admin_categories, admin_tests, auth, catalog, profile, quiz},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Public: auth, catalogue browsing, level table.
/// * Authenticated: profile and test results.
/// * Admin: overview and management of users, categories and tests.
/// * Uploaded files are served from the upload directory under `/uploads`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:5173"),
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let public_routes = Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/tests", get(catalog::list_tests))
        .route("/tests/random", get(catalog::random_tests))
        .route("/tests/{id}", get(catalog::get_test))
        .route("/levels", get(catalog::list_levels));

    let user_routes = Router::new()
        .route("/me", get(profile::get_me).patch(profile::update_me))
        .route("/me/level", patch(profile::update_level))
        .route("/me/experience", post(profile::award_exp))
        .route("/me/avatar", post(profile::upload_avatar))
        .route("/test-result", post(quiz::submit_result))
        .route("/test-result/last", get(quiz::recent_results))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let admin_routes = Router::new()
        .route("/overview", get(admin::overview))
        .route("/users", get(admin::list_users))
        .route(
            "/users/{id}",
            get(admin::get_user)
                .patch(admin::update_user)
                .delete(admin::delete_user),
        )
        .route(
            "/categories",
            get(admin_categories::list_categories).post(admin_categories::create_category),
        )
        .route(
            "/categories/{id}",
            get(admin_categories::get_category)
                .put(admin_categories::update_category)
                .delete(admin_categories::delete_category),
        )
        .route(
            "/tests",
            get(admin_tests::list_tests).post(admin_tests::create_test),
        )
        .route(
            "/tests/{id}",
            get(admin_tests::get_test)
                .put(admin_tests::update_test)
                .delete(admin_tests::delete_test),
        )
        // Double middleware protection: Auth first, then Admin check
        .route_layer(middleware::from_fn(admin_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api", public_routes.merge(user_routes))
        .nest("/api/admin", admin_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
