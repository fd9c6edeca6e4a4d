use axum::{
    routing::{get, patch, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::handlers;
use super::AppState;

/// Creates the main API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        // Accounts & sessions
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", get(handlers::auth::logout))
        .route("/me", get(handlers::auth::me))
        // Per-user relevance sets
        .route(
            "/me/wardrobe/:piece",
            put(handlers::users::add_to_wardrobe).delete(handlers::users::remove_from_wardrobe),
        )
        .route(
            "/me/favorites/:look",
            put(handlers::users::add_to_favorites).delete(handlers::users::remove_from_favorites),
        )
        .route(
            "/me/hidden-looks/:look",
            put(handlers::users::hide_look).delete(handlers::users::unhide_look),
        )
        // Looks
        .route(
            "/looks",
            get(handlers::looks::list).post(handlers::looks::create),
        )
        .route(
            "/looks/:look",
            get(handlers::looks::get).delete(handlers::looks::remove),
        )
        // Pieces
        .route(
            "/pieces",
            get(handlers::pieces::list).post(handlers::pieces::create),
        )
        .route(
            "/pieces/:piece",
            patch(handlers::pieces::update).delete(handlers::pieces::remove),
        )
        // Categories
        .route(
            "/piece-categories",
            get(handlers::categories::list).post(handlers::categories::create),
        )
        .route(
            "/piece-categories/:category",
            patch(handlers::categories::rename).delete(handlers::categories::remove),
        )
        // Images
        .route("/img/*key", get(handlers::images::get_image))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
