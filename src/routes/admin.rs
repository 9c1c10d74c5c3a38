use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Admin Router Module
///
/// Defines the routes whose handlers require the 'admin' tier (or above):
/// user management and every write on categories, genres and titles.
///
/// Access Control:
/// This router is wrapped by the authentication middleware in
/// `create_router`; the admin privilege itself is asserted by the permission
/// evaluator inside each handler, keeping the privilege rule in one place.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /users
        // Listing with username search, and direct user creation that
        // bypasses the confirmation flow.
        .route("/users", get(handlers::list_users).post(handlers::create_user))
        // GET/PATCH/DELETE /users/{username}
        // Admin management of a single user, including role changes.
        .route(
            "/users/{username}",
            get(handlers::get_user_detail)
                .patch(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // POST /categories, DELETE /categories/{slug}
        // Reads on the same paths are public and live in the public router.
        .route("/categories", post(handlers::create_category))
        .route("/categories/{slug}", delete(handlers::delete_category))
        // POST /genres, DELETE /genres/{slug}
        .route("/genres", post(handlers::create_genre))
        .route("/genres/{slug}", delete(handlers::delete_genre))
        // POST /titles, PATCH/DELETE /titles/{id}
        .route("/titles", post(handlers::create_title))
        .route(
            "/titles/{title_id}",
            axum::routing::patch(handlers::update_title).delete(handlers::delete_title),
        )
}
