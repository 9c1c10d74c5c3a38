use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Defines endpoints that are **unauthenticated** and accessible to any
/// client (anonymous or logged-in): the sign-up/token gateway and every safe
/// (read-only) method on categories, genres, titles, reviews and comments.
/// Safe reads are open by permission rule, so no middleware is applied here;
/// the write methods on the same paths live in the authenticated and admin
/// routers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Unauthenticated endpoint used for monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
        // POST /auth/signup
        // Registers (or re-registers) a user and mails a confirmation code.
        .route("/auth/signup", post(handlers::sign_up))
        // POST /auth/token
        // Exchanges a (username, confirm_code) pair for an access token.
        .route("/auth/token", post(handlers::obtain_token))
        // GET /categories?search=... and /genres?search=...
        .route("/categories", get(handlers::list_categories))
        .route("/genres", get(handlers::list_genres))
        // GET /titles?category=&genre=&name=&year=
        // Listing carries the per-title rating recomputed from reviews.
        .route("/titles", get(handlers::list_titles))
        .route("/titles/{title_id}", get(handlers::get_title_detail))
        // Reviews and comments are nested under their owners; a mismatched
        // parent id is a 404.
        .route("/titles/{title_id}/reviews", get(handlers::list_reviews))
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            get(handlers::get_review_detail),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            get(handlers::list_comments),
        )
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            get(handlers::get_comment_detail),
        )
}
