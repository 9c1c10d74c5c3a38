use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Defines the routes accessible to any user who has passed the
/// authentication layer: the self-service profile surface and review/comment
/// mutation. Object-level authorization (author-or-moderator on update and
/// delete) is decided by the permission evaluator inside the handlers, after
/// the resource has been resolved, so 404 and 403 stay distinct.
///
/// Every handler in this module relies on the `AuthUser` extractor middleware
/// being layered onto this router in `create_router`.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET/PATCH /users/me
        // The actor's own record. The PATCH silently ignores attempts to
        // change username, email or role.
        .route("/users/me", get(handlers::get_me).patch(handlers::update_me))
        // POST /titles/{title_id}/reviews
        // One review per (title, author); the duplicate is rejected by the
        // validator pre-check and, authoritatively, by the store constraint.
        .route("/titles/{title_id}/reviews", post(handlers::create_review))
        // PATCH/DELETE /titles/{title_id}/reviews/{review_id}
        // Author-or-moderator, checked against the resolved resource.
        .route(
            "/titles/{title_id}/reviews/{review_id}",
            patch(handlers::update_review).delete(handlers::delete_review),
        )
        // POST /titles/{title_id}/reviews/{review_id}/comments
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments",
            post(handlers::create_comment),
        )
        // PATCH/DELETE .../comments/{comment_id}
        .route(
            "/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
            patch(handlers::update_comment).delete(handlers::delete_comment),
        )
}
