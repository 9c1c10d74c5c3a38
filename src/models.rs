use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::identity::Role;

// --- Core Application Schemas (Mapped to Database) ---

/// User
///
/// The canonical identity record stored in the `users` table. The pending
/// confirmation code is persistence-only state: it is regenerated on every
/// sign-up attempt and must never appear in an API response, hence
/// `#[serde(skip)]`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    // The RBAC field; see `identity::Role` for the privilege order.
    pub role: Role,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    /// Pending confirmation code, exchanged for an access token. Not serialized.
    #[serde(skip)]
    #[ts(skip)]
    pub confirm_code: Option<Uuid>,
}

/// Category
///
/// A classification a title belongs to (exactly one per title). Addressed by
/// its unique slug on the write surface.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Genre
///
/// A tag a title can carry zero or more of, via the `title_genres` join table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// TitleDetail
///
/// The read shape of a title: category and genres resolved to full objects,
/// and `rating` recomputed on every read as the mean of the associated review
/// scores (`null` while no reviews exist). Assembled by the repository; not a
/// direct row mapping.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TitleDetail {
    pub id: Uuid,
    pub name: String,
    pub year: i32,
    /// Mean review score, recomputed on read. `null` when the title has no reviews.
    pub rating: Option<f64>,
    pub description: Option<String>,
    pub genre: Vec<Genre>,
    pub category: Category,
}

/// Review
///
/// A review record joined with its author's username. The `(title_id,
/// author_id)` pair is unique at the store level; that constraint, not the
/// validator pre-check, is the source of truth for the one-review-per-author
/// rule.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Review {
    // BigInt (i64) id, matching the BIGSERIAL column.
    pub id: i64,
    pub title_id: Uuid,
    pub author_id: Uuid,
    // Loaded via a JOIN on users in the repository query.
    #[sqlx(default)]
    pub author: Option<String>,
    pub text: String,
    pub score: i16,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
}

/// Comment
///
/// A comment on a review, joined with its author's username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub review_id: i64,
    pub author_id: Uuid,
    #[sqlx(default)]
    pub author: Option<String>,
    pub text: String,
    #[ts(type = "string")]
    pub pub_date: DateTime<Utc>,
}

// --- Request Payloads (Input Schemas) ---

/// SignUpRequest
///
/// Input for POST /auth/signup. The accepted pair is echoed back on success;
/// the confirmation code only ever travels by mail.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SignUpRequest {
    pub email: String,
    pub username: String,
}

/// TokenRequest
///
/// Input for POST /auth/token: the `(username, confirm_code)` pair to exchange
/// for an access token.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct TokenRequest {
    pub username: String,
    pub confirm_code: Uuid,
}

/// TokenResponse
///
/// The issued bearer token. Opaque to clients.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub access: String,
}

/// SlugPayload
///
/// Shared input shape for creating a category or a genre; the two surfaces are
/// identical apart from the table they land in.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SlugPayload {
    pub name: String,
    pub slug: String,
}

/// CreateTitleRequest
///
/// Input for POST /titles. Category and genres are referenced by slug and
/// resolved (with per-slug field errors) before the insert.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTitleRequest {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    #[serde(default)]
    pub genre: Vec<String>,
    pub category: String,
}

/// UpdateTitleRequest
///
/// Partial update payload for PATCH /titles/{id}. Uses `Option<T>` for all
/// fields so only provided fields are touched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateTitleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// CreateReviewRequest
///
/// Input for POST /titles/{id}/reviews. The author comes from the
/// authenticated session, never from the payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateReviewRequest {
    pub text: String,
    pub score: i16,
}

/// UpdateReviewRequest
///
/// Partial update payload for PATCH on a review.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i16>,
}

/// CreateCommentRequest
///
/// Input payload for posting a new comment on a review.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub text: String,
}

/// UpdateCommentRequest
///
/// Partial update payload for PATCH on a comment.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateCommentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// CreateUserRequest
///
/// Admin-facing input for POST /users. The role defaults to `user` when
/// omitted.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// UpdateUserRequest
///
/// Partial update payload shared by the admin PATCH /users/{username} surface
/// and the self-service PATCH /users/me surface. On the self-service path the
/// `username`, `email` and `role` fields are accepted but silently discarded;
/// only the admin path applies them.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// TitleFilter
///
/// Accepted query parameters for the title listing endpoint: category and
/// genre by slug, name substring, exact year.
#[derive(Debug, Clone, Deserialize, utoipa::IntoParams, Default)]
pub struct TitleFilter {
    pub category: Option<String>,
    pub genre: Option<String>,
    pub name: Option<String>,
    pub year: Option<i32>,
}

// --- Internal Repository Inputs ---

/// NewTitle
///
/// Repository-facing insert shape for a title: slugs already resolved to ids
/// by the handler so the store only deals in keys.
#[derive(Debug, Clone)]
pub struct NewTitle {
    pub name: String,
    pub year: i32,
    pub description: Option<String>,
    pub category_id: Uuid,
    pub genre_ids: Vec<Uuid>,
}

/// TitlePatch
///
/// Repository-facing partial update for a title. `genre_ids: Some(vec![])`
/// clears the genre set; `None` leaves it untouched.
#[derive(Debug, Clone, Default)]
pub struct TitlePatch {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub genre_ids: Option<Vec<Uuid>>,
}
