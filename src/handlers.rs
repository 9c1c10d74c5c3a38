use crate::{
    AppState,
    auth::{self, AuthUser},
    error::{ApiError, FieldError},
    models::{
        Category, Comment, CreateCommentRequest, CreateReviewRequest, CreateTitleRequest,
        CreateUserRequest, Genre, NewTitle, Review, SignUpRequest, SlugPayload, TitleDetail,
        TitleFilter, TitlePatch, TokenRequest, TokenResponse, UpdateCommentRequest,
        UpdateReviewRequest, UpdateTitleRequest, UpdateUserRequest, User,
    },
    permissions::{Action, ResourceKind, authorize},
    repository::RepoError,
    validation,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

// --- Filter Structs ---

/// SearchFilter
///
/// The single accepted query parameter for name/username searches on the
/// category, genre and user listing endpoints.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct SearchFilter {
    /// Optional case-insensitive substring match.
    pub search: Option<String>,
}

// --- Shared Helpers ---

/// Maps a persistence error to either the caller-supplied conflict rejection
/// (when the store reported a uniqueness violation, the authoritative check)
/// or an internal error.
fn conflict_or_internal(err: RepoError, conflict: ApiError) -> ApiError {
    match err {
        RepoError::UniqueViolation => conflict,
        RepoError::Database(e) => ApiError::Internal(e.to_string()),
    }
}

fn internal(err: RepoError) -> ApiError {
    ApiError::Internal(err.to_string())
}

/// Resolves category/genre slugs to ids, aggregating one field error per
/// unknown slug so the client sees every bad reference at once.
async fn resolve_title_refs(
    state: &AppState,
    category: Option<&str>,
    genres: Option<&[String]>,
) -> Result<(Option<Uuid>, Option<Vec<Uuid>>), ApiError> {
    let mut errors = Vec::new();

    let category_id = match category {
        Some(slug) => match state.repo.get_category_by_slug(slug).await {
            Some(category) => Some(category.id),
            None => {
                errors.push(FieldError::new(
                    "category",
                    format!("category with slug '{slug}' does not exist"),
                ));
                None
            }
        },
        None => None,
    };

    let genre_ids = match genres {
        Some(slugs) => {
            let mut ids = Vec::with_capacity(slugs.len());
            for slug in slugs {
                match state.repo.get_genre_by_slug(slug).await {
                    Some(genre) => ids.push(genre.id),
                    None => errors.push(FieldError::new(
                        "genre",
                        format!("genre with slug '{slug}' does not exist"),
                    )),
                }
            }
            Some(ids)
        }
        None => None,
    };

    if errors.is_empty() {
        Ok((category_id, genre_ids))
    } else {
        Err(ApiError::Validation(errors))
    }
}

// --- Auth Handlers ---

/// sign_up
///
/// [Public Route] Registers a user (or re-registers an existing one) and
/// mails them a fresh confirmation code.
///
/// *Flow*: validate the payload, get-or-create the `(username, email)` pair,
/// regenerate and persist the confirmation code, then send the mail
/// fire-and-forget. The code is persisted before the send attempt, so a mail
/// failure never rolls the sign-up back. A uniqueness violation from the
/// store (either field owned by a different user) is authoritative and maps
/// to a field-scoped conflict.
#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    request_body = SignUpRequest,
    responses(
        (status = 200, description = "Registered", body = SignUpRequest),
        (status = 400, description = "Validation or conflict")
    )
)]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(payload): Json<SignUpRequest>,
) -> Result<Json<SignUpRequest>, ApiError> {
    validation::validate_signup(&payload)?;

    let user = state
        .repo
        .get_or_create_user(&payload.username, &payload.email)
        .await
        .map_err(|e| {
            conflict_or_internal(
                e,
                ApiError::Conflict(FieldError::new(
                    "email",
                    "user with this email is already registered",
                )),
            )
        })?;

    // Each sign-up attempt replaces the pending code; earlier codes stop
    // working the moment this commits.
    let code = Uuid::new_v4();
    if !state.repo.set_confirm_code(user.id, code).await {
        return Err(ApiError::Internal(
            "failed to store confirmation code".to_string(),
        ));
    }

    // Best-effort delivery. The sign-up record is already committed.
    let body = format!("{}, your confirmation code is {}", user.username, code);
    if let Err(e) = state
        .mailer
        .send(&user.email, "critique confirmation code", &body)
        .await
    {
        tracing::warn!("confirmation mail to {} failed: {}", user.email, e);
    }

    Ok(Json(payload))
}

/// obtain_token
///
/// [Public Route] Exchanges a validated `(username, confirm_code)` pair for
/// an access token. The code is deliberately NOT invalidated on success; the
/// same pair keeps working until the next sign-up replaces it.
#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 400, description = "Unregistered pair"),
        (status = 404, description = "Unknown username")
    )
)]
pub async fn obtain_token(
    State(state): State<AppState>,
    Json(payload): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = validation::validate_token_exchange(state.repo.as_ref(), &payload).await?;

    let access = auth::issue_token(user.id, &state.config.jwt_secret)
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    Ok(Json(TokenResponse { access }))
}

// --- User Handlers ---

/// list_users
///
/// [Admin Route] Lists all users with optional username search.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(SearchFilter),
    responses((status = 200, description = "Users", body = [User]))
)]
pub async fn list_users(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    authorize(&auth.actor(), Action::List, ResourceKind::User, None)?;
    Ok(Json(state.repo.list_users(filter.search).await))
}

/// create_user
///
/// [Admin Route] Creates a user directly, bypassing the confirmation flow.
/// The role defaults to `user` when omitted.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses((status = 200, description = "Created", body = User))
)]
pub async fn create_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, ApiError> {
    authorize(&auth.actor(), Action::Create, ResourceKind::User, None)?;
    validation::validate_new_user(&payload)?;

    let user = state.repo.create_user(payload).await.map_err(|e| {
        conflict_or_internal(
            e,
            ApiError::Conflict(FieldError::non_field(
                "user with this username or email already exists",
            )),
        )
    })?;

    Ok(Json(user))
}

/// get_user_detail
///
/// [Admin Route] Retrieves one user by username.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses((status = 200, description = "Found", body = User))
)]
pub async fn get_user_detail(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<User>, ApiError> {
    authorize(&auth.actor(), Action::Retrieve, ResourceKind::User, None)?;
    state
        .repo
        .find_user_by_username(&username)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_user
///
/// [Admin Route] Partial update of any user, including role changes.
#[utoipa::path(
    patch,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    authorize(&auth.actor(), Action::Update, ResourceKind::User, None)?;
    validation::validate_user_patch(&payload)?;

    let updated = state
        .repo
        .update_user(&username, payload)
        .await
        .map_err(|e| {
            conflict_or_internal(
                e,
                ApiError::Conflict(FieldError::non_field(
                    "user with this username or email already exists",
                )),
            )
        })?;

    updated.map(Json).ok_or(ApiError::NotFound)
}

/// delete_user
///
/// [Admin Route] Removes a user. Their reviews and comments go with them via
/// the store's cascade.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_user(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&auth.actor(), Action::Delete, ResourceKind::User, None)?;
    if state.repo.delete_user(&username).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// get_me
///
/// [Authenticated Route] The authenticated user's own record.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses((status = 200, description = "Profile", body = User))
)]
pub async fn get_me(
    auth: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<User>, ApiError> {
    authorize(&auth.actor(), Action::Retrieve, ResourceKind::Me, None)?;
    state
        .repo
        .get_user(auth.0.id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// update_me
///
/// [Authenticated Route] Self-service partial update, scoped to the actor's
/// own record. Attempts to change `username`, `email` or `role` through this
/// surface are accepted and silently discarded; only the profile fields are
/// applied. This permissive behavior is part of the API contract.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateUserRequest,
    responses((status = 200, description = "Updated", body = User))
)]
pub async fn update_me(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    authorize(&auth.actor(), Action::Update, ResourceKind::Me, None)?;
    state
        .repo
        .update_profile(auth.0.id, payload)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

// --- Category & Genre Handlers ---

/// list_categories
///
/// [Public Route] Lists categories with optional name search.
#[utoipa::path(
    get,
    path = "/api/v1/categories",
    params(SearchFilter),
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Json<Vec<Category>> {
    Json(state.repo.list_categories(filter.search).await)
}

/// create_category
///
/// [Admin Route] Creates a category. The slug must be unique; the store's
/// constraint is authoritative.
#[utoipa::path(
    post,
    path = "/api/v1/categories",
    request_body = SlugPayload,
    responses((status = 200, description = "Created", body = Category))
)]
pub async fn create_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SlugPayload>,
) -> Result<Json<Category>, ApiError> {
    authorize(&auth.actor(), Action::Create, ResourceKind::Category, None)?;
    validation::validate_slug_payload(&payload)?;

    let category = state
        .repo
        .create_category(&payload.name, &payload.slug)
        .await
        .map_err(|e| {
            conflict_or_internal(
                e,
                ApiError::Conflict(FieldError::new("slug", "slug is already in use")),
            )
        })?;

    Ok(Json(category))
}

/// delete_category
///
/// [Admin Route] Deletes a category by slug. Fails while any title still
/// references it (foreign-key protection at the store level).
#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&auth.actor(), Action::Delete, ResourceKind::Category, None)?;
    if state.repo.delete_category(&slug).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

/// list_genres
///
/// [Public Route] Lists genres with optional name search.
#[utoipa::path(
    get,
    path = "/api/v1/genres",
    params(SearchFilter),
    responses((status = 200, description = "Genres", body = [Genre]))
)]
pub async fn list_genres(
    State(state): State<AppState>,
    Query(filter): Query<SearchFilter>,
) -> Json<Vec<Genre>> {
    Json(state.repo.list_genres(filter.search).await)
}

/// create_genre
///
/// [Admin Route] Creates a genre.
#[utoipa::path(
    post,
    path = "/api/v1/genres",
    request_body = SlugPayload,
    responses((status = 200, description = "Created", body = Genre))
)]
pub async fn create_genre(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SlugPayload>,
) -> Result<Json<Genre>, ApiError> {
    authorize(&auth.actor(), Action::Create, ResourceKind::Genre, None)?;
    validation::validate_slug_payload(&payload)?;

    let genre = state
        .repo
        .create_genre(&payload.name, &payload.slug)
        .await
        .map_err(|e| {
            conflict_or_internal(
                e,
                ApiError::Conflict(FieldError::new("slug", "slug is already in use")),
            )
        })?;

    Ok(Json(genre))
}

/// delete_genre
///
/// [Admin Route] Deletes a genre by slug.
#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_genre(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<StatusCode, ApiError> {
    authorize(&auth.actor(), Action::Delete, ResourceKind::Genre, None)?;
    if state.repo.delete_genre(&slug).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Title Handlers ---

/// list_titles
///
/// [Public Route] Lists titles with filtering by category slug, genre slug,
/// name substring and exact year. Each row carries the rating recomputed from
/// its current reviews.
#[utoipa::path(
    get,
    path = "/api/v1/titles",
    params(TitleFilter),
    responses((status = 200, description = "Titles", body = [TitleDetail]))
)]
pub async fn list_titles(
    State(state): State<AppState>,
    Query(filter): Query<TitleFilter>,
) -> Json<Vec<TitleDetail>> {
    Json(state.repo.list_titles(filter).await)
}

/// get_title_detail
///
/// [Public Route] One title with resolved category, genres and rating.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = Uuid, Path, description = "Title ID")),
    responses((status = 200, description = "Found", body = TitleDetail))
)]
pub async fn get_title_detail(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
) -> Result<Json<TitleDetail>, ApiError> {
    state
        .repo
        .get_title(title_id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_title
///
/// [Admin Route] Creates a title. Category and genre slugs are resolved
/// first; every unknown slug is reported as its own field error.
#[utoipa::path(
    post,
    path = "/api/v1/titles",
    request_body = CreateTitleRequest,
    responses((status = 200, description = "Created", body = TitleDetail))
)]
pub async fn create_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateTitleRequest>,
) -> Result<Json<TitleDetail>, ApiError> {
    authorize(&auth.actor(), Action::Create, ResourceKind::Title, None)?;
    validation::validate_new_title(&payload)?;

    let (category_id, genre_ids) = resolve_title_refs(
        &state,
        Some(payload.category.as_str()),
        Some(payload.genre.as_slice()),
    )
    .await?;
    // Both Some by construction: the category is required and the genre list
    // defaults to empty.
    let new = NewTitle {
        name: payload.name,
        year: payload.year,
        description: payload.description,
        category_id: category_id.ok_or_else(|| {
            ApiError::Internal("category resolution yielded no id".to_string())
        })?,
        genre_ids: genre_ids.unwrap_or_default(),
    };

    let title = state.repo.create_title(new).await.map_err(internal)?;
    Ok(Json(title))
}

/// update_title
///
/// [Admin Route] Partial update of a title. A supplied genre list replaces
/// the existing set wholesale.
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = Uuid, Path, description = "Title ID")),
    request_body = UpdateTitleRequest,
    responses((status = 200, description = "Updated", body = TitleDetail))
)]
pub async fn update_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
    Json(payload): Json<UpdateTitleRequest>,
) -> Result<Json<TitleDetail>, ApiError> {
    authorize(&auth.actor(), Action::Update, ResourceKind::Title, None)?;
    validation::validate_title_patch(&payload)?;

    let (category_id, genre_ids) = resolve_title_refs(
        &state,
        payload.category.as_deref(),
        payload.genre.as_deref(),
    )
    .await?;

    let patch = TitlePatch {
        name: payload.name,
        year: payload.year,
        description: payload.description,
        category_id,
        genre_ids,
    };

    state
        .repo
        .update_title(title_id, patch)
        .await
        .map_err(internal)?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_title
///
/// [Admin Route] Deletes a title; its reviews and their comments cascade.
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}",
    params(("title_id" = Uuid, Path, description = "Title ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_title(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    authorize(&auth.actor(), Action::Delete, ResourceKind::Title, None)?;
    if state.repo.delete_title(title_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Review Handlers ---

/// list_reviews
///
/// [Public Route] Lists a title's reviews, newest first. 404 if the title
/// itself does not exist.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    params(("title_id" = Uuid, Path, description = "Title ID")),
    responses((status = 200, description = "Reviews", body = [Review]))
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, ApiError> {
    if !state.repo.title_exists(title_id).await {
        return Err(ApiError::NotFound);
    }
    Ok(Json(state.repo.list_reviews(title_id).await))
}

/// get_review_detail
///
/// [Public Route] One review, addressed through its title.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses((status = 200, description = "Found", body = Review))
)]
pub async fn get_review_detail(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, i64)>,
) -> Result<Json<Review>, ApiError> {
    state
        .repo
        .get_review(title_id, review_id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_review
///
/// [Authenticated Route] Posts a review. The author comes from the session.
///
/// *Consistency*: the validator pre-checks the one-review-per-author rule
/// with a point lookup, but the store's uniqueness constraint is the source
/// of truth; a violation at commit time yields the same rejection.
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    params(("title_id" = Uuid, Path, description = "Title ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 200, description = "Created", body = Review),
        (status = 400, description = "Invalid score or duplicate review")
    )
)]
pub async fn create_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(title_id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    if !state.repo.title_exists(title_id).await {
        return Err(ApiError::NotFound);
    }
    authorize(&auth.actor(), Action::Create, ResourceKind::Review, None)?;
    validation::validate_new_review(&payload)?;
    validation::check_unique_review(state.repo.as_ref(), title_id, auth.0.id).await?;

    let review = state
        .repo
        .create_review(title_id, auth.0.id, &payload.text, payload.score)
        .await
        .map_err(|e| conflict_or_internal(e, validation::duplicate_review()))?;

    Ok(Json(review))
}

/// update_review
///
/// [Authenticated Route] Partial update of a review. Allowed for the author
/// and for moderators and above; the resource is resolved before the
/// permission question so a missing review stays a 404.
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    request_body = UpdateReviewRequest,
    responses((status = 200, description = "Updated", body = Review))
)]
pub async fn update_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, i64)>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    let existing = state
        .repo
        .get_review(title_id, review_id)
        .await
        .ok_or(ApiError::NotFound)?;

    authorize(
        &auth.actor(),
        Action::Update,
        ResourceKind::Review,
        Some(existing.author_id),
    )?;
    validation::validate_review_patch(&payload)?;

    state
        .repo
        .update_review(review_id, payload.text, payload.score)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_review
///
/// [Authenticated Route] Deletes a review (author or moderator+). Comments on
/// the review cascade at the store level.
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not author or moderator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_review(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, i64)>,
) -> Result<StatusCode, ApiError> {
    let existing = state
        .repo
        .get_review(title_id, review_id)
        .await
        .ok_or(ApiError::NotFound)?;

    authorize(
        &auth.actor(),
        Action::Delete,
        ResourceKind::Review,
        Some(existing.author_id),
    )?;

    if state.repo.delete_review(title_id, review_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}

// --- Comment Handlers ---

/// list_comments
///
/// [Public Route] Lists the comments on a review, newest first. The review is
/// resolved through its title, so a mismatched pair is a 404.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    responses((status = 200, description = "Comments", body = [Comment]))
)]
pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, i64)>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    if state.repo.get_review(title_id, review_id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    Ok(Json(state.repo.list_comments(review_id).await))
}

/// get_comment_detail
///
/// [Public Route] One comment, addressed through its review.
#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses((status = 200, description = "Found", body = Comment))
)]
pub async fn get_comment_detail(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(Uuid, i64, i64)>,
) -> Result<Json<Comment>, ApiError> {
    if state.repo.get_review(title_id, review_id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    state
        .repo
        .get_comment(review_id, comment_id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// create_comment
///
/// [Authenticated Route] Posts a comment on a review.
#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID")
    ),
    request_body = CreateCommentRequest,
    responses((status = 200, description = "Created", body = Comment))
)]
pub async fn create_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(Uuid, i64)>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    if state.repo.get_review(title_id, review_id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    authorize(&auth.actor(), Action::Create, ResourceKind::Comment, None)?;

    let comment = state
        .repo
        .create_comment(review_id, auth.0.id, &payload.text)
        .await
        .map_err(internal)?;

    Ok(Json(comment))
}

/// update_comment
///
/// [Authenticated Route] Partial update of a comment (author or moderator+).
#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    request_body = UpdateCommentRequest,
    responses((status = 200, description = "Updated", body = Comment))
)]
pub async fn update_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(Uuid, i64, i64)>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<Json<Comment>, ApiError> {
    if state.repo.get_review(title_id, review_id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    let existing = state
        .repo
        .get_comment(review_id, comment_id)
        .await
        .ok_or(ApiError::NotFound)?;

    authorize(
        &auth.actor(),
        Action::Update,
        ResourceKind::Comment,
        Some(existing.author_id),
    )?;

    state
        .repo
        .update_comment(comment_id, payload.text)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound)
}

/// delete_comment
///
/// [Authenticated Route] Deletes a comment (author or moderator+).
#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    params(
        ("title_id" = Uuid, Path, description = "Title ID"),
        ("review_id" = i64, Path, description = "Review ID"),
        ("comment_id" = i64, Path, description = "Comment ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not author or moderator"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_comment(
    auth: AuthUser,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(Uuid, i64, i64)>,
) -> Result<StatusCode, ApiError> {
    if state.repo.get_review(title_id, review_id).await.is_none() {
        return Err(ApiError::NotFound);
    }
    let existing = state
        .repo
        .get_comment(review_id, comment_id)
        .await
        .ok_or(ApiError::NotFound)?;

    authorize(
        &auth.actor(),
        Action::Delete,
        ResourceKind::Comment,
        Some(existing.author_id),
    )?;

    if state.repo.delete_comment(review_id, comment_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
