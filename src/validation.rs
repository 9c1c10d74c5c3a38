use async_trait::async_trait;
use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::error::{ApiError, FieldError};
use crate::models::{
    CreateReviewRequest, CreateTitleRequest, CreateUserRequest, SignUpRequest, SlugPayload,
    TokenRequest, UpdateReviewRequest, UpdateTitleRequest, UpdateUserRequest, User,
};

// --- Field Rules ---

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const NAME_MAX_LEN: usize = 256;
pub const SCORE_MIN: i16 = 1;
pub const SCORE_MAX: i16 = 10;

// Reserved prefix: "me" collides with the self-service route segment.
// The check is a case-sensitive prefix match.
const RESERVED_USERNAME_PREFIX: &str = "me";

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

// Pragmatic RFC-5322 subset: dotted-atom local part with ./-/_ separators,
// hyphenated domain labels, 2+ letter TLD.
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([A-Za-z0-9]+[._-])*[A-Za-z0-9]+@[A-Za-z0-9-]+(\.[A-Za-z]{2,})+$").unwrap()
});

static SLUG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").unwrap());

/// Validates a username: character set, length, and the reserved `me` prefix.
pub fn validate_username(username: &str) -> Result<(), FieldError> {
    if username.is_empty()
        || username.len() > USERNAME_MAX_LEN
        || !USERNAME_RE.is_match(username)
    {
        return Err(FieldError::new(
            "username",
            "username may only contain letters, digits, '-' and '_' (max 150 characters)",
        ));
    }
    if username.starts_with(RESERVED_USERNAME_PREFIX) {
        return Err(FieldError::new("username", "username must not start with 'me'"));
    }
    Ok(())
}

/// Validates an email address against the pragmatic pattern above.
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    if email.is_empty() || email.len() > EMAIL_MAX_LEN || !EMAIL_RE.is_match(email) {
        return Err(FieldError::new("email", "enter a valid email address"));
    }
    Ok(())
}

/// Validates a title's release year: it must not lie in the future. There is
/// no lower bound.
pub fn validate_year(year: i32) -> Result<(), FieldError> {
    if year > Utc::now().year() {
        return Err(FieldError::new(
            "year",
            "year must not be later than the current year",
        ));
    }
    Ok(())
}

/// Validates a review score. The message is part of the API contract.
pub fn validate_score(score: i16) -> Result<(), FieldError> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(FieldError::new("score", "score must be between 1 and 10"));
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), FieldError> {
    if name.is_empty() || name.len() > NAME_MAX_LEN {
        return Err(FieldError::new(
            "name",
            "name must be between 1 and 256 characters",
        ));
    }
    Ok(())
}

fn validate_slug(slug: &str) -> Result<(), FieldError> {
    if slug.is_empty() || slug.len() > 50 || !SLUG_RE.is_match(slug) {
        return Err(FieldError::new(
            "slug",
            "slug may only contain letters, digits, '-' and '_' (max 50 characters)",
        ));
    }
    Ok(())
}

// Every public validate_* entry point below aggregates all field errors for
// the call instead of short-circuiting on the first, so a caller can surface
// every problem at once.

fn collect(checks: Vec<Result<(), FieldError>>) -> Result<(), ApiError> {
    let errors: Vec<FieldError> = checks.into_iter().filter_map(Result::err).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

/// Validates a sign-up payload (username + email).
pub fn validate_signup(req: &SignUpRequest) -> Result<(), ApiError> {
    collect(vec![
        validate_username(&req.username),
        validate_email(&req.email),
    ])
}

/// Validates an admin-facing user create payload.
pub fn validate_new_user(req: &CreateUserRequest) -> Result<(), ApiError> {
    collect(vec![
        validate_username(&req.username),
        validate_email(&req.email),
    ])
}

/// Validates an admin-facing user patch: only supplied fields are checked.
pub fn validate_user_patch(req: &UpdateUserRequest) -> Result<(), ApiError> {
    let mut checks = Vec::new();
    if let Some(username) = &req.username {
        checks.push(validate_username(username));
    }
    if let Some(email) = &req.email {
        checks.push(validate_email(email));
    }
    collect(checks)
}

/// Validates a category/genre payload (name + slug).
pub fn validate_slug_payload(req: &SlugPayload) -> Result<(), ApiError> {
    collect(vec![validate_name(&req.name), validate_slug(&req.slug)])
}

/// Validates a title create payload.
pub fn validate_new_title(req: &CreateTitleRequest) -> Result<(), ApiError> {
    collect(vec![validate_name(&req.name), validate_year(req.year)])
}

/// Validates a title patch: only supplied fields are checked.
pub fn validate_title_patch(req: &UpdateTitleRequest) -> Result<(), ApiError> {
    let mut checks = Vec::new();
    if let Some(name) = &req.name {
        checks.push(validate_name(name));
    }
    if let Some(year) = req.year {
        checks.push(validate_year(year));
    }
    collect(checks)
}

/// Validates a review create payload.
pub fn validate_new_review(req: &CreateReviewRequest) -> Result<(), ApiError> {
    collect(vec![validate_score(req.score)])
}

/// Validates a review patch: only supplied fields are checked.
pub fn validate_review_patch(req: &UpdateReviewRequest) -> Result<(), ApiError> {
    let mut checks = Vec::new();
    if let Some(score) = req.score {
        checks.push(validate_score(score));
    }
    collect(checks)
}

// --- Store-Backed Rules ---

/// MutationLookup
///
/// The narrow, read-only lookup capability the validator needs from the
/// persistence collaborator. Kept deliberately small so the validation layer
/// is testable against an in-memory implementation; the Postgres repository
/// implements it as a supertrait of `Repository`.
#[async_trait]
pub trait MutationLookup: Send + Sync {
    /// Point lookup: does a review by `author_id` already exist for `title_id`?
    async fn review_exists(&self, title_id: Uuid, author_id: Uuid) -> bool;

    /// Fetches a user by exact username, including the pending confirmation code.
    async fn find_user_by_username(&self, username: &str) -> Option<User>;
}

/// check_unique_review
///
/// Pre-checks the one-review-per-(title, author) invariant before an insert.
/// This is an optimization only: the store's uniqueness constraint remains the
/// source of truth, and a violation surfaced at commit time is translated to
/// the same rejection by the caller.
pub async fn check_unique_review<L: MutationLookup + ?Sized>(
    lookup: &L,
    title_id: Uuid,
    author_id: Uuid,
) -> Result<(), ApiError> {
    if lookup.review_exists(title_id, author_id).await {
        return Err(duplicate_review());
    }
    Ok(())
}

/// The fixed rejection for a second review by the same author on the same
/// title. Shared between the pre-check and the commit-time constraint
/// translation.
pub fn duplicate_review() -> ApiError {
    ApiError::Validation(vec![FieldError::non_field("duplicate review")])
}

/// validate_token_exchange
///
/// Accepts a `(username, confirm_code)` pair and resolves it to the matching
/// user. An unknown username is a NotFound scoped to the `username` field
/// (404); a known username with a non-matching code is the "unregistered
/// pair" rejection (400). A successful exchange does NOT consume the code:
/// the same pair keeps issuing tokens until the next sign-up replaces it.
pub async fn validate_token_exchange<L: MutationLookup + ?Sized>(
    lookup: &L,
    req: &TokenRequest,
) -> Result<User, ApiError> {
    let Some(user) = lookup.find_user_by_username(&req.username).await else {
        return Err(ApiError::NotFoundField(FieldError::new(
            "username",
            "user is not registered",
        )));
    };
    if user.confirm_code != Some(req.confirm_code) {
        return Err(ApiError::Validation(vec![FieldError::non_field(
            "unregistered pair",
        )]));
    }
    Ok(user)
}
