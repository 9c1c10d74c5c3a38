use async_trait::async_trait;
use chrono::{Datelike, Utc};
use critique::error::{ApiError, NON_FIELD_ERRORS};
use critique::models::{SignUpRequest, TokenRequest, User};
use critique::validation::{
    MutationLookup, check_unique_review, validate_email, validate_score, validate_signup,
    validate_token_exchange, validate_username, validate_year,
};
use uuid::Uuid;

// --- In-Memory Lookup (the validator's narrow capability, no store) ---

#[derive(Default)]
struct InMemoryLookup {
    users: Vec<User>,
    reviews: Vec<(Uuid, Uuid)>,
}

#[async_trait]
impl MutationLookup for InMemoryLookup {
    async fn review_exists(&self, title_id: Uuid, author_id: Uuid) -> bool {
        self.reviews.contains(&(title_id, author_id))
    }

    async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users.iter().find(|u| u.username == username).cloned()
    }
}

fn registered_user(username: &str, code: Uuid) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        confirm_code: Some(code),
        ..User::default()
    }
}

// --- Username ---

#[test]
fn reserved_me_prefix_is_rejected() {
    for username in ["me", "me_admin", "median", "me-2"] {
        let err = validate_username(username).expect_err(username);
        assert_eq!(err.field, "username");
    }
}

#[test]
fn me_prefix_check_is_case_sensitive() {
    assert!(validate_username("Me_admin").is_ok());
    assert!(validate_username("ME").is_ok());
}

#[test]
fn username_character_set() {
    assert!(validate_username("good-user_1").is_ok());
    for username in ["", "bad user", "tom@home", "semi;colon"] {
        let err = validate_username(username).expect_err(username);
        assert_eq!(err.field, "username");
    }
}

#[test]
fn username_length_cap() {
    assert!(validate_username(&"a".repeat(150)).is_ok());
    assert!(validate_username(&"a".repeat(151)).is_err());
}

// --- Email ---

#[test]
fn well_formed_emails_accepted() {
    for email in ["a.b-c@d.com", "user@mail.example.org", "x@y.co"] {
        assert!(validate_email(email).is_ok(), "{email} should be valid");
    }
}

#[test]
fn malformed_emails_rejected() {
    for email in ["", "plainaddress", "a@b", "a@b.c", "a b@c.com", "@d.com", "a@.com"] {
        let err = validate_email(email).expect_err(email);
        assert_eq!(err.field, "email");
    }
}

#[test]
fn email_length_cap() {
    let long = format!("{}@example.com", "a".repeat(250));
    assert!(long.len() > 254);
    assert!(validate_email(&long).is_err());
}

// --- Year & Score ---

#[test]
fn current_year_is_the_inclusive_upper_bound() {
    let current = Utc::now().year();
    assert!(validate_year(current).is_ok());
    assert!(validate_year(current - 100).is_ok());
    let err = validate_year(current + 1).unwrap_err();
    assert_eq!(err.field, "year");
}

#[test]
fn score_bounds_are_inclusive() {
    assert!(validate_score(1).is_ok());
    assert!(validate_score(10).is_ok());
    for score in [0, 11, -3] {
        let err = validate_score(score).unwrap_err();
        assert_eq!(err.field, "score");
        assert_eq!(err.message, "score must be between 1 and 10");
    }
}

// --- Aggregation ---

#[test]
fn signup_errors_are_aggregated_not_short_circuited() {
    let req = SignUpRequest {
        username: "me_bot".to_string(),
        email: "not-an-email".to_string(),
    };
    let Err(ApiError::Validation(errors)) = validate_signup(&req) else {
        panic!("expected aggregated validation failure");
    };
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.field == "username"));
    assert!(errors.iter().any(|e| e.field == "email"));
}

// --- Review Uniqueness Pre-Check ---

#[tokio::test]
async fn duplicate_review_is_rejected() {
    let title = Uuid::new_v4();
    let author = Uuid::new_v4();
    let lookup = InMemoryLookup {
        reviews: vec![(title, author)],
        ..Default::default()
    };

    let Err(ApiError::Validation(errors)) = check_unique_review(&lookup, title, author).await
    else {
        panic!("expected duplicate rejection");
    };
    assert_eq!(errors[0].field, NON_FIELD_ERRORS);
    assert_eq!(errors[0].message, "duplicate review");
}

#[tokio::test]
async fn different_author_may_review_the_same_title() {
    let title = Uuid::new_v4();
    let lookup = InMemoryLookup {
        reviews: vec![(title, Uuid::new_v4())],
        ..Default::default()
    };
    assert!(check_unique_review(&lookup, title, Uuid::new_v4()).await.is_ok());
}

// --- Token Exchange ---

#[tokio::test]
async fn unknown_username_is_not_found_on_the_username_field() {
    let lookup = InMemoryLookup::default();
    let req = TokenRequest {
        username: "ghost".to_string(),
        confirm_code: Uuid::new_v4(),
    };

    let Err(ApiError::NotFoundField(err)) = validate_token_exchange(&lookup, &req).await else {
        panic!("expected field-scoped not-found");
    };
    assert_eq!(err.field, "username");
}

#[tokio::test]
async fn wrong_code_is_an_unregistered_pair() {
    let lookup = InMemoryLookup {
        users: vec![registered_user("reader", Uuid::new_v4())],
        ..Default::default()
    };
    let req = TokenRequest {
        username: "reader".to_string(),
        confirm_code: Uuid::new_v4(),
    };

    let Err(ApiError::Validation(errors)) = validate_token_exchange(&lookup, &req).await else {
        panic!("expected unregistered-pair rejection");
    };
    assert_eq!(errors[0].field, NON_FIELD_ERRORS);
    assert_eq!(errors[0].message, "unregistered pair");
}

#[tokio::test]
async fn matching_pair_resolves_the_user_and_is_repeatable() {
    let code = Uuid::new_v4();
    let user = registered_user("reader", code);
    let user_id = user.id;
    let lookup = InMemoryLookup {
        users: vec![user],
        ..Default::default()
    };
    let req = TokenRequest {
        username: "reader".to_string(),
        confirm_code: code,
    };

    // The exchange is stateless: the code is not consumed, so the same pair
    // validates indefinitely.
    for _ in 0..2 {
        let resolved = validate_token_exchange(&lookup, &req).await.expect("valid pair");
        assert_eq!(resolved.id, user_id);
    }
}

// --- Purity ---

#[test]
fn validators_are_idempotent() {
    let first = validate_username("me_bot");
    let second = validate_username("me_bot");
    assert_eq!(first, second);

    let first = validate_email("a.b-c@d.com");
    let second = validate_email("a.b-c@d.com");
    assert_eq!(first, second);
}
