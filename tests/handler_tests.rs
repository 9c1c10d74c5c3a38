use async_trait::async_trait;
use axum::{Json, extract::Path, extract::State};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use critique::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    error::{ApiError, NON_FIELD_ERRORS},
    handlers,
    identity::{Identity, Role},
    mail::{MailerState, MockMailer},
    models::{
        Category, Comment, CreateReviewRequest, CreateTitleRequest, CreateUserRequest, Genre,
        NewTitle, Review, SignUpRequest, SlugPayload, TitleDetail, TitleFilter, TitlePatch,
        TokenRequest, UpdateReviewRequest, UpdateUserRequest, User,
    },
    repository::{RepoError, RepoResult, Repository, RepositoryState},
    validation::MutationLookup,
};

// --- MOCK REPOSITORY IMPLEMENTATION ---

// In-memory repository mock. Handlers rely on the Repository trait, so the
// mock implements the contract over Vec-backed tables, including the
// uniqueness behavior the store would enforce.
#[derive(Default)]
struct MockRepo {
    users: Mutex<Vec<User>>,
    categories: Mutex<Vec<Category>>,
    genres: Mutex<Vec<Genre>>,
    titles: Mutex<Vec<TitleDetail>>,
    reviews: Mutex<Vec<Review>>,
    comments: Mutex<Vec<Comment>>,
    // Forces get_or_create_user to report a store-level unique violation.
    signup_conflict: bool,
}

impl MockRepo {
    fn with_user(self, user: User) -> Self {
        self.users.lock().unwrap().push(user);
        self
    }

    fn with_title(self, title: TitleDetail) -> Self {
        self.titles.lock().unwrap().push(title);
        self
    }

    fn with_review(self, review: Review) -> Self {
        self.reviews.lock().unwrap().push(review);
        self
    }

    fn with_comment(self, comment: Comment) -> Self {
        self.comments.lock().unwrap().push(comment);
        self
    }
}

#[async_trait]
impl MutationLookup for MockRepo {
    async fn review_exists(&self, title_id: Uuid, author_id: Uuid) -> bool {
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .any(|r| r.title_id == title_id && r.author_id == author_id)
    }

    async fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned()
    }
}

#[async_trait]
impl Repository for MockRepo {
    async fn get_user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().iter().find(|u| u.id == id).cloned()
    }

    async fn list_users(&self, search: Option<String>) -> Vec<User> {
        let users = self.users.lock().unwrap();
        match search {
            Some(s) => users.iter().filter(|u| u.username.contains(&s)).cloned().collect(),
            None => users.clone(),
        }
    }

    async fn get_or_create_user(&self, username: &str, email: &str) -> RepoResult<User> {
        if self.signup_conflict {
            return Err(RepoError::UniqueViolation);
        }
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users
            .iter()
            .find(|u| u.username == username && u.email == email)
        {
            return Ok(user.clone());
        }
        if users.iter().any(|u| u.username == username || u.email == email) {
            return Err(RepoError::UniqueViolation);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            ..User::default()
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn set_confirm_code(&self, user_id: Uuid, code: Uuid) -> bool {
        let mut users = self.users.lock().unwrap();
        match users.iter_mut().find(|u| u.id == user_id) {
            Some(user) => {
                user.confirm_code = Some(code);
                true
            }
            None => false,
        }
    }

    async fn create_user(&self, req: CreateUserRequest) -> RepoResult<User> {
        let mut users = self.users.lock().unwrap();
        if users
            .iter()
            .any(|u| u.username == req.username || u.email == req.email)
        {
            return Err(RepoError::UniqueViolation);
        }
        let user = User {
            id: Uuid::new_v4(),
            username: req.username,
            email: req.email,
            role: req.role.unwrap_or_default(),
            first_name: req.first_name,
            last_name: req.last_name,
            bio: req.bio,
            confirm_code: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        username: &str,
        req: UpdateUserRequest,
    ) -> RepoResult<Option<User>> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.iter_mut().find(|u| u.username == username) else {
            return Ok(None);
        };
        if let Some(new_username) = req.username {
            user.username = new_username;
        }
        if let Some(email) = req.email {
            user.email = email;
        }
        if let Some(first_name) = req.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = req.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(bio) = req.bio {
            user.bio = Some(bio);
        }
        if let Some(role) = req.role {
            user.role = role;
        }
        Ok(Some(user.clone()))
    }

    async fn update_profile(&self, id: Uuid, req: UpdateUserRequest) -> Option<User> {
        let mut users = self.users.lock().unwrap();
        let user = users.iter_mut().find(|u| u.id == id)?;
        // Mirrors the store contract: only profile fields are applied.
        if let Some(first_name) = req.first_name {
            user.first_name = Some(first_name);
        }
        if let Some(last_name) = req.last_name {
            user.last_name = Some(last_name);
        }
        if let Some(bio) = req.bio {
            user.bio = Some(bio);
        }
        Some(user.clone())
    }

    async fn delete_user(&self, username: &str) -> bool {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.username != username);
        users.len() < before
    }

    async fn list_categories(&self, _search: Option<String>) -> Vec<Category> {
        self.categories.lock().unwrap().clone()
    }

    async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        self.categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.slug == slug)
            .cloned()
    }

    async fn create_category(&self, name: &str, slug: &str) -> RepoResult<Category> {
        let mut categories = self.categories.lock().unwrap();
        if categories.iter().any(|c| c.slug == slug) {
            return Err(RepoError::UniqueViolation);
        }
        let category = Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        categories.push(category.clone());
        Ok(category)
    }

    async fn delete_category(&self, slug: &str) -> bool {
        let mut categories = self.categories.lock().unwrap();
        let before = categories.len();
        categories.retain(|c| c.slug != slug);
        categories.len() < before
    }

    async fn list_genres(&self, _search: Option<String>) -> Vec<Genre> {
        self.genres.lock().unwrap().clone()
    }

    async fn get_genre_by_slug(&self, slug: &str) -> Option<Genre> {
        self.genres.lock().unwrap().iter().find(|g| g.slug == slug).cloned()
    }

    async fn create_genre(&self, name: &str, slug: &str) -> RepoResult<Genre> {
        let mut genres = self.genres.lock().unwrap();
        if genres.iter().any(|g| g.slug == slug) {
            return Err(RepoError::UniqueViolation);
        }
        let genre = Genre {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slug.to_string(),
        };
        genres.push(genre.clone());
        Ok(genre)
    }

    async fn delete_genre(&self, slug: &str) -> bool {
        let mut genres = self.genres.lock().unwrap();
        let before = genres.len();
        genres.retain(|g| g.slug != slug);
        genres.len() < before
    }

    async fn list_titles(&self, _filter: TitleFilter) -> Vec<TitleDetail> {
        self.titles.lock().unwrap().clone()
    }

    async fn get_title(&self, id: Uuid) -> Option<TitleDetail> {
        self.titles.lock().unwrap().iter().find(|t| t.id == id).cloned()
    }

    async fn title_exists(&self, id: Uuid) -> bool {
        self.titles.lock().unwrap().iter().any(|t| t.id == id)
    }

    async fn create_title(&self, new: NewTitle) -> RepoResult<TitleDetail> {
        let category = self
            .categories
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == new.category_id)
            .cloned()
            .unwrap_or_default();
        let genre = {
            let genres = self.genres.lock().unwrap();
            new.genre_ids
                .iter()
                .filter_map(|id| genres.iter().find(|g| g.id == *id).cloned())
                .collect()
        };
        let title = TitleDetail {
            id: Uuid::new_v4(),
            name: new.name,
            year: new.year,
            rating: None,
            description: new.description,
            genre,
            category,
        };
        self.titles.lock().unwrap().push(title.clone());
        Ok(title)
    }

    async fn update_title(&self, id: Uuid, patch: TitlePatch) -> RepoResult<Option<TitleDetail>> {
        let mut titles = self.titles.lock().unwrap();
        let Some(title) = titles.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        if let Some(name) = patch.name {
            title.name = name;
        }
        if let Some(year) = patch.year {
            title.year = year;
        }
        if let Some(description) = patch.description {
            title.description = Some(description);
        }
        Ok(Some(title.clone()))
    }

    async fn delete_title(&self, id: Uuid) -> bool {
        let mut titles = self.titles.lock().unwrap();
        let before = titles.len();
        titles.retain(|t| t.id != id);
        titles.len() < before
    }

    async fn list_reviews(&self, title_id: Uuid) -> Vec<Review> {
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.title_id == title_id)
            .cloned()
            .collect()
    }

    async fn get_review(&self, title_id: Uuid, review_id: i64) -> Option<Review> {
        self.reviews
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == review_id && r.title_id == title_id)
            .cloned()
    }

    async fn create_review(
        &self,
        title_id: Uuid,
        author_id: Uuid,
        text: &str,
        score: i16,
    ) -> RepoResult<Review> {
        let mut reviews = self.reviews.lock().unwrap();
        if reviews
            .iter()
            .any(|r| r.title_id == title_id && r.author_id == author_id)
        {
            return Err(RepoError::UniqueViolation);
        }
        let review = Review {
            id: reviews.len() as i64 + 1,
            title_id,
            author_id,
            author: None,
            text: text.to_string(),
            score,
            pub_date: chrono::Utc::now(),
        };
        reviews.push(review.clone());
        Ok(review)
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Option<Review> {
        let mut reviews = self.reviews.lock().unwrap();
        let review = reviews.iter_mut().find(|r| r.id == review_id)?;
        if let Some(text) = text {
            review.text = text;
        }
        if let Some(score) = score {
            review.score = score;
        }
        Some(review.clone())
    }

    async fn delete_review(&self, title_id: Uuid, review_id: i64) -> bool {
        let mut reviews = self.reviews.lock().unwrap();
        let before = reviews.len();
        reviews.retain(|r| !(r.id == review_id && r.title_id == title_id));
        reviews.len() < before
    }

    async fn list_comments(&self, review_id: i64) -> Vec<Comment> {
        self.comments
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.review_id == review_id)
            .cloned()
            .collect()
    }

    async fn get_comment(&self, review_id: i64, comment_id: i64) -> Option<Comment> {
        self.comments
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == comment_id && c.review_id == review_id)
            .cloned()
    }

    async fn create_comment(
        &self,
        review_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> RepoResult<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let comment = Comment {
            id: comments.len() as i64 + 1,
            review_id,
            author_id,
            author: None,
            text: text.to_string(),
            pub_date: chrono::Utc::now(),
        };
        comments.push(comment.clone());
        Ok(comment)
    }

    async fn update_comment(&self, comment_id: i64, text: Option<String>) -> Option<Comment> {
        let mut comments = self.comments.lock().unwrap();
        let comment = comments.iter_mut().find(|c| c.id == comment_id)?;
        if let Some(text) = text {
            comment.text = text;
        }
        Some(comment.clone())
    }

    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> bool {
        let mut comments = self.comments.lock().unwrap();
        let before = comments.len();
        comments.retain(|c| !(c.id == comment_id && c.review_id == review_id));
        comments.len() < before
    }
}

// --- Test Scaffolding ---

fn state_with(repo: MockRepo) -> (AppState, Arc<MockMailer>) {
    let mailer = Arc::new(MockMailer::new());
    let state = AppState {
        repo: Arc::new(repo) as RepositoryState,
        mailer: mailer.clone() as MailerState,
        config: AppConfig::default(),
    };
    (state, mailer)
}

fn auth_as(id: Uuid, role: Role) -> AuthUser {
    AuthUser(Identity {
        id,
        username: "critic".to_string(),
        role,
    })
}

fn seeded_user(username: &str, role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        username: username.to_string(),
        email: format!("{username}@example.com"),
        role,
        ..User::default()
    }
}

fn seeded_title() -> TitleDetail {
    TitleDetail {
        id: Uuid::new_v4(),
        name: "Solaris".to_string(),
        year: 1972,
        ..TitleDetail::default()
    }
}

fn seeded_review(title_id: Uuid, author_id: Uuid) -> Review {
    Review {
        id: 1,
        title_id,
        author_id,
        text: "slow but worth it".to_string(),
        score: 8,
        pub_date: chrono::Utc::now(),
        author: None,
    }
}

// --- Sign-Up ---

#[tokio::test]
async fn signup_persists_code_before_mailing() {
    let (state, mailer) = state_with(MockRepo::default());

    let payload = SignUpRequest {
        email: "reader@example.com".to_string(),
        username: "reader".to_string(),
    };
    let result = handlers::sign_up(State(state.clone()), Json(payload)).await;
    assert!(result.is_ok());

    // The code was persisted...
    let user = state
        .repo
        .find_user_by_username("reader")
        .await
        .expect("user created");
    let code = user.confirm_code.expect("code persisted");

    // ...and the mail carries exactly that code.
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "reader@example.com");
    assert!(sent[0].body.contains(&code.to_string()));
}

#[tokio::test]
async fn signup_survives_mail_failure() {
    let mailer = Arc::new(MockMailer::new_failing());
    let state = AppState {
        repo: Arc::new(MockRepo::default()) as RepositoryState,
        mailer: mailer.clone() as MailerState,
        config: AppConfig::default(),
    };

    let payload = SignUpRequest {
        email: "reader@example.com".to_string(),
        username: "reader".to_string(),
    };
    // Fire-and-forget: the send failure must not fail the request or roll
    // back the persisted code.
    let result = handlers::sign_up(State(state.clone()), Json(payload)).await;
    assert!(result.is_ok());

    let user = state.repo.find_user_by_username("reader").await.unwrap();
    assert!(user.confirm_code.is_some());
}

#[tokio::test]
async fn signup_rejects_reserved_username() {
    let (state, mailer) = state_with(MockRepo::default());

    let payload = SignUpRequest {
        email: "x@y.com".to_string(),
        username: "me_admin".to_string(),
    };
    let err = handlers::sign_up(State(state), Json(payload)).await.unwrap_err();
    let ApiError::Validation(errors) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(errors[0].field, "username");
    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn signup_conflict_maps_to_email_field() {
    let repo = MockRepo {
        signup_conflict: true,
        ..Default::default()
    };
    let (state, _) = state_with(repo);

    let payload = SignUpRequest {
        email: "taken@example.com".to_string(),
        username: "newcomer".to_string(),
    };
    let err = handlers::sign_up(State(state), Json(payload)).await.unwrap_err();
    let ApiError::Conflict(field) = err else {
        panic!("expected conflict");
    };
    assert_eq!(field.field, "email");
}

// --- Token Issuance ---

#[tokio::test]
async fn token_exchange_issues_a_decodable_token_and_allows_replay() {
    let code = Uuid::new_v4();
    let mut user = seeded_user("reader", Role::User);
    user.confirm_code = Some(code);
    let user_id = user.id;
    let (state, _) = state_with(MockRepo::default().with_user(user));

    let payload = TokenRequest {
        username: "reader".to_string(),
        confirm_code: code,
    };

    // The code is not invalidated by a successful exchange; the same pair
    // keeps issuing tokens.
    for _ in 0..2 {
        let Json(token) = handlers::obtain_token(State(state.clone()), Json(payload.clone()))
            .await
            .expect("exchange accepted");

        let decoded = jsonwebtoken::decode::<critique::auth::Claims>(
            &token.access,
            &jsonwebtoken::DecodingKey::from_secret(state.config.jwt_secret.as_bytes()),
            &jsonwebtoken::Validation::default(),
        )
        .expect("token decodes with the configured secret");
        assert_eq!(decoded.claims.sub, user_id);
    }
}

#[tokio::test]
async fn token_exchange_distinguishes_unknown_user_from_wrong_code() {
    let mut user = seeded_user("reader", Role::User);
    user.confirm_code = Some(Uuid::new_v4());
    let (state, _) = state_with(MockRepo::default().with_user(user));

    let ghost = TokenRequest {
        username: "ghost".to_string(),
        confirm_code: Uuid::new_v4(),
    };
    assert!(matches!(
        handlers::obtain_token(State(state.clone()), Json(ghost)).await,
        Err(ApiError::NotFoundField(f)) if f.field == "username"
    ));

    let wrong_code = TokenRequest {
        username: "reader".to_string(),
        confirm_code: Uuid::new_v4(),
    };
    assert!(matches!(
        handlers::obtain_token(State(state), Json(wrong_code)).await,
        Err(ApiError::Validation(errors)) if errors[0].message == "unregistered pair"
    ));
}

// --- Self-Service Profile ---

#[tokio::test]
async fn me_patch_silently_ignores_identity_fields() {
    let user = seeded_user("reader", Role::User);
    let user_id = user.id;
    let (state, _) = state_with(MockRepo::default().with_user(user));

    let payload = UpdateUserRequest {
        username: Some("hijacked".to_string()),
        email: Some("hijacked@example.com".to_string()),
        role: Some(Role::Admin),
        bio: Some("keeps notebooks of favorite quotes".to_string()),
        ..UpdateUserRequest::default()
    };

    let Json(updated) = handlers::update_me(
        auth_as(user_id, Role::User),
        State(state),
        Json(payload),
    )
    .await
    .expect("patch accepted");

    // Identity fields unchanged, profile fields applied, no error raised.
    assert_eq!(updated.username, "reader");
    assert_eq!(updated.email, "reader@example.com");
    assert_eq!(updated.role, Role::User);
    assert_eq!(updated.bio.as_deref(), Some("keeps notebooks of favorite quotes"));
}

// --- Reviews ---

#[tokio::test]
async fn second_review_by_same_author_is_rejected() {
    let title = seeded_title();
    let title_id = title.id;
    let author = Uuid::new_v4();
    let repo = MockRepo::default()
        .with_title(title)
        .with_review(seeded_review(title_id, author));
    let (state, _) = state_with(repo);

    let payload = CreateReviewRequest {
        text: "changed my mind".to_string(),
        score: 3,
    };
    let err = handlers::create_review(
        auth_as(author, Role::User),
        State(state),
        Path(title_id),
        Json(payload),
    )
    .await
    .unwrap_err();

    let ApiError::Validation(errors) = err else {
        panic!("expected duplicate rejection");
    };
    assert_eq!(errors[0].field, NON_FIELD_ERRORS);
    assert_eq!(errors[0].message, "duplicate review");
}

#[tokio::test]
async fn different_author_can_review_the_same_title() {
    let title = seeded_title();
    let title_id = title.id;
    let repo = MockRepo::default()
        .with_title(title)
        .with_review(seeded_review(title_id, Uuid::new_v4()));
    let (state, _) = state_with(repo);

    let payload = CreateReviewRequest {
        text: "a classic".to_string(),
        score: 10,
    };
    let result = handlers::create_review(
        auth_as(Uuid::new_v4(), Role::User),
        State(state),
        Path(title_id),
        Json(payload),
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn out_of_range_score_is_rejected_with_the_fixed_message() {
    let title = seeded_title();
    let title_id = title.id;
    let (state, _) = state_with(MockRepo::default().with_title(title));

    let payload = CreateReviewRequest {
        text: "!!".to_string(),
        score: 11,
    };
    let err = handlers::create_review(
        auth_as(Uuid::new_v4(), Role::User),
        State(state),
        Path(title_id),
        Json(payload),
    )
    .await
    .unwrap_err();

    let ApiError::Validation(errors) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(errors[0].field, "score");
    assert_eq!(errors[0].message, "score must be between 1 and 10");
}

#[tokio::test]
async fn review_update_is_author_or_moderator_only() {
    let title = seeded_title();
    let title_id = title.id;
    let author = Uuid::new_v4();
    let repo = MockRepo::default()
        .with_title(title)
        .with_review(seeded_review(title_id, author));
    let (state, _) = state_with(repo);

    let patch = UpdateReviewRequest {
        text: Some("edited".to_string()),
        score: None,
    };

    // A stranger with the plain user role is denied...
    let err = handlers::update_review(
        auth_as(Uuid::new_v4(), Role::User),
        State(state.clone()),
        Path((title_id, 1)),
        Json(patch.clone()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied));

    // ...a moderator is not.
    let result = handlers::update_review(
        auth_as(Uuid::new_v4(), Role::Moderator),
        State(state),
        Path((title_id, 1)),
        Json(patch),
    )
    .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn missing_review_is_not_found_before_permission_is_asked() {
    let title = seeded_title();
    let title_id = title.id;
    let (state, _) = state_with(MockRepo::default().with_title(title));

    // No review exists: even an unprivileged stranger sees 404, not 403.
    let err = handlers::update_review(
        auth_as(Uuid::new_v4(), Role::User),
        State(state),
        Path((title_id, 99)),
        Json(UpdateReviewRequest::default()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

// --- Comments ---

#[tokio::test]
async fn comment_delete_is_author_or_moderator_only() {
    let title = seeded_title();
    let title_id = title.id;
    let author = Uuid::new_v4();
    let comment = Comment {
        id: 1,
        review_id: 1,
        author_id: author,
        text: "agreed".to_string(),
        pub_date: chrono::Utc::now(),
        author: None,
    };
    let repo = MockRepo::default()
        .with_title(title)
        .with_review(seeded_review(title_id, Uuid::new_v4()))
        .with_comment(comment);
    let (state, _) = state_with(repo);

    let err = handlers::delete_comment(
        auth_as(Uuid::new_v4(), Role::User),
        State(state.clone()),
        Path((title_id, 1, 1)),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied));

    let status = handlers::delete_comment(
        auth_as(author, Role::User),
        State(state),
        Path((title_id, 1, 1)),
    )
    .await
    .expect("author may delete");
    assert_eq!(status, axum::http::StatusCode::NO_CONTENT);
}

// --- Catalog Administration ---

#[tokio::test]
async fn category_creation_is_admin_gated_and_slug_unique() {
    let (state, _) = state_with(MockRepo::default());

    let payload = SlugPayload {
        name: "Films".to_string(),
        slug: "films".to_string(),
    };

    let err = handlers::create_category(
        auth_as(Uuid::new_v4(), Role::User),
        State(state.clone()),
        Json(payload.clone()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied));

    let admin = auth_as(Uuid::new_v4(), Role::Admin);
    let result =
        handlers::create_category(admin.clone(), State(state.clone()), Json(payload.clone())).await;
    assert!(result.is_ok());

    // Same slug again: the store constraint answers.
    let err = handlers::create_category(admin, State(state), Json(payload))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(f) if f.field == "slug"));
}

#[tokio::test]
async fn title_creation_reports_each_unknown_slug() {
    let (state, _) = state_with(MockRepo::default());

    let payload = CreateTitleRequest {
        name: "Solaris".to_string(),
        year: 1972,
        description: None,
        genre: vec!["sci-fi".to_string()],
        category: "films".to_string(),
    };
    let err = handlers::create_title(
        auth_as(Uuid::new_v4(), Role::Admin),
        State(state),
        Json(payload),
    )
    .await
    .unwrap_err();

    let ApiError::Validation(errors) = err else {
        panic!("expected validation failure");
    };
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().any(|e| e.field == "category"));
    assert!(errors.iter().any(|e| e.field == "genre"));
}

#[tokio::test]
async fn admin_user_creation_validates_fields() {
    let (state, _) = state_with(MockRepo::default());

    let payload = CreateUserRequest {
        username: "valid_name".to_string(),
        email: "broken".to_string(),
        ..CreateUserRequest::default()
    };
    let err = handlers::create_user(
        auth_as(Uuid::new_v4(), Role::Admin),
        State(state),
        Json(payload),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(errors) if errors[0].field == "email"));
}
