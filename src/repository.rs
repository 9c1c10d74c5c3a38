use crate::models::{
    Category, Comment, CreateUserRequest, Genre, NewTitle, Review, TitleDetail, TitleFilter,
    TitlePatch, UpdateUserRequest, User,
};
use crate::validation::MutationLookup;
use async_trait::async_trait;
use sqlx::{FromRow, PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// RepoError
///
/// The persistence layer's error split. Uniqueness violations are classified
/// separately because they are load-bearing for the API contract: the store's
/// constraints are the source of truth for the review-per-author and
/// username/email invariants, and callers translate `UniqueViolation` into
/// field-scoped conflict errors.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("unique constraint violated")]
    UniqueViolation,
    #[error(transparent)]
    Database(sqlx::Error),
}

impl RepoError {
    /// Splits a driver error into the two cases callers care about.
    pub fn classify(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::UniqueViolation,
            _ => RepoError::Database(err),
        }
    }
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository Trait
///
/// Defines the abstract contract for all persistence operations, allowing the
/// handlers to interact with the data layer without knowing the specific
/// implementation (Postgres, Mock, etc.). `MutationLookup` is a supertrait so
/// the validation layer can borrow the same object through its narrow
/// read-only capability.
///
/// **Send + Sync + async_trait** are required to make the trait object
/// (`Arc<dyn Repository>`) safely shareable across Axum's async task
/// boundaries.
#[async_trait]
pub trait Repository: MutationLookup {
    // --- Users ---
    async fn get_user(&self, id: Uuid) -> Option<User>;
    // Admin listing with username substring search.
    async fn list_users(&self, search: Option<String>) -> Vec<User>;
    // Sign-up path: fetch the exact (username, email) pair or insert it.
    // A unique violation on the insert means one of the two fields belongs to
    // a different user.
    async fn get_or_create_user(&self, username: &str, email: &str) -> RepoResult<User>;
    // Replaces the pending confirmation code. Returns false if the user vanished.
    async fn set_confirm_code(&self, user_id: Uuid, code: Uuid) -> bool;
    async fn create_user(&self, req: CreateUserRequest) -> RepoResult<User>;
    // Admin partial update, addressed by username. May hit unique constraints.
    async fn update_user(&self, username: &str, req: UpdateUserRequest)
    -> RepoResult<Option<User>>;
    // Self-service partial update: only profile fields (first/last name, bio)
    // are in the column list; username, email and role are silently ignored.
    async fn update_profile(&self, id: Uuid, req: UpdateUserRequest) -> Option<User>;
    async fn delete_user(&self, username: &str) -> bool;

    // --- Categories & Genres ---
    async fn list_categories(&self, search: Option<String>) -> Vec<Category>;
    async fn get_category_by_slug(&self, slug: &str) -> Option<Category>;
    async fn create_category(&self, name: &str, slug: &str) -> RepoResult<Category>;
    async fn delete_category(&self, slug: &str) -> bool;
    async fn list_genres(&self, search: Option<String>) -> Vec<Genre>;
    async fn get_genre_by_slug(&self, slug: &str) -> Option<Genre>;
    async fn create_genre(&self, name: &str, slug: &str) -> RepoResult<Genre>;
    async fn delete_genre(&self, slug: &str) -> bool;

    // --- Titles ---
    async fn list_titles(&self, filter: TitleFilter) -> Vec<TitleDetail>;
    async fn get_title(&self, id: Uuid) -> Option<TitleDetail>;
    async fn title_exists(&self, id: Uuid) -> bool;
    async fn create_title(&self, new: NewTitle) -> RepoResult<TitleDetail>;
    async fn update_title(&self, id: Uuid, patch: TitlePatch) -> RepoResult<Option<TitleDetail>>;
    async fn delete_title(&self, id: Uuid) -> bool;

    // --- Reviews ---
    async fn list_reviews(&self, title_id: Uuid) -> Vec<Review>;
    async fn get_review(&self, title_id: Uuid, review_id: i64) -> Option<Review>;
    // The (title_id, author_id) uniqueness constraint fires here; callers
    // treat that as authoritative over the validator pre-check.
    async fn create_review(
        &self,
        title_id: Uuid,
        author_id: Uuid,
        text: &str,
        score: i16,
    ) -> RepoResult<Review>;
    async fn update_review(
        &self,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Option<Review>;
    async fn delete_review(&self, title_id: Uuid, review_id: i64) -> bool;

    // --- Comments ---
    async fn list_comments(&self, review_id: i64) -> Vec<Comment>;
    async fn get_comment(&self, review_id: i64, comment_id: i64) -> Option<Comment>;
    async fn create_comment(
        &self,
        review_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> RepoResult<Comment>;
    async fn update_comment(&self, comment_id: i64, text: Option<String>) -> Option<Comment>;
    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> bool;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer access across the
/// application state.
pub type RepositoryState = Arc<dyn Repository>;

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by the
/// PostgreSQL database. All queries use the runtime-checked form so the crate
/// builds without a live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads the genre set for one title, ordered by name.
    async fn genres_for_title(&self, title_id: Uuid) -> Vec<Genre> {
        sqlx::query_as::<_, Genre>(
            r#"
            SELECT g.id, g.name, g.slug
            FROM genres g
            JOIN title_genres tg ON g.id = tg.genre_id
            WHERE tg.title_id = $1
            ORDER BY g.name
            "#,
        )
        .bind(title_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("genres_for_title error: {:?}", e);
            vec![]
        })
    }

    /// Expands a flat title row into the response shape with its genre set.
    async fn assemble_title(&self, row: TitleRow) -> TitleDetail {
        let genre = self.genres_for_title(row.id).await;
        TitleDetail {
            id: row.id,
            name: row.name,
            year: row.year,
            rating: row.rating,
            description: row.description,
            genre,
            category: Category {
                id: row.category_id,
                name: row.category_name,
                slug: row.category_slug,
            },
        }
    }
}

// All user SELECTs return the same column set so they map onto `User`
// uniformly, including the pending confirmation code.
const USER_COLUMNS: &str = "id, username, email, role, first_name, last_name, bio, confirm_code";

/// Flat row shape for title queries: the category joined in, the rating
/// recomputed per row as the mean review score (`NULL` when no reviews exist).
#[derive(Debug, FromRow)]
struct TitleRow {
    id: Uuid,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Uuid,
    category_name: String,
    category_slug: String,
    rating: Option<f64>,
}

// Shared SELECT head for title queries; filters and ORDER BY are appended.
const TITLE_QUERY: &str = r#"
    SELECT t.id, t.name, t.year, t.description,
           c.id AS category_id, c.name AS category_name, c.slug AS category_slug,
           (SELECT AVG(r.score)::float8 FROM reviews r WHERE r.title_id = t.id) AS rating
    FROM titles t
    JOIN categories c ON t.category_id = c.id
    WHERE 1 = 1
"#;

// Review rows are always returned enriched with the author's username.
const REVIEW_SELECT: &str = r#"
    SELECT r.id, r.title_id, r.author_id, u.username AS author, r.text, r.score, r.pub_date
    FROM reviews r
    JOIN users u ON r.author_id = u.id
"#;

const COMMENT_SELECT: &str = r#"
    SELECT c.id, c.review_id, c.author_id, u.username AS author, c.text, c.pub_date
    FROM comments c
    JOIN users u ON c.author_id = u.id
"#;

#[async_trait]
impl MutationLookup for PostgresRepository {
    async fn review_exists(&self, title_id: Uuid, author_id: Uuid) -> bool {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("review_exists error: {:?}", e);
            false
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("find_user_by_username error: {:?}", e);
            None
        })
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn get_user(&self, id: Uuid) -> Option<User> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_user error: {:?}", e);
                None
            })
    }

    /// Implements the admin listing with optional username search, using
    /// QueryBuilder for safe parameterization.
    async fn list_users(&self, search: Option<String>) -> Vec<User> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1 = 1"));

        if let Some(s) = search {
            builder.push(" AND username ILIKE ");
            builder.push_bind(format!("%{}%", s));
        }

        builder.push(" ORDER BY username");

        match builder.build_query_as::<User>().fetch_all(&self.pool).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!("list_users error: {:?}", e);
                vec![]
            }
        }
    }

    /// Fetches the exact (username, email) pair or inserts it. The individual
    /// unique constraints on username and email remain armed: a concurrent or
    /// conflicting owner of either field surfaces as `UniqueViolation`.
    async fn get_or_create_user(&self, username: &str, email: &str) -> RepoResult<User> {
        let existing = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1 AND email = $2"
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::classify)?;

        if let Some(user) = existing {
            return Ok(user);
        }

        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, username, email) VALUES ($1, $2, $3) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(username)
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    async fn set_confirm_code(&self, user_id: Uuid, code: Uuid) -> bool {
        match sqlx::query("UPDATE users SET confirm_code = $2 WHERE id = $1")
            .bind(user_id)
            .bind(code)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("set_confirm_code error: {:?}", e);
                false
            }
        }
    }

    async fn create_user(&self, req: CreateUserRequest) -> RepoResult<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, username, email, role, first_name, last_name, bio)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&req.username)
        .bind(&req.email)
        .bind(req.role.unwrap_or_default())
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.bio)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    /// Admin partial update using COALESCE so only provided fields change.
    async fn update_user(
        &self,
        username: &str,
        req: UpdateUserRequest,
    ) -> RepoResult<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                first_name = COALESCE($4, first_name),
                last_name = COALESCE($5, last_name),
                bio = COALESCE($6, bio),
                role = COALESCE($7, role)
            WHERE username = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(username)
        .bind(&req.username)
        .bind(&req.email)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.bio)
        .bind(req.role)
        .fetch_optional(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    /// Self-service partial update. `username`, `email` and `role` are absent
    /// from the column list on purpose: the "me" surface silently discards
    /// attempts to change them.
    async fn update_profile(&self, id: Uuid, req: UpdateUserRequest) -> Option<User> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                bio = COALESCE($4, bio)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&req.first_name)
        .bind(&req.last_name)
        .bind(&req.bio)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_profile error: {:?}", e);
            None
        })
    }

    async fn delete_user(&self, username: &str) -> bool {
        match sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_user error: {:?}", e);
                false
            }
        }
    }

    // --- CATEGORIES & GENRES ---

    async fn list_categories(&self, search: Option<String>) -> Vec<Category> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, name, slug FROM categories WHERE 1 = 1");

        if let Some(s) = search {
            builder.push(" AND name ILIKE ");
            builder.push_bind(format!("%{}%", s));
        }

        builder.push(" ORDER BY name");

        match builder
            .build_query_as::<Category>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("list_categories error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_category_by_slug(&self, slug: &str) -> Option<Category> {
        sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_category_by_slug error: {:?}", e);
                None
            })
    }

    async fn create_category(&self, name: &str, slug: &str) -> RepoResult<Category> {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) RETURNING id, name, slug",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    /// Deletes by slug. A category still referenced by a title is protected by
    /// the foreign-key constraint; the violation is logged and reported as a
    /// failed delete.
    async fn delete_category(&self, slug: &str) -> bool {
        match sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_category error: {:?}", e);
                false
            }
        }
    }

    async fn list_genres(&self, search: Option<String>) -> Vec<Genre> {
        let mut builder: QueryBuilder<sqlx::Postgres> =
            QueryBuilder::new("SELECT id, name, slug FROM genres WHERE 1 = 1");

        if let Some(s) = search {
            builder.push(" AND name ILIKE ");
            builder.push_bind(format!("%{}%", s));
        }

        builder.push(" ORDER BY name");

        match builder.build_query_as::<Genre>().fetch_all(&self.pool).await {
            Ok(genres) => genres,
            Err(e) => {
                tracing::error!("list_genres error: {:?}", e);
                vec![]
            }
        }
    }

    async fn get_genre_by_slug(&self, slug: &str) -> Option<Genre> {
        sqlx::query_as::<_, Genre>("SELECT id, name, slug FROM genres WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_genre_by_slug error: {:?}", e);
                None
            })
    }

    async fn create_genre(&self, name: &str, slug: &str) -> RepoResult<Genre> {
        sqlx::query_as::<_, Genre>(
            "INSERT INTO genres (id, name, slug) VALUES ($1, $2, $3) RETURNING id, name, slug",
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    async fn delete_genre(&self, slug: &str) -> bool {
        match sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_genre error: {:?}", e);
                false
            }
        }
    }

    // --- TITLES ---

    /// Implements filtering by category slug, genre slug, name substring and
    /// exact year using QueryBuilder for safe parameterization. The rating is
    /// recomputed per row by the correlated AVG subquery.
    async fn list_titles(&self, filter: TitleFilter) -> Vec<TitleDetail> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(TITLE_QUERY);

        if let Some(category) = filter.category {
            builder.push(" AND c.slug = ");
            builder.push_bind(category);
        }

        if let Some(genre) = filter.genre {
            builder.push(
                " AND EXISTS (SELECT 1 FROM title_genres tg JOIN genres g ON tg.genre_id = g.id \
                 WHERE tg.title_id = t.id AND g.slug = ",
            );
            builder.push_bind(genre);
            builder.push(")");
        }

        if let Some(name) = filter.name {
            builder.push(" AND t.name ILIKE ");
            builder.push_bind(format!("%{}%", name));
        }

        if let Some(year) = filter.year {
            builder.push(" AND t.year = ");
            builder.push_bind(year);
        }

        builder.push(" ORDER BY t.name");

        let rows = match builder
            .build_query_as::<TitleRow>()
            .fetch_all(&self.pool)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("list_titles error: {:?}", e);
                return vec![];
            }
        };

        let mut titles = Vec::with_capacity(rows.len());
        for row in rows {
            titles.push(self.assemble_title(row).await);
        }
        titles
    }

    async fn get_title(&self, id: Uuid) -> Option<TitleDetail> {
        let row = sqlx::query_as::<_, TitleRow>(&format!("{TITLE_QUERY} AND t.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("get_title error: {:?}", e);
                None
            })?;

        Some(self.assemble_title(row).await)
    }

    async fn title_exists(&self, id: Uuid) -> bool {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM titles WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .unwrap_or_else(|e| {
                tracing::error!("title_exists error: {:?}", e);
                false
            })
    }

    /// Inserts the title and its genre links in one transaction.
    async fn create_title(&self, new: NewTitle) -> RepoResult<TitleDetail> {
        let mut tx = self.pool.begin().await.map_err(RepoError::classify)?;
        let id = Uuid::new_v4();

        sqlx::query(
            "INSERT INTO titles (id, name, year, description, category_id) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&new.name)
        .bind(new.year)
        .bind(&new.description)
        .bind(new.category_id)
        .execute(&mut *tx)
        .await
        .map_err(RepoError::classify)?;

        for genre_id in &new.genre_ids {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(genre_id)
            .execute(&mut *tx)
            .await
            .map_err(RepoError::classify)?;
        }

        tx.commit().await.map_err(RepoError::classify)?;

        self.get_title(id)
            .await
            .ok_or(RepoError::Database(sqlx::Error::RowNotFound))
    }

    /// COALESCE partial update; when a genre set is supplied the links are
    /// replaced wholesale inside the same transaction.
    async fn update_title(&self, id: Uuid, patch: TitlePatch) -> RepoResult<Option<TitleDetail>> {
        let mut tx = self.pool.begin().await.map_err(RepoError::classify)?;

        let result = sqlx::query(
            r#"
            UPDATE titles
            SET name = COALESCE($2, name),
                year = COALESCE($3, year),
                description = COALESCE($4, description),
                category_id = COALESCE($5, category_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.year)
        .bind(&patch.description)
        .bind(patch.category_id)
        .execute(&mut *tx)
        .await
        .map_err(RepoError::classify)?;

        if result.rows_affected() == 0 {
            // Nothing matched; the dropped transaction rolls back.
            return Ok(None);
        }

        if let Some(genre_ids) = &patch.genre_ids {
            sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(RepoError::classify)?;

            for genre_id in genre_ids {
                sqlx::query(
                    "INSERT INTO title_genres (title_id, genre_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
                )
                .bind(id)
                .bind(genre_id)
                .execute(&mut *tx)
                .await
                .map_err(RepoError::classify)?;
            }
        }

        tx.commit().await.map_err(RepoError::classify)?;

        Ok(self.get_title(id).await)
    }

    /// Deleting a title cascades to its reviews and their comments via the
    /// store's foreign keys.
    async fn delete_title(&self, id: Uuid) -> bool {
        match sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_title error: {:?}", e);
                false
            }
        }
    }

    // --- REVIEWS ---

    async fn list_reviews(&self, title_id: Uuid) -> Vec<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.title_id = $1 ORDER BY r.pub_date DESC"
        ))
        .bind(title_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_reviews error: {:?}", e);
            vec![]
        })
    }

    async fn get_review(&self, title_id: Uuid, review_id: i64) -> Option<Review> {
        sqlx::query_as::<_, Review>(&format!(
            "{REVIEW_SELECT} WHERE r.id = $2 AND r.title_id = $1"
        ))
        .bind(title_id)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_review error: {:?}", e);
            None
        })
    }

    /// Inserts a review and immediately joins with `users` to return the
    /// enriched row in one round trip (CTE). The unique (title_id, author_id)
    /// constraint surfaces as `UniqueViolation`.
    async fn create_review(
        &self,
        title_id: Uuid,
        author_id: Uuid,
        text: &str,
        score: i16,
    ) -> RepoResult<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            WITH inserted AS (
                INSERT INTO reviews (title_id, author_id, text, score)
                VALUES ($1, $2, $3, $4)
                RETURNING id, title_id, author_id, text, score, pub_date
            )
            SELECT i.id, i.title_id, i.author_id, u.username AS author, i.text, i.score, i.pub_date
            FROM inserted i
            JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(title_id)
        .bind(author_id)
        .bind(text)
        .bind(score)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    async fn update_review(
        &self,
        review_id: i64,
        text: Option<String>,
        score: Option<i16>,
    ) -> Option<Review> {
        sqlx::query_as::<_, Review>(
            r#"
            WITH updated AS (
                UPDATE reviews
                SET text = COALESCE($2, text),
                    score = COALESCE($3, score)
                WHERE id = $1
                RETURNING id, title_id, author_id, text, score, pub_date
            )
            SELECT up.id, up.title_id, up.author_id, u.username AS author, up.text, up.score, up.pub_date
            FROM updated up
            JOIN users u ON up.author_id = u.id
            "#,
        )
        .bind(review_id)
        .bind(&text)
        .bind(score)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_review error: {:?}", e);
            None
        })
    }

    async fn delete_review(&self, title_id: Uuid, review_id: i64) -> bool {
        match sqlx::query("DELETE FROM reviews WHERE id = $2 AND title_id = $1")
            .bind(title_id)
            .bind(review_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_review error: {:?}", e);
                false
            }
        }
    }

    // --- COMMENTS ---

    async fn list_comments(&self, review_id: i64) -> Vec<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.review_id = $1 ORDER BY c.pub_date DESC"
        ))
        .bind(review_id)
        .fetch_all(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("list_comments error: {:?}", e);
            vec![]
        })
    }

    async fn get_comment(&self, review_id: i64, comment_id: i64) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(&format!(
            "{COMMENT_SELECT} WHERE c.id = $2 AND c.review_id = $1"
        ))
        .bind(review_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("get_comment error: {:?}", e);
            None
        })
    }

    async fn create_comment(
        &self,
        review_id: i64,
        author_id: Uuid,
        text: &str,
    ) -> RepoResult<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (review_id, author_id, text)
                VALUES ($1, $2, $3)
                RETURNING id, review_id, author_id, text, pub_date
            )
            SELECT i.id, i.review_id, i.author_id, u.username AS author, i.text, i.pub_date
            FROM inserted i
            JOIN users u ON i.author_id = u.id
            "#,
        )
        .bind(review_id)
        .bind(author_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await
        .map_err(RepoError::classify)
    }

    async fn update_comment(&self, comment_id: i64, text: Option<String>) -> Option<Comment> {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments
                SET text = COALESCE($2, text)
                WHERE id = $1
                RETURNING id, review_id, author_id, text, pub_date
            )
            SELECT up.id, up.review_id, up.author_id, u.username AS author, up.text, up.pub_date
            FROM updated up
            JOIN users u ON up.author_id = u.id
            "#,
        )
        .bind(comment_id)
        .bind(&text)
        .fetch_optional(&self.pool)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("update_comment error: {:?}", e);
            None
        })
    }

    async fn delete_comment(&self, review_id: i64, comment_id: i64) -> bool {
        match sqlx::query("DELETE FROM comments WHERE id = $2 AND review_id = $1")
            .bind(review_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => res.rows_affected() > 0,
            Err(e) => {
                tracing::error!("delete_comment error: {:?}", e);
                false
            }
        }
    }
}
