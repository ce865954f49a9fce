//! Repository layer for database operations.

use chrono::Utc;
use sqlx::sqlite::{Sqlite, SqlitePool};
use sqlx::{Executor, QueryBuilder};
use uuid::Uuid;

use crate::domain::{
    DashboardStats, Rating, RatingAggregate, RatingOutcome, RatingWithRater, Store, StoreListing,
    StoreWithOwner, User, UserWithStore,
};
use crate::error::{AppError, AppResult};
use crate::storage::models::{
    timestamp, RatingRow, RatingWithRaterRow, StoreListingRow, StoreRow, StoreWithOwnerRow,
    UserRow, UserWithStoreRow,
};
use crate::storage::query::{like_pattern, non_empty, StoreFilter, UserFilter};

const USER_WITH_STORE_SELECT: &str = r#"
    SELECT u.*, s.name AS store_name, s.average_rating AS store_average_rating
    FROM users u
    LEFT JOIN stores s ON s.id = u.store_id
"#;

/// Result of a rating submission.
#[derive(Debug, Clone)]
pub struct SubmittedRating {
    pub rating: Rating,
    pub outcome: RatingOutcome,
    /// Store aggregate after the submission was applied.
    pub aggregate: RatingAggregate,
}

/// Repository for all users, stores and ratings.
#[derive(Clone)]
pub struct StoreRatingRepository {
    pool: SqlitePool,
}

impl StoreRatingRepository {
    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl StoreRatingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Initialize the database schema.
    pub async fn init_schema(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                address TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                store_id TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS stores (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                address TEXT NOT NULL,
                owner_id TEXT NOT NULL,
                average_rating REAL NOT NULL DEFAULT 0,
                total_ratings INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id)
            );

            CREATE INDEX IF NOT EXISTS idx_stores_owner ON stores(owner_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ratings (
                id TEXT PRIMARY KEY,
                store_id TEXT NOT NULL,
                user_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY (store_id) REFERENCES stores(id) ON DELETE CASCADE,
                FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
                UNIQUE(store_id, user_id)
            );

            CREATE INDEX IF NOT EXISTS idx_ratings_user ON ratings(user_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ==================== Users ====================

    /// Insert a user. A taken email is reported as a client error.
    pub async fn create_user(&self, user: &User) -> AppResult<()> {
        insert_user(&self.pool, user)
            .await
            .map_err(|e| AppError::on_conflict(e, "User already exists"))
    }

    /// Find a user by ID.
    pub async fn find_user(&self, id: Uuid) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Find a user by email. The lookup is case-insensitive.
    pub async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(crate::domain::validation::normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Get a user with the store they own.
    pub async fn get_user_with_store(&self, id: Uuid) -> AppResult<UserWithStore> {
        let row: UserWithStoreRow =
            sqlx::query_as(&format!("{USER_WITH_STORE_SELECT} WHERE u.id = ?"))
                .bind(id.to_string())
                .fetch_optional(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        row.try_into()
    }

    /// List users matching a filter, in creation order unless a sort is given.
    pub async fn list_users(&self, filter: &UserFilter) -> AppResult<Vec<UserWithStore>> {
        let mut qb = QueryBuilder::<Sqlite>::new(USER_WITH_STORE_SELECT);
        qb.push(" WHERE 1 = 1");

        for (column, value) in [
            ("u.name", non_empty(&filter.name)),
            ("u.email", non_empty(&filter.email)),
            ("u.address", non_empty(&filter.address)),
        ] {
            if let Some(term) = value {
                qb.push(format!(" AND {column} LIKE "))
                    .push_bind(like_pattern(term))
                    .push(" ESCAPE '\\'");
            }
        }

        if let Some(role) = filter.role {
            qb.push(" AND u.role = ").push_bind(role.to_string());
        }

        qb.push(" ORDER BY ");
        if let Some((field, order)) = filter.sort {
            qb.push(format!("{} {}, ", field.column(), order.as_sql()));
        }
        qb.push("u.rowid ASC");

        let rows: Vec<UserWithStoreRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    /// Replace a user's password hash.
    pub async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(timestamp(&Utc::now()))
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    // ==================== Stores ====================

    /// Create a store owner and their store in one transaction.
    ///
    /// On success `owner.store_id` points at the new store.
    pub async fn create_store_with_owner(&self, owner: &mut User, store: &Store) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        insert_user(&mut *tx, owner)
            .await
            .map_err(|e| AppError::on_conflict(e, "Owner email already exists"))?;

        sqlx::query(
            r#"
            INSERT INTO stores (
                id, name, email, address, owner_id,
                average_rating, total_ratings, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(store.id.to_string())
        .bind(&store.name)
        .bind(&store.email)
        .bind(&store.address)
        .bind(owner.id.to_string())
        .bind(store.average_rating)
        .bind(store.total_ratings)
        .bind(timestamp(&store.created_at))
        .bind(timestamp(&store.updated_at))
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::on_conflict(e, "Store email already exists"))?;

        sqlx::query("UPDATE users SET store_id = ? WHERE id = ?")
            .bind(store.id.to_string())
            .bind(owner.id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        owner.store_id = Some(store.id);
        Ok(())
    }

    /// Find a store by ID.
    pub async fn find_store(&self, id: Uuid) -> AppResult<Option<Store>> {
        let row: Option<StoreRow> = sqlx::query_as("SELECT * FROM stores WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Find a store by email. The lookup is case-insensitive.
    pub async fn find_store_by_email(&self, email: &str) -> AppResult<Option<Store>> {
        let row: Option<StoreRow> = sqlx::query_as("SELECT * FROM stores WHERE email = ?")
            .bind(crate::domain::validation::normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// Get a store with its owner's contact details.
    pub async fn get_store_with_owner(&self, id: Uuid) -> AppResult<StoreWithOwner> {
        let row: StoreWithOwnerRow = sqlx::query_as(
            r#"
            SELECT s.*, u.name AS owner_name, u.email AS owner_email
            FROM stores s
            LEFT JOIN users u ON u.id = s.owner_id
            WHERE s.id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Store not found".to_string()))?;

        row.try_into()
    }

    /// List stores matching a filter.
    ///
    /// When `rater` is given, each entry carries that user's own score (or
    /// null); otherwise entries have no `userRating` at all.
    pub async fn list_stores(
        &self,
        filter: &StoreFilter,
        rater: Option<Uuid>,
    ) -> AppResult<Vec<StoreListing>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT s.*, r.rating AS user_rating FROM stores s \
             LEFT JOIN ratings r ON r.store_id = s.id AND r.user_id = ",
        );
        qb.push_bind(rater.map(|id| id.to_string()));
        qb.push(" WHERE 1 = 1");

        if let Some(term) = non_empty(&filter.search) {
            let pattern = like_pattern(term);
            qb.push(" AND (s.name LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR s.address LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        } else {
            for (column, value) in [
                ("s.name", non_empty(&filter.name)),
                ("s.address", non_empty(&filter.address)),
            ] {
                if let Some(term) = value {
                    qb.push(format!(" AND {column} LIKE "))
                        .push_bind(like_pattern(term))
                        .push(" ESCAPE '\\'");
                }
            }
        }

        if let Some(term) = non_empty(&filter.email) {
            qb.push(" AND s.email LIKE ")
                .push_bind(like_pattern(term))
                .push(" ESCAPE '\\'");
        }

        qb.push(" ORDER BY ");
        if let Some((field, order)) = filter.sort {
            qb.push(format!("{} {}, ", field.column(), order.as_sql()));
        }
        qb.push("s.rowid ASC");

        let rows: Vec<StoreListingRow> = qb.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|r| r.into_listing(rater.is_some()))
            .collect()
    }

    // ==================== Ratings ====================

    /// Create or replace `user_id`'s rating of `store_id` and update the
    /// store's aggregate in the same transaction.
    ///
    /// The transaction opens with a write to the store row, so concurrent
    /// submissions for any store queue on the database write lock and each
    /// aggregate step sees the previous one.
    pub async fn submit_rating(
        &self,
        store_id: Uuid,
        user_id: Uuid,
        score: u8,
    ) -> AppResult<SubmittedRating> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let touched = sqlx::query("UPDATE stores SET updated_at = ? WHERE id = ?")
            .bind(timestamp(&now))
            .bind(store_id.to_string())
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(AppError::NotFound("Store not found".to_string()));
        }

        let store: Store = sqlx::query_as::<_, StoreRow>("SELECT * FROM stores WHERE id = ?")
            .bind(store_id.to_string())
            .fetch_one(&mut *tx)
            .await?
            .try_into()?;

        let existing: Option<RatingRow> =
            sqlx::query_as("SELECT * FROM ratings WHERE store_id = ? AND user_id = ?")
                .bind(store_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&mut *tx)
                .await?;

        let (rating, outcome, aggregate) = match existing {
            Some(row) => {
                let mut rating: Rating = row.try_into()?;
                let previous = rating.rating;
                rating.rating = score;
                rating.updated_at = now;

                sqlx::query("UPDATE ratings SET rating = ?, updated_at = ? WHERE id = ?")
                    .bind(i64::from(score))
                    .bind(timestamp(&now))
                    .bind(rating.id.to_string())
                    .execute(&mut *tx)
                    .await?;

                let aggregate = store.aggregate().with_changed_rating(previous, score);
                (rating, RatingOutcome::Updated { previous }, aggregate)
            }
            None => {
                let rating = Rating::new(store_id, user_id, score);

                sqlx::query(
                    r#"
                    INSERT INTO ratings (id, store_id, user_id, rating, created_at, updated_at)
                    VALUES (?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(rating.id.to_string())
                .bind(store_id.to_string())
                .bind(user_id.to_string())
                .bind(i64::from(score))
                .bind(timestamp(&rating.created_at))
                .bind(timestamp(&rating.updated_at))
                .execute(&mut *tx)
                .await?;

                let aggregate = store.aggregate().with_new_rating(score);
                (rating, RatingOutcome::Created, aggregate)
            }
        };

        sqlx::query("UPDATE stores SET average_rating = ?, total_ratings = ? WHERE id = ?")
            .bind(aggregate.average)
            .bind(aggregate.count)
            .bind(store_id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(SubmittedRating {
            rating,
            outcome,
            aggregate,
        })
    }

    /// Get a user's rating for a store, if they left one.
    pub async fn find_user_rating(&self, store_id: Uuid, user_id: Uuid) -> AppResult<Option<Rating>> {
        let row: Option<RatingRow> =
            sqlx::query_as("SELECT * FROM ratings WHERE store_id = ? AND user_id = ?")
                .bind(store_id.to_string())
                .bind(user_id.to_string())
                .fetch_optional(&self.pool)
                .await?;

        row.map(|r| r.try_into()).transpose()
    }

    /// All ratings of a store with their authors, oldest first.
    pub async fn list_store_ratings(&self, store_id: Uuid) -> AppResult<Vec<RatingWithRater>> {
        let rows: Vec<RatingWithRaterRow> = sqlx::query_as(
            r#"
            SELECT r.*, u.name AS user_name, u.email AS user_email, u.address AS user_address
            FROM ratings r
            LEFT JOIN users u ON u.id = r.user_id
            WHERE r.store_id = ?
            ORDER BY r.rowid ASC
            "#,
        )
        .bind(store_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(|r| r.try_into()).collect()
    }

    // ==================== Dashboard ====================

    /// Row counts for the admin dashboard.
    pub async fn dashboard_stats(&self) -> AppResult<DashboardStats> {
        let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        let total_stores: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stores")
            .fetch_one(&self.pool)
            .await?;
        let total_ratings: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM ratings")
            .fetch_one(&self.pool)
            .await?;

        Ok(DashboardStats {
            total_users,
            total_stores,
            total_ratings,
        })
    }
}

async fn insert_user<'e, E>(executor: E, user: &User) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO users (
            id, name, email, password_hash, address, role, store_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.id.to_string())
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.address)
    .bind(user.role.to_string())
    .bind(user.store_id.map(|id| id.to_string()))
    .bind(timestamp(&user.created_at))
    .bind(timestamp(&user.updated_at))
    .execute(executor)
    .await?;

    Ok(())
}
