// PostgreSQL repository
// Decision: Runtime-checked queries (query_as + FromRow), no compile-time DATABASE_URL needed

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use super::models::*;

const USER_COLUMNS: &str = "id, email, name, avatar_url, password_hash, auth_provider, auth_provider_id, created_at, updated_at";
const PROFILE_COLUMNS: &str = "user_id, full_name, national_id, enrollment_code, role, setup_completed, created_at, updated_at";

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create database connection from URL and apply pending migrations
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run migrations")?;

        Ok(Self { pool })
    }

    // ============================================
    // Users
    // ============================================

    pub async fn create_user(&self, input: CreateUserRow) -> Result<UserRow> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, avatar_url, password_hash, auth_provider, auth_provider_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(&input.email)
        .bind(&input.name)
        .bind(&input.avatar_url)
        .bind(&input.password_hash)
        .bind(&input.auth_provider)
        .bind(&input.auth_provider_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_user_by_oauth(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> Result<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE auth_provider = $1 AND auth_provider_id = $2"
        ))
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    // ============================================
    // Profiles
    // ============================================

    pub async fn create_profile(&self, user_id: Uuid) -> Result<ProfileRow> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<Option<ProfileRow>> {
        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Merge the update and re-derive `setup_completed` in one transaction.
    /// The upsert holds the row lock until commit, so concurrent updates see
    /// each other's fields.
    pub async fn upsert_profile(&self, user_id: Uuid, input: UpdateProfile) -> Result<ProfileRow> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProfileRow>(&format!(
            r#"
            INSERT INTO profiles (user_id, full_name, national_id, enrollment_code, role)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                full_name = COALESCE(EXCLUDED.full_name, profiles.full_name),
                national_id = COALESCE(EXCLUDED.national_id, profiles.national_id),
                enrollment_code = COALESCE(EXCLUDED.enrollment_code, profiles.enrollment_code),
                role = COALESCE(profiles.role, EXCLUDED.role),
                updated_at = NOW()
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(&input.full_name)
        .bind(&input.national_id)
        .bind(&input.enrollment_code)
        .bind(&input.role)
        .fetch_one(&mut *tx)
        .await?;

        let setup_completed = row.onboarding_complete();
        let row = if row.setup_completed == setup_completed {
            row
        } else {
            sqlx::query_as::<_, ProfileRow>(&format!(
                "UPDATE profiles SET setup_completed = $2 WHERE user_id = $1 RETURNING {PROFILE_COLUMNS}"
            ))
            .bind(user_id)
            .bind(setup_completed)
            .fetch_one(&mut *tx)
            .await?
        };

        tx.commit().await.context("Failed to commit profile update")?;
        Ok(row)
    }

    // ============================================
    // Thesis submissions
    // ============================================

    pub async fn create_submission(&self, input: CreateSubmissionRow) -> Result<SubmissionRow> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO thesis_submissions (id, user_id, file_name, mime_type, size_bytes)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, file_name, mime_type, size_bytes, created_at
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(input.user_id)
        .bind(&input.file_name)
        .bind(&input.mime_type)
        .bind(input.size_bytes)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn list_submissions_for_user(&self, user_id: Uuid) -> Result<Vec<SubmissionRow>> {
        let rows = sqlx::query_as::<_, SubmissionRow>(
            r#"
            SELECT id, user_id, file_name, mime_type, size_bytes, created_at
            FROM thesis_submissions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
