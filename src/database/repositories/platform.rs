use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{CreatePlatformInput, Platform, PlatformStatus},
    utils::sql,
};

#[derive(Clone)]
pub struct PlatformRepository {
    pool: PgPool,
}

const PLATFORM_COLUMNS: &str = "id, name, code, status, created_at";

impl PlatformRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreatePlatformInput) -> Result<Platform> {
        let platform = sqlx::query_as::<_, Platform>(&sql(&format!(
            r#"
            INSERT INTO
                platforms (id, name, code, status, created_at)
            VALUES
                (?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            PLATFORM_COLUMNS
        )))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.code)
        .bind(PlatformStatus::Active)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(platform)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Platform>> {
        let platform = sqlx::query_as::<_, Platform>(&format!(
            "SELECT {} FROM platforms WHERE id = $1",
            PLATFORM_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(platform)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Platform>> {
        let platform = sqlx::query_as::<_, Platform>(&format!(
            "SELECT {} FROM platforms WHERE name = $1",
            PLATFORM_COLUMNS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(platform)
    }

    pub async fn get_all(&self) -> Result<Vec<Platform>> {
        let platforms = sqlx::query_as::<_, Platform>(&format!(
            "SELECT {} FROM platforms ORDER BY name",
            PLATFORM_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(platforms)
    }

    /// Find a platform by name, creating it when missing (import path).
    pub async fn find_or_create(&self, name: &str, code: &str) -> Result<Platform> {
        if let Some(platform) = self.find_by_name(name).await? {
            return Ok(platform);
        }

        self.create(CreatePlatformInput {
            name: name.to_string(),
            code: code.to_string(),
        })
        .await
    }
}
