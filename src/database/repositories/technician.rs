use anyhow::Result;
use bigdecimal::BigDecimal;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{CreateTechnicianInput, Technician, TechnicianStatus, UpdateTechnicianInput},
    utils::sql,
};

#[derive(Clone)]
pub struct TechnicianRepository {
    pool: PgPool,
}

const TECH_COLUMNS: &str = r#"
    id,
    name,
    email,
    phone,
    hourly_rate,
    status,
    hire_date,
    created_at,
    updated_at
"#;

impl TechnicianRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, input: CreateTechnicianInput) -> Result<Technician> {
        let now = Utc::now();

        let technician = sqlx::query_as::<_, Technician>(&sql(r#"
            INSERT INTO
                technicians (id, name, email, phone, hourly_rate, status, hire_date, created_at, updated_at)
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING
                id, name, email, phone, hourly_rate, status, hire_date, created_at, updated_at
        "#))
        .bind(Uuid::new_v4())
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(input.hourly_rate.unwrap_or_else(|| BigDecimal::from(0)))
        .bind(TechnicianStatus::Active)
        .bind(input.hire_date)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        Ok(technician)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Technician>> {
        let technician = sqlx::query_as::<_, Technician>(&format!(
            "SELECT {} FROM technicians WHERE id = $1",
            TECH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(technician)
    }

    pub async fn find_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Technician>> {
        let technicians = sqlx::query_as::<_, Technician>(&format!(
            "SELECT {} FROM technicians WHERE id = ANY($1)",
            TECH_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(technicians)
    }

    pub async fn get_all(&self, status: Option<TechnicianStatus>) -> Result<Vec<Technician>> {
        let technicians = match status {
            Some(s) => {
                sqlx::query_as::<_, Technician>(&format!(
                    "SELECT {} FROM technicians WHERE status = $1 ORDER BY name",
                    TECH_COLUMNS
                ))
                .bind(s)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Technician>(&format!(
                    "SELECT {} FROM technicians ORDER BY name",
                    TECH_COLUMNS
                ))
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(technicians)
    }

    pub async fn update(&self, id: Uuid, input: UpdateTechnicianInput) -> Result<Option<Technician>> {
        let technician = sqlx::query_as::<_, Technician>(&format!(
            r#"
            UPDATE technicians
            SET
                name = COALESCE($1, name),
                email = COALESCE($2, email),
                phone = COALESCE($3, phone),
                hourly_rate = COALESCE($4, hourly_rate),
                status = COALESCE($5, status),
                hire_date = COALESCE($6, hire_date),
                updated_at = $7
            WHERE id = $8
            RETURNING {}
            "#,
            TECH_COLUMNS
        ))
        .bind(input.name)
        .bind(input.email)
        .bind(input.phone)
        .bind(input.hourly_rate)
        .bind(input.status)
        .bind(input.hire_date)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(technician)
    }

    pub async fn count_active(&self) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM technicians WHERE status = 'active'")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
