use anyhow::Result;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::{
    models::{ActivityFilter, ActivityLog, CreateActivityInput},
    utils::sql,
};

#[derive(Clone)]
pub struct ActivityRepository {
    pool: PgPool,
}

const ACTIVITY_COLUMNS: &str = r#"
    id,
    user_id,
    action_type,
    entity_type,
    entity_id,
    old_values,
    new_values,
    description,
    ip_address,
    user_agent,
    created_at
"#;

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn log_activity(&self, input: CreateActivityInput) -> Result<ActivityLog> {
        let old_values = input.old_values.map(|v| v.to_string());
        let new_values = input.new_values.map(|v| v.to_string());

        let log = sqlx::query_as::<_, ActivityLog>(&sql(&format!(
            r#"
            INSERT INTO
                activity_logs (
                    id, user_id, action_type, entity_type, entity_id,
                    old_values, new_values, description, ip_address, user_agent, created_at
                )
            VALUES
                (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            ACTIVITY_COLUMNS
        )))
        .bind(Uuid::new_v4())
        .bind(input.user_id)
        .bind(&input.action_type)
        .bind(&input.entity_type)
        .bind(input.entity_id)
        .bind(old_values)
        .bind(new_values)
        .bind(&input.description)
        .bind(&input.ip_address)
        .bind(&input.user_agent)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(log)
    }

    pub async fn get_activities(&self, filter: &ActivityFilter) -> Result<Vec<ActivityLog>> {
        let mut query = format!("SELECT {} FROM activity_logs", ACTIVITY_COLUMNS);

        let mut params = Vec::new();
        let mut conditions = vec![];

        if let Some(uid) = filter.user_id {
            conditions.push(format!("user_id = ${}::uuid", params.len() + 1));
            params.push(uid.to_string());
        }

        if let Some(action_type) = &filter.action_type {
            conditions.push(format!("action_type = ${}", params.len() + 1));
            params.push(action_type.clone());
        }

        if let Some(entity_type) = &filter.entity_type {
            conditions.push(format!("entity_type = ${}", params.len() + 1));
            params.push(entity_type.clone());
        }

        if let Some(fd) = filter.from_date {
            conditions.push(format!("created_at >= ${}::timestamptz", params.len() + 1));
            params.push(fd.to_rfc3339());
        }

        if let Some(td) = filter.to_date {
            conditions.push(format!("created_at < ${}::timestamptz", params.len() + 1));
            params.push(td.to_rfc3339());
        }

        if !conditions.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&conditions.join(" AND "));
        }

        query.push_str(" ORDER BY created_at DESC");
        query.push_str(&format!(" LIMIT {}", filter.limit.unwrap_or(50)));
        query.push_str(&format!(" OFFSET {}", filter.offset.unwrap_or(0)));

        let mut prepared = sqlx::query_as::<_, ActivityLog>(&query);
        for param in params {
            prepared = prepared.bind(param);
        }

        let activities = prepared.fetch_all(&self.pool).await?;

        Ok(activities)
    }
}
