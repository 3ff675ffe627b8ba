use atelier_types::entity::{name_slug, Project};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::error::Error;

#[derive(Debug, sqlx::FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        let slug = name_slug(&row.name);
        Project {
            id: row.id,
            name: row.name,
            description: row.description,
            user_id: row.user_id,
            created_at: row.created_at,
            name_slug: slug,
        }
    }
}

#[derive(Clone)]
pub struct ProjectRepo {
    pool: Pool<Sqlite>,
}

impl ProjectRepo {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create(&self, project: &Project) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO projects (id, name, description, userId, createdAt)
            VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(project.description.as_ref())
        .bind(&project.user_id)
        .bind(project.created_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Project>, Error> {
        sqlx::query_as("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row: Option<ProjectRow>| row.map(Into::into))
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self, user_id: &str) -> Result<Vec<Project>, Error> {
        sqlx::query_as("SELECT * FROM projects WHERE userId = ? ORDER BY createdAt ASC, id ASC")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map(|rows: Vec<ProjectRow>| rows.into_iter().map(Into::into).collect())
            .map_err(Into::into)
    }

    /// Returns whether a row matched `(id AND userId)`.
    #[tracing::instrument(skip(self))]
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<bool, Error> {
        sqlx::query(
            "UPDATE projects SET
                    name = COALESCE(?, name),
                    description = COALESCE(?, description)
                WHERE id = ? AND userId = ?",
        )
        .bind(name)
        .bind(description)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map(|res| res.rows_affected() == 1)
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool, Error> {
        sqlx::query("DELETE FROM projects WHERE id = ? AND userId = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() == 1)
            .map_err(Into::into)
    }
}
