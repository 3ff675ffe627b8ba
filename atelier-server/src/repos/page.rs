use atelier_types::entity::Page;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::error::Error;

const SELECT_WITH_JOINS: &str = "SELECT g.*, u.email AS userEmail, p.name AS projectName
    FROM pages g
    LEFT JOIN users u ON u.id = g.userId
    LEFT JOIN projects p ON p.id = g.projectId";

#[derive(Debug, sqlx::FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct PageRow {
    pub id: String,
    pub path: String,
    pub html_content: String,
    pub project_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub user_email: Option<String>,
    pub project_name: Option<String>,
}

impl From<PageRow> for Page {
    fn from(row: PageRow) -> Self {
        Page {
            id: row.id,
            path: row.path,
            html_content: row.html_content,
            project_id: row.project_id,
            user_id: row.user_id,
            created_at: row.created_at,
            user_email: row.user_email,
            project_name: row.project_name,
        }
    }
}

/// Field subset accepted by [`PageRepo::update`]. `None` keeps the stored
/// value.
#[derive(Debug, Default)]
pub struct PageUpdate {
    pub path: Option<String>,
    pub html_content: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Clone)]
pub struct PageRepo {
    pool: Pool<Sqlite>,
}

impl PageRepo {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, page), fields(path = page.path))]
    pub async fn create(&self, page: &Page) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO pages (id, path, htmlContent, projectId, userId, createdAt)
            VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&page.id)
        .bind(&page.path)
        .bind(&page.html_content)
        .bind(&page.project_id)
        .bind(&page.user_id)
        .bind(page.created_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Page>, Error> {
        sqlx::query_as(&format!("{SELECT_WITH_JOINS} WHERE g.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map(|row: Option<PageRow>| row.map(Into::into))
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_path(&self, path: &str) -> Result<Option<Page>, Error> {
        sqlx::query_as(&format!("{SELECT_WITH_JOINS} WHERE g.path = ?"))
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map(|row: Option<PageRow>| row.map(Into::into))
            .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Page>, Error> {
        sqlx::query_as(&format!(
            "{SELECT_WITH_JOINS} WHERE g.userId = ? ORDER BY g.path ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows: Vec<PageRow>| rows.into_iter().map(Into::into).collect())
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<Page>, Error> {
        sqlx::query_as(&format!(
            "{SELECT_WITH_JOINS} WHERE g.projectId = ? ORDER BY g.path ASC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map(|rows: Vec<PageRow>| rows.into_iter().map(Into::into).collect())
        .map_err(Into::into)
    }

    /// Full scan used by registry hydration.
    #[tracing::instrument(skip_all)]
    pub async fn list_all(&self) -> Result<Vec<Page>, Error> {
        sqlx::query_as(&format!("{SELECT_WITH_JOINS} ORDER BY g.path ASC"))
            .fetch_all(&self.pool)
            .await
            .map(|rows: Vec<PageRow>| rows.into_iter().map(Into::into).collect())
            .map_err(Into::into)
    }

    /// Returns whether a row matched `(id AND userId)`.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: &str, user_id: &str, update: &PageUpdate) -> Result<bool, Error> {
        sqlx::query(
            "UPDATE pages SET
                    path = COALESCE(?, path),
                    htmlContent = COALESCE(?, htmlContent),
                    projectId = COALESCE(?, projectId)
                WHERE id = ? AND userId = ?",
        )
        .bind(update.path.as_ref())
        .bind(update.html_content.as_ref())
        .bind(update.project_id.as_ref())
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map(|res| res.rows_affected() == 1)
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str, user_id: &str) -> Result<bool, Error> {
        sqlx::query("DELETE FROM pages WHERE id = ? AND userId = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() == 1)
            .map_err(Into::into)
    }

    /// Remove every page of a project and report the dropped paths.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_project(&self, project_id: &str) -> Result<Vec<String>, Error> {
        let paths: Vec<(String,)> = sqlx::query_as("SELECT path FROM pages WHERE projectId = ?")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::from)?;
        sqlx::query("DELETE FROM pages WHERE projectId = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(paths.into_iter().map(|(path,)| path).collect())
    }
}

#[cfg(test)]
mod tests {
    use atelier_types::entity::Project;
    use uuid::Uuid;

    use super::*;
    use crate::repos::test_support;

    fn page(project: &Project, path: &str, html: &str) -> Page {
        Page {
            id: Uuid::new_v4().to_string(),
            path: path.to_string(),
            html_content: html.to_string(),
            project_id: project.id.clone(),
            user_id: project.user_id.clone(),
            created_at: Utc::now(),
            user_email: None,
            project_name: None,
        }
    }

    #[tokio::test]
    async fn crud() {
        let repos = test_support::repos().await;
        repos.user.ensure("u1").await.unwrap();
        let project = Project::new("u1".into(), "site".into(), None);
        repos.project.create(&project).await.unwrap();

        let pg = page(&project, "/site/home", "<h1>hi</h1>");
        repos.page.create(&pg).await.unwrap();

        let fetched = repos.page.get(&pg.id).await.unwrap().unwrap();
        assert_eq!(fetched.html_content, "<h1>hi</h1>");
        assert_eq!(fetched.project_name.as_deref(), Some("site"));

        let by_path = repos.page.get_by_path("/site/home").await.unwrap();
        assert_eq!(by_path.map(|p| p.id), Some(pg.id.clone()));

        let update = PageUpdate {
            html_content: Some("<h1>bye</h1>".into()),
            ..PageUpdate::default()
        };
        assert!(repos.page.update(&pg.id, "u1", &update).await.unwrap());
        assert!(!repos.page.update(&pg.id, "intruder", &update).await.unwrap());
        let updated = repos.page.get(&pg.id).await.unwrap().unwrap();
        assert_eq!(updated.html_content, "<h1>bye</h1>");

        assert!(repos.page.delete(&pg.id, "u1").await.unwrap());
        assert_eq!(repos.page.get(&pg.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_path_is_a_unique_violation() {
        let repos = test_support::repos().await;
        repos.user.ensure("u1").await.unwrap();
        let project = Project::new("u1".into(), "site".into(), None);
        repos.project.create(&project).await.unwrap();

        repos
            .page
            .create(&page(&project, "/site/home", "<p>1</p>"))
            .await
            .unwrap();
        let err = repos
            .page
            .create(&page(&project, "/site/home", "<p>2</p>"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation());
    }
}
