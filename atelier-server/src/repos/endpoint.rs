use std::str::FromStr;

use atelier_types::entity::{Endpoint, HttpMethod, Language};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite};

use crate::error::{Error, ErrorType};

const SELECT_WITH_JOINS: &str = "SELECT e.*, u.email AS userEmail, p.name AS projectName
    FROM endpoints e
    LEFT JOIN users u ON u.id = e.userId
    LEFT JOIN projects p ON p.id = e.projectId";

#[derive(Debug, sqlx::FromRow)]
#[sqlx(rename_all = "camelCase")]
pub struct EndpointRow {
    pub id: String,
    pub path: String,
    pub parameters: Option<String>,
    pub code: String,
    pub language: String,
    pub http_method: String,
    pub project_id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub user_email: Option<String>,
    pub project_name: Option<String>,
}

impl TryFrom<EndpointRow> for Endpoint {
    type Error = Error;

    fn try_from(row: EndpointRow) -> Result<Endpoint, Error> {
        let language = Language::from_str(&row.language).map_err(|_| {
            ErrorType::BadData(format!("`{}` is not a valid endpoint language", row.language))
        })?;
        let http_method = HttpMethod::from_str(&row.http_method).map_err(|_| {
            ErrorType::BadData(format!("`{}` is not a valid http method", row.http_method))
        })?;

        Ok(Endpoint {
            id: row.id,
            path: row.path,
            parameters: split_parameters(row.parameters.as_deref()),
            code: row.code,
            language,
            http_method,
            project_id: row.project_id,
            user_id: row.user_id,
            created_at: row.created_at,
            user_email: row.user_email,
            project_name: row.project_name,
        })
    }
}

/// Parameters persist as a comma-joined string; `NULL` and `""` both mean
/// no declared parameters.
fn split_parameters(raw: Option<&str>) -> Vec<String> {
    raw.map(|raw| {
        raw.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(ToString::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn join_parameters(parameters: &[String]) -> Option<String> {
    if parameters.is_empty() {
        None
    } else {
        Some(parameters.join(","))
    }
}

/// Field subset accepted by [`EndpointRepo::update`]. `None` keeps the
/// stored value.
#[derive(Debug, Default)]
pub struct EndpointUpdate {
    pub path: Option<String>,
    pub parameters: Option<Vec<String>>,
    pub code: Option<String>,
    pub language: Option<Language>,
    pub http_method: Option<HttpMethod>,
    pub project_id: Option<String>,
}

#[derive(Clone)]
pub struct EndpointRepo {
    pool: Pool<Sqlite>,
}

impl EndpointRepo {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    #[tracing::instrument(skip(self, endpoint), fields(path = endpoint.path))]
    pub async fn create(&self, endpoint: &Endpoint) -> Result<(), Error> {
        sqlx::query(
            "INSERT INTO endpoints
                (id, path, parameters, code, language, httpMethod, projectId, userId, createdAt)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&endpoint.id)
        .bind(&endpoint.path)
        .bind(join_parameters(&endpoint.parameters))
        .bind(&endpoint.code)
        .bind(endpoint.language.as_str())
        .bind(endpoint.http_method.as_str())
        .bind(&endpoint.project_id)
        .bind(&endpoint.user_id)
        .bind(endpoint.created_at)
        .execute(&self.pool)
        .await
        .map(|_| ())
        .map_err(Into::into)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> Result<Option<Endpoint>, Error> {
        sqlx::query_as(&format!("{SELECT_WITH_JOINS} WHERE e.id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
            .and_then(|row: Option<EndpointRow>| row.map(TryInto::try_into).transpose())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_by_path(&self, path: &str) -> Result<Option<Endpoint>, Error> {
        sqlx::query_as(&format!("{SELECT_WITH_JOINS} WHERE e.path = ?"))
            .bind(path)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
            .and_then(|row: Option<EndpointRow>| row.map(TryInto::try_into).transpose())
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_owner(&self, user_id: &str) -> Result<Vec<Endpoint>, Error> {
        sqlx::query_as(&format!(
            "{SELECT_WITH_JOINS} WHERE e.userId = ? ORDER BY e.path ASC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
        .and_then(collect_rows)
    }

    #[tracing::instrument(skip(self))]
    pub async fn list_by_project(&self, project_id: &str) -> Result<Vec<Endpoint>, Error> {
        sqlx::query_as(&format!(
            "{SELECT_WITH_JOINS} WHERE e.projectId = ? ORDER BY e.path ASC"
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Into::into)
        .and_then(collect_rows)
    }

    /// Full scan used by registry hydration.
    #[tracing::instrument(skip_all)]
    pub async fn list_all(&self) -> Result<Vec<Endpoint>, Error> {
        sqlx::query_as(&format!("{SELECT_WITH_JOINS} ORDER BY e.path ASC"))
            .fetch_all(&self.pool)
            .await
            .map_err(Into::into)
            .and_then(collect_rows)
    }

    /// Returns whether a row matched `(id AND userId)`.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(
        &self,
        id: &str,
        user_id: &str,
        update: &EndpointUpdate,
    ) -> Result<bool, Error> {
        sqlx::query(
            "UPDATE endpoints SET
                    path = COALESCE(?, path),
                    parameters = CASE WHEN ? THEN ? ELSE parameters END,
                    code = COALESCE(?, code),
                    language = COALESCE(?, language),
                    httpMethod = COALESCE(?, httpMethod),
                    projectId = COALESCE(?, projectId)
                WHERE id = ? AND userId = ?",
        )
        .bind(update.path.as_ref())
        .bind(update.parameters.is_some())
        .bind(update.parameters.as_deref().and_then(join_parameters))
        .bind(update.code.as_ref())
        .bind(update.language.map(Language::as_str))
        .bind(update.http_method.map(HttpMethod::as_str))
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
        sqlx::query("DELETE FROM endpoints WHERE id = ? AND userId = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|res| res.rows_affected() == 1)
            .map_err(Into::into)
    }

    /// Remove every endpoint of a project and report the paths that were
    /// dropped, so the registry can be brought in line. Ownership is
    /// checked by the caller on the project itself.
    #[tracing::instrument(skip(self))]
    pub async fn delete_by_project(&self, project_id: &str) -> Result<Vec<String>, Error> {
        let paths: Vec<(String,)> =
            sqlx::query_as("SELECT path FROM endpoints WHERE projectId = ?")
                .bind(project_id)
                .fetch_all(&self.pool)
                .await
                .map_err(Error::from)?;
        sqlx::query("DELETE FROM endpoints WHERE projectId = ?")
            .bind(project_id)
            .execute(&self.pool)
            .await
            .map_err(Error::from)?;
        Ok(paths.into_iter().map(|(path,)| path).collect())
    }
}

fn collect_rows(rows: Vec<EndpointRow>) -> Result<Vec<Endpoint>, Error> {
    rows.into_iter().map(TryInto::try_into).collect()
}

#[cfg(test)]
mod tests {
    use atelier_types::entity::Project;
    use uuid::Uuid;

    use super::*;
    use crate::repos::test_support;

    fn endpoint(project: &Project, path: &str, parameters: Vec<String>) -> Endpoint {
        Endpoint {
            id: Uuid::new_v4().to_string(),
            path: path.to_string(),
            parameters,
            code: "function endpoint_function(p) { return p; }".into(),
            language: Language::Javascript,
            http_method: HttpMethod::Get,
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
        let project = Project::new("u1".into(), "demo".into(), None);
        repos.project.create(&project).await.unwrap();

        let ep = endpoint(&project, "/api/demo/sum", vec!["a".into(), "b".into()]);
        repos.endpoint.create(&ep).await.unwrap();

        let fetched = repos.endpoint.get(&ep.id).await.unwrap().unwrap();
        assert_eq!(fetched.path, "/api/demo/sum");
        assert_eq!(fetched.parameters, vec!["a".to_string(), "b".to_string()]);
        // Join fields come back from the owning rows.
        assert_eq!(fetched.project_name.as_deref(), Some("demo"));
        assert_eq!(fetched.user_email, None);

        let by_path = repos.endpoint.get_by_path("/api/demo/sum").await.unwrap();
        assert_eq!(by_path.map(|e| e.id), Some(ep.id.clone()));

        assert_eq!(repos.endpoint.list_by_owner("u1").await.unwrap().len(), 1);
        assert_eq!(
            repos.endpoint.list_by_project(&project.id).await.unwrap().len(),
            1
        );

        let update = EndpointUpdate {
            code: Some("function endpoint_function(p) { return {}; }".into()),
            http_method: Some(HttpMethod::Post),
            ..EndpointUpdate::default()
        };
        assert!(repos.endpoint.update(&ep.id, "u1", &update).await.unwrap());
        assert!(!repos.endpoint.update(&ep.id, "u2", &update).await.unwrap());
        let updated = repos.endpoint.get(&ep.id).await.unwrap().unwrap();
        assert_eq!(updated.http_method, HttpMethod::Post);
        assert_eq!(updated.parameters, vec!["a".to_string(), "b".to_string()]);

        // Clearing parameters persists as NULL, not as "".
        let update = EndpointUpdate {
            parameters: Some(vec![]),
            ..EndpointUpdate::default()
        };
        assert!(repos.endpoint.update(&ep.id, "u1", &update).await.unwrap());
        let updated = repos.endpoint.get(&ep.id).await.unwrap().unwrap();
        assert!(updated.parameters.is_empty());

        assert!(repos.endpoint.delete(&ep.id, "u1").await.unwrap());
        assert_eq!(repos.endpoint.get(&ep.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_path_is_a_unique_violation() {
        let repos = test_support::repos().await;
        repos.user.ensure("u1").await.unwrap();
        let project = Project::new("u1".into(), "demo".into(), None);
        repos.project.create(&project).await.unwrap();

        let first = endpoint(&project, "/api/demo/x", vec![]);
        repos.endpoint.create(&first).await.unwrap();

        let second = endpoint(&project, "/api/demo/x", vec![]);
        let err = repos.endpoint.create(&second).await.unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn delete_by_project_reports_paths() {
        let repos = test_support::repos().await;
        repos.user.ensure("u1").await.unwrap();
        let project = Project::new("u1".into(), "demo".into(), None);
        repos.project.create(&project).await.unwrap();

        for path in ["/api/demo/a", "/api/demo/b"] {
            repos
                .endpoint
                .create(&endpoint(&project, path, vec![]))
                .await
                .unwrap();
        }

        let mut paths = repos.endpoint.delete_by_project(&project.id).await.unwrap();
        paths.sort();
        assert_eq!(paths, vec!["/api/demo/a".to_string(), "/api/demo/b".to_string()]);
        assert!(repos.endpoint.list_by_project(&project.id).await.unwrap().is_empty());
    }
}
