use sqlx::{Pool, Sqlite};

use crate::error::Error;

#[derive(Clone)]
pub struct UserRepo {
    pool: Pool<Sqlite>,
}

impl UserRepo {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Make sure a row exists for a verified identity. Account details
    /// (email) are maintained by the external auth system; only the id is
    /// needed here so the core tables can reference it.
    #[tracing::instrument(skip(self))]
    pub async fn ensure(&self, user_id: &str) -> Result<(), Error> {
        sqlx::query("INSERT INTO users (id) VALUES (?) ON CONFLICT (id) DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(Into::into)
    }
}
