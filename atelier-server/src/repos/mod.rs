use sqlx::{Pool, Sqlite};

use self::{endpoint::EndpointRepo, page::PageRepo, project::ProjectRepo, user::UserRepo};

pub mod endpoint;
pub mod page;
pub mod project;
pub mod user;

#[derive(Clone)]
pub struct Repos {
    pub user: UserRepo,
    pub project: ProjectRepo,
    pub endpoint: EndpointRepo,
    pub page: PageRepo,
    pub pool: Pool<Sqlite>,
}

impl Repos {
    #[must_use]
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self {
            user: UserRepo::new(pool.clone()),
            project: ProjectRepo::new(pool.clone()),
            endpoint: EndpointRepo::new(pool.clone()),
            page: PageRepo::new(pool.clone()),
            pool,
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
