use std::{env, error::Error};

use async_trait::async_trait;
use model::{
    shelter::{Shelter, ShelterPatch},
    WithId,
};
use registry::store::ShelterStore;
use utility::id::Id;

pub mod data_model;
pub mod queries;

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

/// Postgres-backed shelter store. Clones share one connection pool.
#[derive(Clone)]
pub struct PgShelterStore {
    pool: sqlx::PgPool,
}

impl PgShelterStore {
    pub async fn connect(
        database_connection_info: DatabaseConnectionInfo,
    ) -> Result<Self, Box<dyn Error>> {
        let url = database_connection_info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl ShelterStore for PgShelterStore {
    async fn list(&self) -> registry::store::Result<Vec<WithId<Shelter>>> {
        queries::get_all(&self.pool).await
    }

    async fn create(
        &self,
        shelter: Shelter,
    ) -> registry::store::Result<Id<Shelter>> {
        queries::insert(&self.pool, shelter).await
    }

    async fn update_field(
        &self,
        id: &Id<Shelter>,
        patch: ShelterPatch,
    ) -> registry::store::Result<()> {
        queries::update_field(&self.pool, id, patch).await
    }

    async fn delete(&self, id: &Id<Shelter>) -> registry::store::Result<()> {
        queries::delete(&self.pool, id).await
    }
}
