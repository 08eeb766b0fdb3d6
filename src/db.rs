use std::time::Duration;

use anyhow::Result;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sqlx::postgres::PgPoolOptions;

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

/// Create the sqlx pool with a bounded acquire timeout.
pub async fn create_pool(database_url: &str, timeout: Duration) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Create a SeaORM connection with the same bounded timeouts.
pub async fn create_orm_conn(database_url: &str, timeout: Duration) -> Result<OrmConn> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options
        .max_connections(20)
        .connect_timeout(timeout)
        .acquire_timeout(timeout);
    let conn = Database::connect(options).await?;
    Ok(conn)
}
