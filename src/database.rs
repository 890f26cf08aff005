use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// Initialize the PostgreSQL connection pool and run pending migrations.
pub async fn init_db(database_url: &str) -> Result<PgPool, sqlx::Error> {
    info!("Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!().run(&pool).await?;

    info!("Database connection established");
    Ok(pool)
}
