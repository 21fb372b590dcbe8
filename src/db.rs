use sqlx::{
    postgres::{PgConnectOptions, PgPoolOptions},
    PgPool,
};

use crate::config::DatabaseConfig;

/// Builds the pool without connecting, so the service starts (and answers
/// 503) while the database is down.
pub fn connect(cfg: &DatabaseConfig) -> anyhow::Result<PgPool> {
    let options: PgConnectOptions = cfg.url.parse()?;
    let pool = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .acquire_timeout(cfg.acquire_timeout)
        .connect_lazy_with(options);
    Ok(pool)
}

/// Applies pending migrations, returning whether the schema is current.
pub async fn migrate(db: &PgPool) -> bool {
    match sqlx::migrate!("./migrations").run(db).await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "migration failed; will retry once storage answers");
            false
        }
    }
}
