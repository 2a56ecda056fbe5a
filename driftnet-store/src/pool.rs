//! Connection bootstrap: turns a [`DatabaseTarget`] into a ready-to-use
//! SQLite pool with the canonical schema applied and foreign keys enforced.

use driftnet_core::{DatabaseTarget, Result};
use sqlx::sqlite::{SqlitePoolOptions, SqliteConnectOptions};
use std::str::FromStr;

use crate::error::SqlxErrorExt;

/// Connects to the target database, enabling `PRAGMA foreign_keys = ON`
/// (SQLite disables FK enforcement by default) and running the bundled
/// migrations.
pub async fn connect(target: &DatabaseTarget) -> Result<sqlx::SqlitePool> {
    let connect_string = target.connect_string();
    let options = SqliteConnectOptions::from_str(&connect_string)
        .map_err(|e| e.into_driftnet_error())?
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .connect_with(options)
        .await
        .map_err(|e| e.into_driftnet_error())?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| driftnet_core::Error::database(e))?;

    tracing::info!(target: "driftnet_store", "database ready");
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn connects_to_in_memory_database_and_applies_schema() {
        let pool = connect(&DatabaseTarget::Memory).await.unwrap();
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM provider")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 0);
    }
}
