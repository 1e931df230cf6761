use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, Statement};

use crate::{config::Config, error::AppResult};

#[derive(Clone, Debug)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub acquire_timeout: Duration,
}

impl From<&Config> for PoolSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            max_lifetime: config.db_max_lifetime,
            acquire_timeout: config.db_acquire_timeout,
        }
    }
}

pub async fn connect_and_migrate(
    database_url: &str,
    pool: &PoolSettings,
) -> AppResult<DatabaseConnection> {
    let mut opts = ConnectOptions::new(database_url.to_string());
    opts.max_connections(pool.max_connections)
        .min_connections(pool.min_connections)
        .max_lifetime(pool.max_lifetime)
        .acquire_timeout(pool.acquire_timeout)
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;

    if db.get_database_backend() == DbBackend::Sqlite {
        for pragma in ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL"] {
            db.execute(Statement::from_string(DbBackend::Sqlite, pragma.to_string())).await?;
        }
    }

    Migrator::up(&db, None).await?;
    tracing::debug!(backend = ?db.get_database_backend(), "database ready");
    Ok(db)
}

/// Fresh in-memory SQLite database with the schema applied.
///
/// Every connection to `sqlite::memory:` sees its own database, so the pool is
/// pinned to a single long-lived connection.
#[cfg(test)]
pub async fn memory() -> DatabaseConnection {
    let pool = PoolSettings {
        max_connections: 1,
        min_connections: 1,
        max_lifetime: Duration::from_secs(3600),
        acquire_timeout: Duration::from_secs(5),
    };
    connect_and_migrate("sqlite::memory:", &pool).await.expect("in-memory database")
}
