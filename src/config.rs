use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_max_lifetime: Duration,
    pub db_acquire_timeout: Duration,
    pub tmdb_api_key: String,
    pub tmdb_base_url: String,
    pub tmdb_timeout: Duration,
    pub tmdb_rps: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port: u16 =
            var("PORT").unwrap_or_else(|| "3000".to_string()).parse().context("PORT")?;

        let database_url = var("DATABASE_URL")
            .or_else(|| postgres_url(&var))
            .unwrap_or_else(|| "sqlite://movies.db?mode=rwc".to_string());

        let db_max_connections: u32 =
            var("DB_MAX_CONNECTIONS").and_then(|s| s.parse().ok()).unwrap_or(10);
        let db_min_connections: u32 =
            var("DB_MIN_CONNECTIONS").and_then(|s| s.parse().ok()).unwrap_or(1);
        let db_max_lifetime_secs: u64 =
            var("DB_MAX_LIFETIME_SECS").and_then(|s| s.parse().ok()).unwrap_or(1800);
        let db_acquire_timeout_secs: u64 =
            var("DB_ACQUIRE_TIMEOUT_SECS").and_then(|s| s.parse().ok()).unwrap_or(8);

        let tmdb_api_key = var("TMDB_API_KEY").unwrap_or_default();
        let tmdb_base_url =
            var("TMDB_BASE_URL").unwrap_or_else(|| "https://api.themoviedb.org/3".to_string());
        let tmdb_timeout_secs: u64 =
            var("TMDB_TIMEOUT_SECS").and_then(|s| s.parse().ok()).unwrap_or(10);
        let tmdb_rps: u32 = var("TMDB_RPS").and_then(|s| s.parse().ok()).unwrap_or(4);

        Ok(Self {
            addr: format!("{host}:{port}").parse().context("HOST/PORT")?,
            database_url,
            db_max_connections: db_max_connections.max(1),
            db_min_connections: db_min_connections.min(db_max_connections.max(1)),
            db_max_lifetime: Duration::from_secs(db_max_lifetime_secs),
            db_acquire_timeout: Duration::from_secs(db_acquire_timeout_secs),
            tmdb_api_key,
            tmdb_base_url,
            tmdb_timeout: Duration::from_secs(tmdb_timeout_secs),
            tmdb_rps,
        })
    }
}

/// Builds a Postgres URL from the discrete `DB_*` variables when `DB_NAME` is set.
fn postgres_url(var: &impl Fn(&str) -> Option<String>) -> Option<String> {
    let name = var("DB_NAME")?;
    let host = var("DB_HOST").unwrap_or_else(|| "localhost".to_string());
    let port = var("DB_PORT").unwrap_or_else(|| "5432".to_string());
    let user = var("DB_USER").unwrap_or_default();
    let password = var("DB_PASSWORD").unwrap_or_default();

    let auth = match (user.is_empty(), password.is_empty()) {
        (true, _) => String::new(),
        (false, true) => format!("{}@", urlencoding::encode(&user)),
        (false, false) => {
            format!("{}:{}@", urlencoding::encode(&user), urlencoding::encode(&password))
        },
    };

    Some(format!("postgres://{auth}{host}:{port}/{}", urlencoding::encode(&name)))
}
