use std::{num::NonZeroU32, sync::Arc};

use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::{AppError, AppResult},
    models::{MovieDraft, parse_date},
};

pub struct TmdbClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>,
}

impl TmdbClient {
    pub fn new(client: reqwest::Client, api_key: String, base_url: String, rps: u32) -> Self {
        if api_key.trim().is_empty() {
            tracing::warn!("no TMDB_API_KEY provided, TMDB requests will be rejected upstream");
        }

        let quota = Quota::per_second(NonZeroU32::new(rps).unwrap_or(NonZeroU32::MIN));
        let limiter = Arc::new(RateLimiter::direct(quota));
        Self { client, api_key, base_url, limiter }
    }

    pub async fn popular_movies(&self) -> AppResult<Vec<MovieDraft>> {
        let resp: ListResponse = self.get("movie/popular", &[]).await?;
        Ok(resp.results.into_iter().map(MovieDraft::from).collect())
    }

    pub async fn search_movies(&self, query: &str) -> AppResult<Vec<MovieDraft>> {
        let resp: ListResponse = self.get("search/movie", &[("query", query)]).await?;
        Ok(resp.results.into_iter().map(MovieDraft::from).collect())
    }

    pub async fn movie_details(&self, tmdb_id: u64) -> AppResult<MovieDraft> {
        let movie: TmdbMovie = self.get(&format!("movie/{tmdb_id}"), &[]).await?;
        Ok(movie.into())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> AppResult<T> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        tracing::debug!(%url, "tmdb request");

        let resp = self
            .client
            .get(url)
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AppError::UpstreamStatus(status));
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    results: Vec<TmdbMovie>,
}

#[derive(Debug, Deserialize)]
struct TmdbMovie {
    id: i64,
    #[serde(default)]
    title: String,
    overview: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    vote_average: Option<f64>,
}

impl From<TmdbMovie> for MovieDraft {
    fn from(m: TmdbMovie) -> Self {
        Self {
            external_id: Some(m.id.to_string()),
            title: m.title,
            description: m.overview.filter(|s| !s.trim().is_empty()),
            poster_path: m.poster_path,
            // TMDB sends "" for unknown dates; one bad date must not sink the batch.
            release_date: m.release_date.as_deref().and_then(parse_date),
            rating: m.vote_average,
        }
    }
}
