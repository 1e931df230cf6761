use jiff::{Timestamp, civil::Date};
use serde::{Deserialize, Serialize};

use crate::{
    entities::movie,
    error::{AppError, AppResult},
};

pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i32,
    pub external_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<Date>,
    pub rating: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<movie::Model> for Movie {
    fn from(m: movie::Model) -> Self {
        Self {
            id: m.id,
            external_id: m.external_id,
            title: m.title,
            description: m.description,
            poster_path: m.poster_path,
            release_date: m.release_date.as_deref().and_then(parse_date),
            rating: m.rating,
            created_at: Timestamp::from_microsecond(m.created_at).unwrap_or_default(),
            updated_at: Timestamp::from_microsecond(m.updated_at).unwrap_or_default(),
        }
    }
}

/// Every client-controlled movie field. Produced by API requests and by the TMDB
/// client, consumed by the store's create, update and upsert operations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieDraft {
    pub external_id: Option<String>,
    pub title: String,
    pub description: Option<String>,
    pub poster_path: Option<String>,
    pub release_date: Option<Date>,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct MovieRequest {
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl TryFrom<MovieRequest> for MovieDraft {
    type Error = AppError;

    fn try_from(req: MovieRequest) -> AppResult<Self> {
        let release_date = match non_blank(req.release_date) {
            Some(s) => Some(parse_date(&s).ok_or_else(|| {
                AppError::validation("invalid release_date format, expected YYYY-MM-DD")
            })?),
            None => None,
        };

        if let Some(rating) = req.rating {
            if !rating.is_finite() || !(0.0..=10.0).contains(&rating) {
                return Err(AppError::validation("rating must be between 0 and 10"));
            }
        }

        Ok(Self {
            external_id: non_blank(req.external_id),
            title: req.title.trim().to_string(),
            description: non_blank(req.description),
            poster_path: non_blank(req.poster_path),
            release_date,
            rating: req.rating,
        })
    }
}

/// Raw `GET /api/movies` query string.
#[derive(Debug, Default, Deserialize)]
pub struct MovieQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub release_from: Option<String>,
    pub release_to: Option<String>,
}

/// Normalized listing parameters. `release_to` covers the whole named day.
#[derive(Clone, Debug, PartialEq)]
pub struct ListParams {
    pub page: u64,
    pub limit: u64,
    pub search: Option<String>,
    pub min_rating: Option<f64>,
    pub max_rating: Option<f64>,
    pub release_from: Option<Date>,
    pub release_to: Option<Date>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
            search: None,
            min_rating: None,
            max_rating: None,
            release_from: None,
            release_to: None,
        }
    }
}

impl TryFrom<MovieQuery> for ListParams {
    type Error = AppError;

    fn try_from(q: MovieQuery) -> AppResult<Self> {
        for (name, bound) in [("min_rating", q.min_rating), ("max_rating", q.max_rating)] {
            if bound.is_some_and(|b| !b.is_finite()) {
                return Err(AppError::validation(format!("{name} must be a finite number")));
            }
        }

        let page = q.page.filter(|p| *p >= 1).map(|p| p as u64).unwrap_or(1);
        let limit = q
            .limit
            .filter(|l| (1..=MAX_PAGE_SIZE as i64).contains(l))
            .map(|l| l as u64)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Ok(Self {
            page,
            limit,
            search: non_blank(q.search),
            min_rating: q.min_rating,
            max_rating: q.max_rating,
            release_from: q.release_from.as_deref().and_then(parse_date),
            release_to: q.release_to.as_deref().and_then(parse_date),
        })
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u64,
}

#[derive(Clone, Debug, Default)]
pub struct BatchUpsert {
    pub affected: u64,
    pub failures: Vec<UpsertFailure>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UpsertFailure {
    pub external_id: Option<String>,
    pub title: String,
    pub error: String,
}

#[derive(Clone, Debug)]
pub struct SyncReport {
    pub fetched: usize,
    pub synced: u64,
    pub failed: Vec<UpsertFailure>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncResponse {
    pub message: String,
    pub fetched_count: usize,
    pub synced_count: u64,
    pub total_movies: u64,
    pub failed: Vec<UpsertFailure>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: Option<String>,
}

/// Strict `YYYY-MM-DD`.
pub fn parse_date(s: &str) -> Option<Date> {
    let s = s.trim();
    if s.len() != 10 {
        return None;
    }
    Date::strptime("%Y-%m-%d", s).ok()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
