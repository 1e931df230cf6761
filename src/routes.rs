use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    AppState,
    error::{AppError, AppResult},
    models::{
        ListParams, Movie, MovieDraft, MovieQuery, MovieRequest, Paginated, SearchQuery,
        SyncResponse,
    },
    sync,
};

/// `Json` whose rejections render through [`AppError`] as a 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/movies", get(list_movies).post(create_movie))
        .route("/api/movies/all", get(list_all_movies))
        .route("/api/movies/sync", post(sync_movies))
        .route("/api/movies/{id}", get(get_movie).put(update_movie).delete(delete_movie))
        .route("/api/tmdb/movies/search", get(search_tmdb))
        .route("/api/tmdb/movies/{id}", get(tmdb_details))
        .with_state(state)
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    AppQuery(q): AppQuery<MovieQuery>,
) -> AppResult<Json<Paginated<Movie>>> {
    let params = ListParams::try_from(q)?;
    Ok(Json(state.store.query(&params).await?))
}

pub async fn list_all_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<Movie>>> {
    Ok(Json(state.store.list_all().await?))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<Json<Movie>> {
    Ok(Json(state.store.get(id).await?))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<MovieRequest>,
) -> AppResult<(StatusCode, Json<Movie>)> {
    let draft = MovieDraft::try_from(req)?;
    let movie = state.store.create(draft).await?;
    tracing::debug!(id = movie.id, title = %movie.title, "movie created");
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
    AppJson(req): AppJson<MovieRequest>,
) -> AppResult<Json<Movie>> {
    let draft = MovieDraft::try_from(req)?;
    Ok(Json(state.store.update(id, draft).await?))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<i32>,
) -> AppResult<StatusCode> {
    state.store.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sync_movies(State(state): State<Arc<AppState>>) -> AppResult<Json<SyncResponse>> {
    let report = sync::sync_popular(&state.tmdb, &state.store).await?;
    let total_movies = state.store.count().await?;

    let message = if report.failed.is_empty() {
        "Movies synced successfully".to_string()
    } else {
        format!("Movies synced with {} failures", report.failed.len())
    };

    Ok(Json(SyncResponse {
        message,
        fetched_count: report.fetched,
        synced_count: report.synced,
        total_movies,
        failed: report.failed,
    }))
}

pub async fn search_tmdb(
    State(state): State<Arc<AppState>>,
    AppQuery(q): AppQuery<SearchQuery>,
) -> AppResult<Json<Vec<MovieDraft>>> {
    let query = q.query.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(AppError::validation("query parameter 'query' is required"));
    }
    Ok(Json(state.tmdb.search_movies(query).await?))
}

pub async fn tmdb_details(
    State(state): State<Arc<AppState>>,
    AppPath(id): AppPath<u64>,
) -> AppResult<Json<MovieDraft>> {
    Ok(Json(state.tmdb.movie_details(id).await?))
}
