use tracing::{debug, info, warn};

use crate::{error::AppResult, models::SyncReport, store::MovieStore, tmdb::TmdbClient};

/// Pulls TMDB's popular list and upserts every entry by external id.
///
/// Only the fetch is fatal. Records that fail to upsert are logged and returned
/// in the report while the rest of the batch is still written.
pub async fn sync_popular(tmdb: &TmdbClient, store: &MovieStore) -> AppResult<SyncReport> {
    let movies = tmdb.popular_movies().await?;
    debug!(fetched = movies.len(), "fetched popular movies");

    let batch = store.upsert_many(&movies).await;

    for failure in &batch.failures {
        warn!(
            external_id = ?failure.external_id,
            title = %failure.title,
            error = %failure.error,
            "failed to upsert movie"
        );
    }

    info!(
        fetched = movies.len(),
        synced = batch.affected,
        failed = batch.failures.len(),
        "movie sync finished"
    );

    Ok(SyncReport { fetched: movies.len(), synced: batch.affected, failed: batch.failures })
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, routing::get};

    use super::*;
    use crate::{db, error::AppError, tmdb::mock};

    #[tokio::test]
    async fn sync_twice_keeps_one_row_per_external_id() {
        let store = MovieStore::new(db::memory().await);
        let tmdb = mock::catalog_client(vec![
            mock::movie(550, "Fight Club", "1999-10-15", 8.4),
            mock::movie(680, "Pulp Fiction", "1994-09-10", 8.5),
        ])
        .await;

        let first = sync_popular(&tmdb, &store).await.unwrap();
        assert_eq!((first.fetched, first.synced), (2, 2));
        assert!(first.failed.is_empty());

        let second = sync_popular(&tmdb, &store).await.unwrap();
        assert_eq!(second.synced, 2);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn sync_updates_rows_created_by_hand() {
        let store = MovieStore::new(db::memory().await);
        let mine = store
            .create(crate::models::MovieDraft {
                external_id: Some("550".into()),
                title: "fight club (typo)".into(),
                ..Default::default()
            })
            .await
            .unwrap();

        let tmdb =
            mock::catalog_client(vec![mock::movie(550, "Fight Club", "1999-10-15", 8.4)]).await;
        sync_popular(&tmdb, &store).await.unwrap();

        let synced = store.get(mine.id).await.unwrap();
        assert_eq!(synced.title, "Fight Club");
        assert_eq!(synced.created_at, mine.created_at);
    }

    #[tokio::test]
    async fn bad_record_is_reported_without_stopping_the_rest() {
        let store = MovieStore::new(db::memory().await);
        let tmdb = mock::catalog_client(vec![
            mock::movie(1, "", "2020-01-01", 5.0),
            mock::movie(2, "Valid", "not-a-date", 6.0),
        ])
        .await;

        let report = sync_popular(&tmdb, &store).await.unwrap();
        assert_eq!(report.synced, 1);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].external_id.as_deref(), Some("1"));

        let stored = store.list_all().await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].release_date, None);
    }

    #[tokio::test]
    async fn fetch_failure_aborts_sync() {
        let store = MovieStore::new(db::memory().await);
        let router =
            Router::new().route("/movie/popular", get(|| async { StatusCode::UNAUTHORIZED }));
        let tmdb = mock::client(mock::serve(router).await);

        let err = sync_popular(&tmdb, &store).await.unwrap_err();
        assert!(matches!(err, AppError::UpstreamStatus(_)));
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
