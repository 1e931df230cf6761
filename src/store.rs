use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set, SqlErr,
    sea_query::{Expr, Func, LikeExpr, OnConflict},
};
use tracing::debug;

use crate::{
    entities::movie,
    error::{AppError, AppResult},
    models::{BatchUpsert, ListParams, Movie, MovieDraft, Paginated, UpsertFailure},
};

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_all(&self) -> AppResult<Vec<Movie>> {
        let rows = newest_first(movie::Entity::find()).all(&self.db).await?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    pub async fn get(&self, id: i32) -> AppResult<Movie> {
        movie::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Movie::from)
            .ok_or(AppError::NotFound("movie"))
    }

    pub async fn count(&self) -> AppResult<u64> {
        Ok(movie::Entity::find().count(&self.db).await?)
    }

    pub async fn query(&self, params: &ListParams) -> AppResult<Paginated<Movie>> {
        let limit = params.limit.max(1);
        let page = params.page.max(1);

        let select = movie::Entity::find().filter(filters(params));
        let total = select.clone().count(&self.db).await?;

        // Pages past the end never reach the database, so huge offsets cannot overflow.
        let rows = match (page - 1).checked_mul(limit).filter(|offset| *offset < total) {
            Some(offset) => newest_first(select).offset(offset).limit(limit).all(&self.db).await?,
            None => Vec::new(),
        };

        debug!(total, page, limit, returned = rows.len(), "movie query");

        Ok(Paginated {
            data: rows.into_iter().map(Movie::from).collect(),
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    pub async fn create(&self, draft: MovieDraft) -> AppResult<Movie> {
        require_title(&draft)?;
        let now = now_micros();

        let model = movie::ActiveModel {
            external_id: Set(draft.external_id),
            title: Set(draft.title),
            description: Set(draft.description),
            poster_path: Set(draft.poster_path),
            release_date: Set(draft.release_date.map(|d| d.to_string())),
            rating: Set(draft.rating),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = model.insert(&self.db).await.map_err(unique_to_conflict)?;
        Ok(created.into())
    }

    /// Replaces every mutable field. `id` and `created_at` are left untouched.
    pub async fn update(&self, id: i32, draft: MovieDraft) -> AppResult<Movie> {
        require_title(&draft)?;

        let model = movie::ActiveModel {
            id: sea_orm::ActiveValue::Unchanged(id),
            external_id: Set(draft.external_id),
            title: Set(draft.title),
            description: Set(draft.description),
            poster_path: Set(draft.poster_path),
            release_date: Set(draft.release_date.map(|d| d.to_string())),
            rating: Set(draft.rating),
            updated_at: Set(now_micros()),
            ..Default::default()
        };

        match model.update(&self.db).await {
            Ok(updated) => Ok(updated.into()),
            Err(DbErr::RecordNotUpdated) => Err(AppError::NotFound("movie")),
            Err(err) => Err(unique_to_conflict(err)),
        }
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let res = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Err(AppError::NotFound("movie"));
        }
        Ok(())
    }

    /// Insert keyed by `external_id`, or refresh the existing row in one
    /// `ON CONFLICT` statement. Returns the number of rows affected.
    pub async fn upsert(&self, draft: &MovieDraft) -> AppResult<u64> {
        require_title(draft)?;
        let external_id = draft
            .external_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("external_id is required for upsert"))?;

        let now = now_micros();
        let model = movie::ActiveModel {
            external_id: Set(Some(external_id.to_string())),
            title: Set(draft.title.clone()),
            description: Set(draft.description.clone()),
            poster_path: Set(draft.poster_path.clone()),
            release_date: Set(draft.release_date.map(|d| d.to_string())),
            rating: Set(draft.rating),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let affected = movie::Entity::insert(model)
            .on_conflict(
                OnConflict::column(movie::Column::ExternalId)
                    .update_columns([
                        movie::Column::Title,
                        movie::Column::Description,
                        movie::Column::PosterPath,
                        movie::Column::ReleaseDate,
                        movie::Column::Rating,
                        movie::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;

        Ok(affected)
    }

    /// Upserts each draft independently; a failing record does not stop the rest.
    pub async fn upsert_many(&self, drafts: &[MovieDraft]) -> BatchUpsert {
        let mut out = BatchUpsert::default();
        for draft in drafts {
            match self.upsert(draft).await {
                Ok(n) => out.affected += n,
                Err(err) => out.failures.push(UpsertFailure {
                    external_id: draft.external_id.clone(),
                    title: draft.title.clone(),
                    error: err.to_string(),
                }),
            }
        }
        out
    }
}

fn newest_first(select: Select<movie::Entity>) -> Select<movie::Entity> {
    select.order_by_desc(movie::Column::CreatedAt).order_by_desc(movie::Column::Id)
}

fn filters(params: &ListParams) -> Condition {
    let mut cond = Condition::all();

    if let Some(search) = params.search.as_deref() {
        let pattern = format!("%{}%", escape_like(&search.to_lowercase()));
        cond = cond.add(
            Condition::any()
                .add(
                    Expr::expr(Func::lower(Expr::col(movie::Column::Title)))
                        .like(LikeExpr::new(pattern.clone()).escape('\\')),
                )
                .add(
                    Expr::expr(Func::lower(Expr::col(movie::Column::Description)))
                        .like(LikeExpr::new(pattern).escape('\\')),
                ),
        );
    }

    if let Some(min) = params.min_rating {
        cond = cond.add(movie::Column::Rating.gte(min));
    }
    if let Some(max) = params.max_rating {
        cond = cond.add(movie::Column::Rating.lte(max));
    }

    if let Some(from) = params.release_from {
        cond = cond.add(movie::Column::ReleaseDate.gte(from.to_string()));
    }
    if let Some(end) = params.release_to.and_then(|d| d.tomorrow().ok()) {
        cond = cond.add(movie::Column::ReleaseDate.lt(end.to_string()));
    }

    cond
}

fn escape_like(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn require_title(draft: &MovieDraft) -> AppResult<()> {
    if draft.title.trim().is_empty() {
        return Err(AppError::validation("title is required"));
    }
    Ok(())
}

fn unique_to_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            AppError::Conflict("a movie with this external_id already exists".to_string())
        },
        _ => AppError::Store(err),
    }
}

fn now_micros() -> i64 {
    jiff::Timestamp::now().as_microsecond()
}
