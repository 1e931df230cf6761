use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Movies::Table)
                    .if_not_exists()
                    .col(pk_auto(Movies::Id))
                    .col(string_null(Movies::ExternalId))
                    .col(string(Movies::Title))
                    .col(text_null(Movies::Description))
                    .col(string_null(Movies::PosterPath))
                    .col(string_null(Movies::ReleaseDate))
                    .col(double_null(Movies::Rating))
                    .col(big_integer(Movies::CreatedAt))
                    .col(big_integer(Movies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // NULL external ids never collide, so hand-entered movies can omit it.
        manager
            .create_index(
                Index::create()
                    .name("idx_movies_external_id")
                    .table(Movies::Table)
                    .col(Movies::ExternalId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_movies_created_at")
                    .table(Movies::Table)
                    .col(Movies::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Movies::Table).to_owned()).await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Movies {
    Table,
    Id,
    ExternalId,
    Title,
    Description,
    PosterPath,
    ReleaseDate,
    Rating,
    CreatedAt,
    UpdatedAt,
}
