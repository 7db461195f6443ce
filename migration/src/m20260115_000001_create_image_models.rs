use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ImageModels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ImageModels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::Owner)
                            .string_len(42)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::BatchId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::ModelId)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::S3Urls)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::Descriptor)
                            .string_len(16)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::State)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ImageModels::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(ImageModels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Lookups during training-status refresh filter on state
        manager
            .create_index(
                Index::create()
                    .name("idx_image_models_state")
                    .table(ImageModels::Table)
                    .col(ImageModels::State)
                    .to_owned(),
            )
            .await?;

        // Create trigger function for updated_at (if not exists)
        let db = manager.get_connection();
        db.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION update_image_models_updated_at()
            RETURNS TRIGGER AS $$
            BEGIN
                NEW.updated_at = NOW();
                RETURN NEW;
            END;
            $$ LANGUAGE plpgsql;
            "#,
        )
        .await?;

        db.execute_unprepared(
            r#"
            DROP TRIGGER IF EXISTS trigger_image_models_updated_at ON image_models;
            CREATE TRIGGER trigger_image_models_updated_at
                BEFORE UPDATE ON image_models
                FOR EACH ROW
                EXECUTE FUNCTION update_image_models_updated_at();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(
            "DROP TRIGGER IF EXISTS trigger_image_models_updated_at ON image_models;",
        )
        .await?;
        db.execute_unprepared("DROP FUNCTION IF EXISTS update_image_models_updated_at();")
            .await?;

        manager
            .drop_table(Table::drop().table(ImageModels::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ImageModels {
    Table,
    Id,
    Owner,
    BatchId,
    ModelId,
    S3Urls,
    Descriptor,
    State,
    CreatedAt,
    UpdatedAt,
}
