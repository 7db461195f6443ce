use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Orders::Owner)
                            .string_len(42)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::OrderId)
                            .string_len(64)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Orders::Prompt).text().not_null())
                    .col(
                        ColumnDef::new(Orders::Ready)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Orders::Error)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Orders::ImageUrls)
                            .json_binary()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        // Pending-order listing filters on (owner, ready); the global
        // in-flight cap counts on ready alone
        manager
            .create_index(
                Index::create()
                    .name("idx_orders_owner_ready")
                    .table(Orders::Table)
                    .col(Orders::Owner)
                    .col(Orders::Ready)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_ready")
                    .table(Orders::Table)
                    .col(Orders::Ready)
                    .to_owned(),
            )
            .await?;

        // Create trigger function for updated_at (if not exists)
        let db = manager.get_connection();
        db.execute_unprepared(
            r#"
            CREATE OR REPLACE FUNCTION update_orders_updated_at()
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
            DROP TRIGGER IF EXISTS trigger_orders_updated_at ON orders;
            CREATE TRIGGER trigger_orders_updated_at
                BEFORE UPDATE ON orders
                FOR EACH ROW
                EXECUTE FUNCTION update_orders_updated_at();
            "#,
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared("DROP TRIGGER IF EXISTS trigger_orders_updated_at ON orders;")
            .await?;
        db.execute_unprepared("DROP FUNCTION IF EXISTS update_orders_updated_at();")
            .await?;

        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Orders {
    Table,
    Id,
    Owner,
    OrderId,
    Prompt,
    Ready,
    Error,
    ImageUrls,
    CreatedAt,
    UpdatedAt,
}
