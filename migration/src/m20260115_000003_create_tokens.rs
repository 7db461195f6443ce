use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tokens::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Tokens::Owner)
                            .string_len(42)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Tokens::Name)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tokens::Description).text().not_null())
                    .col(
                        ColumnDef::new(Tokens::ImagePath)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Tokens::ImageUrl).text().not_null())
                    .col(
                        ColumnDef::new(Tokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(SimpleExpr::Keyword(Keyword::CurrentTimestamp)),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tokens {
    Table,
    Id,
    Owner,
    Name,
    Description,
    ImagePath,
    ImageUrl,
    CreatedAt,
}
