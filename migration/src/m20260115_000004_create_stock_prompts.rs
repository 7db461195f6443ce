use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StockPrompts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StockPrompts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(StockPrompts::Class)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(StockPrompts::Prompt).text().not_null())
                    .col(
                        ColumnDef::new(StockPrompts::NegativePrompt)
                            .text()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // Random prompt selection filters on class
        manager
            .create_index(
                Index::create()
                    .name("idx_stock_prompts_class")
                    .table(StockPrompts::Table)
                    .col(StockPrompts::Class)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(StockPrompts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum StockPrompts {
    Table,
    Id,
    Class,
    Prompt,
    NegativePrompt,
}
