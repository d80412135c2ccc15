use sea_orm_migration::prelude::extension::postgres::Type;
use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum AiGenerations {
    Table,
    Id,
    UserEmail,
    Prompt,
    ImageUrl,
    Mode,
    AspectRatio,
    Description,
    Strength,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(Alias::new("generation_mode"))
                    .values(vec![Alias::new("text_to_image"), Alias::new("image_editing")])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AiGenerations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AiGenerations::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AiGenerations::UserEmail)
                            .string_len(320)
                            .null(),
                    )
                    .col(ColumnDef::new(AiGenerations::Prompt).text().not_null())
                    // data: URLs can be large
                    .col(ColumnDef::new(AiGenerations::ImageUrl).text().not_null())
                    .col(
                        ColumnDef::new(AiGenerations::Mode)
                            .custom(Alias::new("generation_mode"))
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AiGenerations::AspectRatio)
                            .string_len(16)
                            .null(),
                    )
                    .col(ColumnDef::new(AiGenerations::Description).text().null())
                    .col(ColumnDef::new(AiGenerations::Strength).float().null())
                    .col(
                        ColumnDef::new(AiGenerations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(AiGenerations::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ai_generations_user_created")
                    .table(AiGenerations::Table)
                    .col(AiGenerations::UserEmail)
                    .col(AiGenerations::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(
                Table::drop()
                    .if_exists()
                    .table(AiGenerations::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_type(Type::drop().name(Alias::new("generation_mode")).to_owned())
            .await?;
        Ok(())
    }
}
