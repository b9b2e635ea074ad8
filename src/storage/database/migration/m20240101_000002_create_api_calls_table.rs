use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ApiCalls::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(ApiCalls::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(ApiCalls::UserId).uuid().not_null())
                    .col(ColumnDef::new(ApiCalls::Provider).string().not_null())
                    .col(ColumnDef::new(ApiCalls::Model).string().not_null())
                    .col(
                        ColumnDef::new(ApiCalls::InputTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ApiCalls::OutputTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ApiCalls::CacheReadTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ApiCalls::CacheCreationTokens)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ApiCalls::CostUnits)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ApiCalls::DurationMs)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ApiCalls::Status)
                            .string()
                            .not_null()
                            .default("success"),
                    )
                    .col(ColumnDef::new(ApiCalls::ErrorMessage).text().null())
                    .col(
                        ColumnDef::new(ApiCalls::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_api_calls_user_id")
                            .from(ApiCalls::Table, ApiCalls::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Monthly usage scans by user and time
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_api_calls_user_created")
                    .table(ApiCalls::Table)
                    .col(ApiCalls::UserId)
                    .col(ApiCalls::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ApiCalls::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ApiCalls {
    Table,
    Id,
    UserId,
    Provider,
    Model,
    InputTokens,
    OutputTokens,
    CacheReadTokens,
    CacheCreationTokens,
    CostUnits,
    DurationMs,
    Status,
    ErrorMessage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
