use crate::core::billing::{
    DEFAULT_RECHARGE_CREDITS, DEFAULT_RECHARGE_PRICE_CENTS, DEFAULT_RECHARGE_THRESHOLD,
    DEFAULT_STARTING_CREDITS,
};
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Users::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(Users::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Users::Plan)
                            .string()
                            .not_null()
                            .default("free"),
                    )
                    .col(
                        ColumnDef::new(Users::Credits)
                            .big_integer()
                            .not_null()
                            .default(DEFAULT_STARTING_CREDITS),
                    )
                    .col(
                        ColumnDef::new(Users::Suspended)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::StripeCustomerId).string().null())
                    .col(
                        ColumnDef::new(Users::AutoRechargeEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Users::AutoRechargeThreshold)
                            .big_integer()
                            .not_null()
                            .default(DEFAULT_RECHARGE_THRESHOLD),
                    )
                    .col(
                        ColumnDef::new(Users::AutoRechargeCredits)
                            .big_integer()
                            .not_null()
                            .default(DEFAULT_RECHARGE_CREDITS),
                    )
                    .col(
                        ColumnDef::new(Users::AutoRechargePriceCents)
                            .big_integer()
                            .not_null()
                            .default(DEFAULT_RECHARGE_PRICE_CENTS),
                    )
                    .col(
                        ColumnDef::new(Users::LastActiveAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Users::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    Plan,
    Credits,
    Suspended,
    StripeCustomerId,
    AutoRechargeEnabled,
    AutoRechargeThreshold,
    AutoRechargeCredits,
    AutoRechargePriceCents,
    LastActiveAt,
    CreatedAt,
    UpdatedAt,
}
