use sea_orm_migration::prelude::*;

/// Recharge cards (pre-generated, single use)
#[derive(DeriveIden)]
enum RechargeCards {
    Table,
    Id,
    Code,
    CreditAmount,
    Status,
    ExpiresAt,
    BatchLabel,
    RedeemedBy,
    RedeemedAt,
    CreatedBy,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RechargeCards::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RechargeCards::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RechargeCards::Code).string_len(32).not_null())
                    .col(
                        ColumnDef::new(RechargeCards::CreditAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RechargeCards::Status)
                            .string_len(16)
                            .not_null()
                            .default("unused"),
                    )
                    .col(
                        ColumnDef::new(RechargeCards::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RechargeCards::BatchLabel).string_len(64).null())
                    .col(ColumnDef::new(RechargeCards::RedeemedBy).uuid().null())
                    .col(
                        ColumnDef::new(RechargeCards::RedeemedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(ColumnDef::new(RechargeCards::CreatedBy).uuid().null())
                    .col(
                        ColumnDef::new(RechargeCards::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recharge_cards_code_unique")
                    .table(RechargeCards::Table)
                    .col(RechargeCards::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // admin listing filters by batch
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_recharge_cards_batch_label")
                    .table(RechargeCards::Table)
                    .col(RechargeCards::BatchLabel)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RechargeCards::Table).to_owned())
            .await?;
        Ok(())
    }
}
