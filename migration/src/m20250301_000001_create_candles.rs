use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Candles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Candles::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Candles::InstrumentId).text().not_null())
                    .col(ColumnDef::new(Candles::Open).double().not_null())
                    .col(ColumnDef::new(Candles::Close).double().not_null())
                    .col(ColumnDef::new(Candles::High).double().not_null())
                    .col(ColumnDef::new(Candles::Low).double().not_null())
                    .col(ColumnDef::new(Candles::Volume).big_integer().not_null())
                    .col(ColumnDef::new(Candles::Time).big_integer().not_null()) // unix seconds
                    .col(ColumnDef::new(Candles::IsComplete).boolean().not_null().default(false))
                    .to_owned(),
            )
            .await?;

        // One bar per instrument per timestamp; inserts rely on this for ON CONFLICT DO NOTHING
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_candles_instrument_time")
                    .table(Candles::Table)
                    .col(Candles::InstrumentId)
                    .col(Candles::Time)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Candles::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Candles {
    Table,
    Id,
    InstrumentId,
    Open,
    Close,
    High,
    Low,
    Volume,
    Time,
    IsComplete,
}
