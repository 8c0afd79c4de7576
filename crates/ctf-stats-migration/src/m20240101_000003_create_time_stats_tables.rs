use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HttpPathTimeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpPathTimeStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(HttpPathTimeStats::Method).string().not_null())
                    .col(ColumnDef::new(HttpPathTimeStats::Path).string().not_null())
                    .col(ColumnDef::new(HttpPathTimeStats::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(HttpPathTimeStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(HttpPathTimeStats::Port)
                            .col(HttpPathTimeStats::Method)
                            .col(HttpPathTimeStats::Path)
                            .col(HttpPathTimeStats::Time),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpQueryParamTimeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpQueryParamTimeStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(HttpQueryParamTimeStats::Param).string().not_null())
                    .col(ColumnDef::new(HttpQueryParamTimeStats::Value).string().not_null())
                    .col(ColumnDef::new(HttpQueryParamTimeStats::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(HttpQueryParamTimeStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(HttpQueryParamTimeStats::Port)
                            .col(HttpQueryParamTimeStats::Param)
                            .col(HttpQueryParamTimeStats::Value)
                            .col(HttpQueryParamTimeStats::Time),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpHeaderTimeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpHeaderTimeStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(HttpHeaderTimeStats::Name).string().not_null())
                    .col(ColumnDef::new(HttpHeaderTimeStats::Value).string().not_null())
                    .col(ColumnDef::new(HttpHeaderTimeStats::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(HttpHeaderTimeStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(HttpHeaderTimeStats::Port)
                            .col(HttpHeaderTimeStats::Name)
                            .col(HttpHeaderTimeStats::Value)
                            .col(HttpHeaderTimeStats::Time),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpRequestTimeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpRequestTimeStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(HttpRequestTimeStats::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(HttpRequestTimeStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(HttpRequestTimeStats::BlockedCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(HttpRequestTimeStats::Port)
                            .col(HttpRequestTimeStats::Time),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FlagTimeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(FlagTimeStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(FlagTimeStats::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(FlagTimeStats::WriteCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(FlagTimeStats::ReadCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(FlagTimeStats::Port)
                            .col(FlagTimeStats::Time),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TcpConnectionTimeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TcpConnectionTimeStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionTimeStats::ReadMin).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionTimeStats::ReadMax).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionTimeStats::WriteMin).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionTimeStats::WriteMax).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionTimeStats::Time).big_integer().not_null())
                    .col(
                        ColumnDef::new(TcpConnectionTimeStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(TcpConnectionTimeStats::Port)
                            .col(TcpConnectionTimeStats::ReadMin)
                            .col(TcpConnectionTimeStats::ReadMax)
                            .col(TcpConnectionTimeStats::WriteMin)
                            .col(TcpConnectionTimeStats::WriteMax)
                            .col(TcpConnectionTimeStats::Time),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            TcpConnectionTimeStats::Table.into_iden(),
            FlagTimeStats::Table.into_iden(),
            HttpRequestTimeStats::Table.into_iden(),
            HttpHeaderTimeStats::Table.into_iden(),
            HttpQueryParamTimeStats::Table.into_iden(),
            HttpPathTimeStats::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum HttpPathTimeStats {
    Table,
    Port,
    Method,
    Path,
    Time,
    Count,
}

#[derive(DeriveIden)]
enum HttpQueryParamTimeStats {
    Table,
    Port,
    Param,
    Value,
    Time,
    Count,
}

#[derive(DeriveIden)]
enum HttpHeaderTimeStats {
    Table,
    Port,
    Name,
    Value,
    Time,
    Count,
}

#[derive(DeriveIden)]
enum HttpRequestTimeStats {
    Table,
    Port,
    Time,
    Count,
    BlockedCount,
}

#[derive(DeriveIden)]
enum FlagTimeStats {
    Table,
    Port,
    Time,
    WriteCount,
    ReadCount,
}

#[derive(DeriveIden)]
enum TcpConnectionTimeStats {
    Table,
    Port,
    ReadMin,
    ReadMax,
    WriteMin,
    WriteMax,
    Time,
    Count,
}
