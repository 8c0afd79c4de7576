use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceStats::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ServiceStats::Port)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalRequests)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalBlockedRequests)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalResponses)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalBlockedResponses)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalFlagsWritten)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalFlagsRetrieved)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalFlagsBlocked)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalTcpConnections)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalTcpBytesIn)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ServiceStats::TotalTcpBytesOut)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpResponseCodeStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpResponseCodeStats::Port).big_integer().not_null())
                    .col(
                        ColumnDef::new(HttpResponseCodeStats::StatusCode)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(HttpResponseCodeStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(HttpResponseCodeStats::Port)
                            .col(HttpResponseCodeStats::StatusCode),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpPathStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(HttpPathStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(HttpPathStats::Path).string().not_null())
                    .col(
                        ColumnDef::new(HttpPathStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(HttpPathStats::Port)
                            .col(HttpPathStats::Path),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TcpConnectionStats::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(TcpConnectionStats::Port).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionStats::ReadMin).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionStats::ReadMax).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionStats::WriteMin).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnectionStats::WriteMax).big_integer().not_null())
                    .col(
                        ColumnDef::new(TcpConnectionStats::Count)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .primary_key(
                        Index::create()
                            .col(TcpConnectionStats::Port)
                            .col(TcpConnectionStats::ReadMin)
                            .col(TcpConnectionStats::ReadMax)
                            .col(TcpConnectionStats::WriteMin)
                            .col(TcpConnectionStats::WriteMax),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            TcpConnectionStats::Table.into_iden(),
            HttpPathStats::Table.into_iden(),
            HttpResponseCodeStats::Table.into_iden(),
            ServiceStats::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum ServiceStats {
    Table,
    Port,
    TotalRequests,
    TotalBlockedRequests,
    TotalResponses,
    TotalBlockedResponses,
    TotalFlagsWritten,
    TotalFlagsRetrieved,
    TotalFlagsBlocked,
    TotalTcpConnections,
    TotalTcpBytesIn,
    TotalTcpBytesOut,
}

#[derive(DeriveIden)]
enum HttpResponseCodeStats {
    Table,
    Port,
    StatusCode,
    Count,
}

#[derive(DeriveIden)]
enum HttpPathStats {
    Table,
    Port,
    Path,
    Count,
}

#[derive(DeriveIden)]
enum TcpConnectionStats {
    Table,
    Port,
    ReadMin,
    ReadMax,
    WriteMin,
    WriteMax,
    Count,
}
