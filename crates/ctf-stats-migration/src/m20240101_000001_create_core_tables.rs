use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(HttpRequests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HttpRequests::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HttpRequests::Port).big_integer().not_null())
                    .col(ColumnDef::new(HttpRequests::StartTime).big_integer().not_null())
                    .col(ColumnDef::new(HttpRequests::Method).string())
                    .col(ColumnDef::new(HttpRequests::Path).string())
                    .col(ColumnDef::new(HttpRequests::UserAgent).string())
                    .col(ColumnDef::new(HttpRequests::Body).text())
                    .col(
                        ColumnDef::new(HttpRequests::IsBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(HttpRequests::TapId).string())
                    .col(ColumnDef::new(HttpRequests::BatchId).string())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_http_requests_port_start_time")
                    .table(HttpRequests::Table)
                    .col(HttpRequests::Port)
                    .col(HttpRequests::StartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpResponses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HttpResponses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(HttpResponses::RequestId)
                            .big_integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(HttpResponses::Status).big_integer().not_null())
                    .col(ColumnDef::new(HttpResponses::Body).text())
                    .foreign_key(
                        ForeignKey::create()
                            .from(HttpResponses::Table, HttpResponses::RequestId)
                            .to(HttpRequests::Table, HttpRequests::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(HttpHeaders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(HttpHeaders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(HttpHeaders::Name).string().not_null())
                    .col(ColumnDef::new(HttpHeaders::Value).text().not_null())
                    .col(ColumnDef::new(HttpHeaders::RequestId).big_integer())
                    .col(ColumnDef::new(HttpHeaders::ResponseId).big_integer())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_http_headers_request_id")
                    .table(HttpHeaders::Table)
                    .col(HttpHeaders::RequestId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_http_headers_response_id")
                    .table(HttpHeaders::Table)
                    .col(HttpHeaders::ResponseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TcpConnections::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TcpConnections::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TcpConnections::Port).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnections::ConnectionId).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnections::StartTime).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnections::DurationMs).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnections::BytesIn).big_integer().not_null())
                    .col(ColumnDef::new(TcpConnections::BytesOut).big_integer().not_null())
                    .col(
                        ColumnDef::new(TcpConnections::IsBlocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(TcpConnections::TapId).string())
                    .col(ColumnDef::new(TcpConnections::BatchId).string())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_tcp_connections_port_start_time")
                    .table(TcpConnections::Table)
                    .col(TcpConnections::Port)
                    .col(TcpConnections::StartTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TcpEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TcpEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(TcpEvents::ConnectionId).big_integer().not_null())
                    .col(ColumnDef::new(TcpEvents::Timestamp).big_integer().not_null())
                    .col(ColumnDef::new(TcpEvents::EventType).string().not_null())
                    .col(ColumnDef::new(TcpEvents::Data).blob().not_null())
                    .col(ColumnDef::new(TcpEvents::DataSize).big_integer().not_null())
                    .col(
                        ColumnDef::new(TcpEvents::EndStream)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TcpEvents::Truncated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TcpEvents::Table, TcpEvents::ConnectionId)
                            .to(TcpConnections::Table, TcpConnections::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_tcp_events_connection_id")
                    .table(TcpEvents::Table)
                    .col(TcpEvents::ConnectionId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Flags::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Flags::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Flags::Value).text().not_null())
                    .col(ColumnDef::new(Flags::HttpRequestId).big_integer())
                    .col(ColumnDef::new(Flags::HttpResponseId).big_integer())
                    .col(ColumnDef::new(Flags::TcpConnectionId).big_integer())
                    .col(ColumnDef::new(Flags::TcpEventId).big_integer())
                    .col(ColumnDef::new(Flags::Location).string())
                    .col(ColumnDef::new(Flags::Offset).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Alerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Alerts::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Alerts::Created).big_integer().not_null())
                    .col(ColumnDef::new(Alerts::Port).big_integer().not_null())
                    .col(ColumnDef::new(Alerts::Description).text().not_null())
                    .col(ColumnDef::new(Alerts::HttpRequestId).big_integer())
                    .col(ColumnDef::new(Alerts::HttpResponseId).big_integer())
                    .col(ColumnDef::new(Alerts::TcpConnectionId).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Sessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sessions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sessions::Port).big_integer().not_null())
                    .col(ColumnDef::new(Sessions::Key).string().not_null())
                    .col(ColumnDef::new(Sessions::Count).big_integer().not_null().default(0))
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_sessions_port_key")
                    .table(Sessions::Table)
                    .col(Sessions::Port)
                    .col(Sessions::Key)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SessionLinks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SessionLinks::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SessionLinks::SessionId).big_integer().not_null())
                    .col(ColumnDef::new(SessionLinks::HttpRequestId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(SessionLinks::Table, SessionLinks::SessionId)
                            .to(Sessions::Table, Sessions::Id),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_session_links_unique")
                    .table(SessionLinks::Table)
                    .col(SessionLinks::SessionId)
                    .col(SessionLinks::HttpRequestId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            SessionLinks::Table.into_iden(),
            Sessions::Table.into_iden(),
            Alerts::Table.into_iden(),
            Flags::Table.into_iden(),
            TcpEvents::Table.into_iden(),
            TcpConnections::Table.into_iden(),
            HttpHeaders::Table.into_iden(),
            HttpResponses::Table.into_iden(),
            HttpRequests::Table.into_iden(),
        ] {
            manager
                .drop_table(Table::drop().table(table).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum HttpRequests {
    Table,
    Id,
    Port,
    StartTime,
    Method,
    Path,
    UserAgent,
    Body,
    IsBlocked,
    TapId,
    BatchId,
}

#[derive(DeriveIden)]
enum HttpResponses {
    Table,
    Id,
    RequestId,
    Status,
    Body,
}

#[derive(DeriveIden)]
enum HttpHeaders {
    Table,
    Id,
    Name,
    Value,
    RequestId,
    ResponseId,
}

#[derive(DeriveIden)]
enum TcpConnections {
    Table,
    Id,
    Port,
    ConnectionId,
    StartTime,
    DurationMs,
    BytesIn,
    BytesOut,
    IsBlocked,
    TapId,
    BatchId,
}

#[derive(DeriveIden)]
enum TcpEvents {
    Table,
    Id,
    ConnectionId,
    Timestamp,
    EventType,
    Data,
    DataSize,
    EndStream,
    Truncated,
}

#[derive(DeriveIden)]
enum Flags {
    Table,
    Id,
    Value,
    HttpRequestId,
    HttpResponseId,
    TcpConnectionId,
    TcpEventId,
    Location,
    Offset,
}

#[derive(DeriveIden)]
enum Alerts {
    Table,
    Id,
    Created,
    Port,
    Description,
    HttpRequestId,
    HttpResponseId,
    TcpConnectionId,
}

#[derive(DeriveIden)]
enum Sessions {
    Table,
    Id,
    Port,
    Key,
    Count,
}

#[derive(DeriveIden)]
enum SessionLinks {
    Table,
    Id,
    SessionId,
    HttpRequestId,
}
