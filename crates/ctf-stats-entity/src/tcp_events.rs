use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tcp_events")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub connection_id: i64,
    pub timestamp: i64,
    pub event_type: String,
    #[sea_orm(column_type = "Blob")]
    pub data: Vec<u8>,
    pub data_size: i64,
    pub end_stream: bool,
    pub truncated: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::tcp_connections::Entity",
        from = "Column::ConnectionId",
        to = "super::tcp_connections::Column::Id"
    )]
    TcpConnection,
}

impl Related<super::tcp_connections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TcpConnection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
