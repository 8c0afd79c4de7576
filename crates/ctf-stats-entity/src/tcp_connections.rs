use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tcp_connections")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub port: i64,
    pub connection_id: i64,
    pub start_time: i64,
    pub duration_ms: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub is_blocked: bool,
    pub tap_id: Option<String>,
    pub batch_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::tcp_events::Entity")]
    TcpEvent,
}

impl Related<super::tcp_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TcpEvent.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
