use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "service_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub port: i64,
    pub total_requests: i64,
    pub total_blocked_requests: i64,
    pub total_responses: i64,
    pub total_blocked_responses: i64,
    pub total_flags_written: i64,
    pub total_flags_retrieved: i64,
    pub total_flags_blocked: i64,
    pub total_tcp_connections: i64,
    pub total_tcp_bytes_in: i64,
    pub total_tcp_bytes_out: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
