use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "flags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub value: String,
    pub http_request_id: Option<i64>,
    pub http_response_id: Option<i64>,
    pub tcp_connection_id: Option<i64>,
    pub tcp_event_id: Option<i64>,
    pub location: Option<String>,
    pub offset: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
