use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "http_response_code_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub port: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub status_code: i64,
    pub count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
