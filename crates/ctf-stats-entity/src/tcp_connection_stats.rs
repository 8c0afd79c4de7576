use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tcp_connection_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub port: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub read_min: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub read_max: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub write_min: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub write_max: i64,
    pub count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
