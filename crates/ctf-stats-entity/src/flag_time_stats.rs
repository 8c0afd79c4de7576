use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "flag_time_stats")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub port: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub time: i64,
    pub write_count: i64,
    pub read_count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
