use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub port: i64,
    pub key: String,
    pub count: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::session_links::Entity")]
    SessionLink,
}

impl Related<super::session_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SessionLink.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
