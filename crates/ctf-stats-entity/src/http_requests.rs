use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "http_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub port: i64,
    pub start_time: i64,
    pub method: Option<String>,
    pub path: Option<String>,
    pub user_agent: Option<String>,
    pub body: Option<String>,
    pub is_blocked: bool,
    pub tap_id: Option<String>,
    pub batch_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::http_responses::Entity")]
    HttpResponse,
}

impl Related<super::http_responses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HttpResponse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
