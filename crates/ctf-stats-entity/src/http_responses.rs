use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "http_responses")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub request_id: i64,
    pub status: i64,
    pub body: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::http_requests::Entity",
        from = "Column::RequestId",
        to = "super::http_requests::Column::Id"
    )]
    HttpRequest,
}

impl Related<super::http_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HttpRequest.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
