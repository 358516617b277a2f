use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "model_mappings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub pattern_json: Json,
    pub target: String,
    pub scope_json: Json,
    pub priority: i32,
    pub enabled: bool,
}

impl ActiveModelBehavior for ActiveModel {}
