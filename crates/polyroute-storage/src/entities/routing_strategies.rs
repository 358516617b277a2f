use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "routing_strategies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique_key = "routing_strategy_project")]
    pub project_id: i64,
    pub strategy_type: String,
    /// `providerId -> weight`, only meaningful when `strategy_type` is `weighted`.
    pub weights_json: Json,
}

impl ActiveModelBehavior for ActiveModel {}
