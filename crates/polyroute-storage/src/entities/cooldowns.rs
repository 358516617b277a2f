use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cooldowns")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique_key = "cooldown_provider_client_type")]
    pub provider_id: i64,
    /// Empty string stands for "all client types" (§9).
    #[sea_orm(unique_key = "cooldown_provider_client_type")]
    pub client_type: String,
    pub until_unix_ms: i64,
    pub cause: String,
    pub incremental_count: i32,
}

impl ActiveModelBehavior for ActiveModel {}
