use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "retry_configs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub is_default: bool,
    pub max_attempts: i32,
    pub first_byte_timeout_ms: i64,
    pub stream_idle_timeout_ms: i64,
    pub backoff_seed_ms: i64,
}

impl ActiveModelBehavior for ActiveModel {}
