use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "proxy_requests")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub start_time: OffsetDateTime,
    pub end_time: Option<OffsetDateTime>,
    pub status: String,
    pub client_type: String,
    pub request_model: String,
    pub response_model: Option<String>,
    pub session_id: Option<String>,
    pub project_id: i64,
    pub cost_micro_usd: i64,
    pub usage_json: Json,
}

impl ActiveModelBehavior for ActiveModel {}
