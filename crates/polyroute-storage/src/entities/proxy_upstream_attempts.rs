use sea_orm::entity::prelude::*;
use time::OffsetDateTime;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "proxy_upstream_attempts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub proxy_request_id: i64,
    pub provider_id: i64,
    pub route_id: i64,
    pub sequence_no: i32,
    pub status: String,
    pub started_at: OffsetDateTime,
    pub ended_at: Option<OffsetDateTime>,
    pub http_status: Option<i32>,
    pub error_kind: Option<String>,
    pub error_message: Option<String>,
    pub usage_json: Json,
    pub cost_micro_usd: i64,
    #[sea_orm(belongs_to, from = "proxy_request_id", to = "id", on_delete = "Cascade")]
    pub proxy_request: HasOne<super::proxy_requests::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
