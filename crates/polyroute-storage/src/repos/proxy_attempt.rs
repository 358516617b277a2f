use async_trait::async_trait;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use polyroute_model::repo::{ProxyUpstreamAttemptRepo, RepoError, RepoResult};
use polyroute_model::{ProxyUpstreamAttempt, Usage};

use crate::convert::{attempt_status_to_string, error_kind_to_string, string_to_attempt_status, string_to_error_kind};
use crate::entities;

pub struct SeaOrmProxyUpstreamAttemptRepo {
    db: DatabaseConnection,
}

impl SeaOrmProxyUpstreamAttemptRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::proxy_upstream_attempts::Model) -> RepoResult<ProxyUpstreamAttempt> {
    let usage: Usage = serde_json::from_value(model.usage_json).map_err(|err| RepoError::Backend(err.to_string()))?;
    let error_kind = model.error_kind.as_deref().and_then(string_to_error_kind);
    Ok(ProxyUpstreamAttempt {
        id: model.id,
        proxy_request_id: model.proxy_request_id,
        provider_id: model.provider_id,
        route_id: model.route_id,
        sequence_no: model.sequence_no.max(0) as u32,
        status: string_to_attempt_status(&model.status),
        started_at: model.started_at,
        ended_at: model.ended_at,
        http_status: model.http_status.map(|status| status as u16),
        error_kind,
        error_message: model.error_message,
        usage,
        cost_micro_usd: model.cost_micro_usd,
    })
}

fn to_active(attempt: &ProxyUpstreamAttempt) -> RepoResult<entities::proxy_upstream_attempts::ActiveModel> {
    let usage_json = serde_json::to_value(attempt.usage).map_err(|err| RepoError::Backend(err.to_string()))?;
    Ok(entities::proxy_upstream_attempts::ActiveModel {
        id: if attempt.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(attempt.id) },
        proxy_request_id: ActiveValue::Set(attempt.proxy_request_id),
        provider_id: ActiveValue::Set(attempt.provider_id),
        route_id: ActiveValue::Set(attempt.route_id),
        sequence_no: ActiveValue::Set(attempt.sequence_no as i32),
        status: ActiveValue::Set(attempt_status_to_string(attempt.status).to_string()),
        started_at: ActiveValue::Set(attempt.started_at),
        ended_at: ActiveValue::Set(attempt.ended_at),
        http_status: ActiveValue::Set(attempt.http_status.map(|status| status as i32)),
        error_kind: ActiveValue::Set(attempt.error_kind.map(error_kind_to_string).map(str::to_string)),
        error_message: ActiveValue::Set(attempt.error_message.clone()),
        usage_json: ActiveValue::Set(usage_json),
        cost_micro_usd: ActiveValue::Set(attempt.cost_micro_usd),
    })
}

#[async_trait]
impl ProxyUpstreamAttemptRepo for SeaOrmProxyUpstreamAttemptRepo {
    async fn insert(&self, attempt: ProxyUpstreamAttempt) -> RepoResult<ProxyUpstreamAttempt> {
        let active = to_active(&attempt)?;
        let saved = entities::ProxyUpstreamAttempts::insert(active)
            .exec_with_returning(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn update(&self, attempt: ProxyUpstreamAttempt) -> RepoResult<ProxyUpstreamAttempt> {
        let active = to_active(&attempt)?;
        let saved = entities::ProxyUpstreamAttempts::update(active)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn list_for_request(&self, proxy_request_id: i64) -> RepoResult<Vec<ProxyUpstreamAttempt>> {
        let models = entities::ProxyUpstreamAttempts::find()
            .filter(entities::proxy_upstream_attempts::Column::ProxyRequestId.eq(proxy_request_id))
            .order_by_asc(entities::proxy_upstream_attempts::Column::SequenceNo)
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }

    async fn list_recent(&self, limit: usize, offset: usize) -> RepoResult<Vec<ProxyUpstreamAttempt>> {
        let models = entities::ProxyUpstreamAttempts::find()
            .order_by_desc(entities::proxy_upstream_attempts::Column::Id)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }
}
