use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};

use polyroute_model::repo::{ProxyRequestRepo, RepoError, RepoResult};
use polyroute_model::{ProxyRequest, Usage};

use crate::convert::{client_type_to_string, request_status_to_string, string_to_client_type, string_to_request_status};
use crate::entities;

pub struct SeaOrmProxyRequestRepo {
    db: DatabaseConnection,
}

impl SeaOrmProxyRequestRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::proxy_requests::Model) -> RepoResult<ProxyRequest> {
    let client_type = string_to_client_type(&model.client_type)
        .ok_or_else(|| RepoError::Backend(format!("proxy request {} has no client_type", model.id)))?;
    let usage: Usage = serde_json::from_value(model.usage_json).map_err(|err| RepoError::Backend(err.to_string()))?;
    Ok(ProxyRequest {
        id: model.id,
        start_time: model.start_time,
        end_time: model.end_time,
        status: string_to_request_status(&model.status),
        client_type,
        request_model: model.request_model,
        response_model: model.response_model,
        session_id: model.session_id,
        project_id: model.project_id,
        cost_micro_usd: model.cost_micro_usd,
        usage,
    })
}

fn to_active(request: &ProxyRequest) -> RepoResult<entities::proxy_requests::ActiveModel> {
    let usage_json = serde_json::to_value(request.usage).map_err(|err| RepoError::Backend(err.to_string()))?;
    Ok(entities::proxy_requests::ActiveModel {
        id: if request.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(request.id) },
        start_time: ActiveValue::Set(request.start_time),
        end_time: ActiveValue::Set(request.end_time),
        status: ActiveValue::Set(request_status_to_string(request.status).to_string()),
        client_type: ActiveValue::Set(client_type_to_string(Some(request.client_type))),
        request_model: ActiveValue::Set(request.request_model.clone()),
        response_model: ActiveValue::Set(request.response_model.clone()),
        session_id: ActiveValue::Set(request.session_id.clone()),
        project_id: ActiveValue::Set(request.project_id),
        cost_micro_usd: ActiveValue::Set(request.cost_micro_usd),
        usage_json: ActiveValue::Set(usage_json),
    })
}

#[async_trait]
impl ProxyRequestRepo for SeaOrmProxyRequestRepo {
    async fn insert(&self, request: ProxyRequest) -> RepoResult<ProxyRequest> {
        let active = to_active(&request)?;
        let saved = entities::ProxyRequests::insert(active)
            .exec_with_returning(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn update(&self, request: ProxyRequest) -> RepoResult<ProxyRequest> {
        let active = to_active(&request)?;
        let saved = entities::ProxyRequests::update(active)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn get(&self, id: i64) -> RepoResult<ProxyRequest> {
        let model = entities::ProxyRequests::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        to_domain(model)
    }

    async fn list_recent(&self, limit: usize, offset: usize) -> RepoResult<Vec<ProxyRequest>> {
        let models = entities::ProxyRequests::find()
            .order_by_desc(entities::proxy_requests::Column::Id)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }
}
