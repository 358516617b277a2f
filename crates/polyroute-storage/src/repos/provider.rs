use std::collections::BTreeSet;

use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use polyroute_common::ClientType;
use polyroute_model::repo::{ProviderRepo, RepoError, RepoResult};
use polyroute_model::provider::ProviderType;
use polyroute_model::Provider;

use crate::entities;

pub struct SeaOrmProviderRepo {
    db: DatabaseConnection,
}

impl SeaOrmProviderRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn provider_type_to_string(provider_type: ProviderType) -> &'static str {
    match provider_type {
        ProviderType::Custom => "custom",
        ProviderType::Antigravity => "antigravity",
    }
}

fn string_to_provider_type(value: &str) -> ProviderType {
    match value {
        "antigravity" => ProviderType::Antigravity,
        _ => ProviderType::Custom,
    }
}

fn to_domain(model: entities::providers::Model) -> RepoResult<Provider> {
    let supported_client_types: BTreeSet<ClientType> = serde_json::from_value(model.supported_client_types_json)
        .map_err(|err| RepoError::Backend(err.to_string()))?;
    Ok(Provider {
        id: model.id,
        name: model.name,
        provider_type: string_to_provider_type(&model.provider_type),
        config: model.config_json,
        supported_client_types,
    })
}

#[async_trait]
impl ProviderRepo for SeaOrmProviderRepo {
    async fn get(&self, id: i64) -> RepoResult<Provider> {
        let model = entities::Providers::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        to_domain(model)
    }

    async fn list(&self) -> RepoResult<Vec<Provider>> {
        let models = entities::Providers::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }

    async fn upsert(&self, provider: Provider) -> RepoResult<Provider> {
        let supported_client_types_json = serde_json::to_value(&provider.supported_client_types)
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        let active = entities::providers::ActiveModel {
            id: if provider.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(provider.id) },
            name: ActiveValue::Set(provider.name),
            provider_type: ActiveValue::Set(provider_type_to_string(provider.provider_type).to_string()),
            config_json: ActiveValue::Set(provider.config),
            supported_client_types_json: ActiveValue::Set(supported_client_types_json),
        };
        let saved = if provider.id == 0 {
            entities::Providers::insert(active)
                .exec_with_returning(&self.db)
                .await
        } else {
            entities::Providers::update(active).exec(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        entities::Providers::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
