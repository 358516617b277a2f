use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use polyroute_model::model_mapping::{ModelMappingScope, ModelPattern};
use polyroute_model::repo::{ModelMappingRepo, RepoError, RepoResult};
use polyroute_model::ModelMapping;

use crate::entities;

pub struct SeaOrmModelMappingRepo {
    db: DatabaseConnection,
}

impl SeaOrmModelMappingRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::model_mappings::Model) -> RepoResult<ModelMapping> {
    let pattern: ModelPattern =
        serde_json::from_value(model.pattern_json).map_err(|err| RepoError::Backend(err.to_string()))?;
    let scope: ModelMappingScope =
        serde_json::from_value(model.scope_json).map_err(|err| RepoError::Backend(err.to_string()))?;
    Ok(ModelMapping {
        id: model.id,
        pattern,
        target: model.target,
        scope,
        priority: model.priority,
        enabled: model.enabled,
    })
}

#[async_trait]
impl ModelMappingRepo for SeaOrmModelMappingRepo {
    async fn list(&self) -> RepoResult<Vec<ModelMapping>> {
        let models = entities::ModelMappings::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }

    async fn upsert(&self, mapping: ModelMapping) -> RepoResult<ModelMapping> {
        let pattern_json = serde_json::to_value(&mapping.pattern).map_err(|err| RepoError::Backend(err.to_string()))?;
        let scope_json = serde_json::to_value(&mapping.scope).map_err(|err| RepoError::Backend(err.to_string()))?;
        let active = entities::model_mappings::ActiveModel {
            id: if mapping.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(mapping.id) },
            pattern_json: ActiveValue::Set(pattern_json),
            target: ActiveValue::Set(mapping.target),
            scope_json: ActiveValue::Set(scope_json),
            priority: ActiveValue::Set(mapping.priority),
            enabled: ActiveValue::Set(mapping.enabled),
        };
        let saved = if mapping.id == 0 {
            entities::ModelMappings::insert(active).exec_with_returning(&self.db).await
        } else {
            entities::ModelMappings::update(active).exec(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        entities::ModelMappings::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
