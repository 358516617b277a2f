use async_trait::async_trait;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use polyroute_model::repo::{RepoError, RepoResult, RetryConfigRepo};
use polyroute_model::RetryConfig;

use crate::entities;

pub struct SeaOrmRetryConfigRepo {
    db: DatabaseConnection,
}

impl SeaOrmRetryConfigRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::retry_configs::Model) -> RetryConfig {
    RetryConfig {
        id: model.id,
        is_default: model.is_default,
        max_attempts: model.max_attempts.max(0) as u32,
        first_byte_timeout_ms: model.first_byte_timeout_ms.max(0) as u64,
        stream_idle_timeout_ms: model.stream_idle_timeout_ms.max(0) as u64,
        backoff_seed_ms: model.backoff_seed_ms.max(0) as u64,
    }
}

#[async_trait]
impl RetryConfigRepo for SeaOrmRetryConfigRepo {
    async fn get(&self, id: i64) -> RepoResult<RetryConfig> {
        let model = entities::RetryConfigs::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        Ok(to_domain(model))
    }

    async fn get_default(&self) -> RepoResult<RetryConfig> {
        let model = entities::RetryConfigs::find()
            .filter(entities::retry_configs::Column::IsDefault.eq(true))
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        Ok(to_domain(model))
    }

    async fn list(&self) -> RepoResult<Vec<RetryConfig>> {
        let models = entities::RetryConfigs::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn upsert(&self, config: RetryConfig) -> RepoResult<RetryConfig> {
        let active = entities::retry_configs::ActiveModel {
            id: if config.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(config.id) },
            is_default: ActiveValue::Set(config.is_default),
            max_attempts: ActiveValue::Set(config.max_attempts as i32),
            first_byte_timeout_ms: ActiveValue::Set(config.first_byte_timeout_ms as i64),
            stream_idle_timeout_ms: ActiveValue::Set(config.stream_idle_timeout_ms as i64),
            backoff_seed_ms: ActiveValue::Set(config.backoff_seed_ms as i64),
        };
        let saved = if config.id == 0 {
            entities::RetryConfigs::insert(active).exec_with_returning(&self.db).await
        } else {
            entities::RetryConfigs::update(active).exec(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(to_domain(saved))
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        entities::RetryConfigs::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
