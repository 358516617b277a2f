use async_trait::async_trait;
use sea_orm::{ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};

use polyroute_common::ClientType;
use polyroute_model::repo::{CooldownRepo, RepoError, RepoResult};
use polyroute_model::Cooldown;

use crate::convert::{client_type_to_string, string_to_client_type, string_to_cooldown_cause};
use crate::entities;

pub struct SeaOrmCooldownRepo {
    db: DatabaseConnection,
}

impl SeaOrmCooldownRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::cooldowns::Model) -> Cooldown {
    Cooldown {
        provider_id: model.provider_id,
        client_type: string_to_client_type(&model.client_type),
        until_unix_ms: model.until_unix_ms,
        cause: string_to_cooldown_cause(&model.cause),
        incremental_count: model.incremental_count.max(0) as u32,
    }
}

#[async_trait]
impl CooldownRepo for SeaOrmCooldownRepo {
    async fn get(&self, provider_id: i64, client_type: Option<ClientType>) -> RepoResult<Option<Cooldown>> {
        let model = entities::Cooldowns::find()
            .filter(
                Condition::all()
                    .add(entities::cooldowns::Column::ProviderId.eq(provider_id))
                    .add(entities::cooldowns::Column::ClientType.eq(client_type_to_string(client_type))),
            )
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(model.map(to_domain))
    }

    async fn list(&self) -> RepoResult<Vec<Cooldown>> {
        let models = entities::Cooldowns::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn upsert(&self, cooldown: Cooldown) -> RepoResult<()> {
        let client_type = client_type_to_string(cooldown.client_type);
        let existing = entities::Cooldowns::find()
            .filter(
                Condition::all()
                    .add(entities::cooldowns::Column::ProviderId.eq(cooldown.provider_id))
                    .add(entities::cooldowns::Column::ClientType.eq(client_type.clone())),
            )
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;

        let active = entities::cooldowns::ActiveModel {
            id: match existing {
                Some(ref model) => ActiveValue::Set(model.id),
                None => ActiveValue::NotSet,
            },
            provider_id: ActiveValue::Set(cooldown.provider_id),
            client_type: ActiveValue::Set(client_type),
            until_unix_ms: ActiveValue::Set(cooldown.until_unix_ms),
            cause: ActiveValue::Set(crate::convert::cooldown_cause_to_string(cooldown.cause).to_string()),
            incremental_count: ActiveValue::Set(cooldown.incremental_count as i32),
        };
        if existing.is_some() {
            entities::Cooldowns::update(active)
                .exec(&self.db)
                .await
                .map_err(|err| RepoError::Backend(err.to_string()))?;
        } else {
            entities::Cooldowns::insert(active)
                .exec(&self.db)
                .await
                .map_err(|err| RepoError::Backend(err.to_string()))?;
        }
        Ok(())
    }

    async fn clear(&self, provider_id: i64) -> RepoResult<()> {
        entities::Cooldowns::delete_many()
            .filter(entities::cooldowns::Column::ProviderId.eq(provider_id))
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn delete_expired(&self, now_unix_ms: i64) -> RepoResult<u64> {
        let result = entities::Cooldowns::delete_many()
            .filter(entities::cooldowns::Column::UntilUnixMs.lte(now_unix_ms))
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(result.rows_affected)
    }
}
