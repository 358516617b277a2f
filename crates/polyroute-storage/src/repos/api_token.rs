use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use time::OffsetDateTime;

use polyroute_model::repo::{ApiTokenRepo, RepoError, RepoResult};
use polyroute_model::ApiToken;

use crate::entities;

pub struct SeaOrmApiTokenRepo {
    db: DatabaseConnection,
}

impl SeaOrmApiTokenRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::api_tokens::Model) -> ApiToken {
    ApiToken {
        id: model.id,
        token_hash: model.token_hash,
        label: model.label,
        created_at: model.created_at,
        revoked_at: model.revoked_at,
    }
}

#[async_trait]
impl ApiTokenRepo for SeaOrmApiTokenRepo {
    async fn list(&self) -> RepoResult<Vec<ApiToken>> {
        let models = entities::ApiTokens::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn insert(&self, token: ApiToken) -> RepoResult<ApiToken> {
        let active = entities::api_tokens::ActiveModel {
            id: ActiveValue::NotSet,
            token_hash: ActiveValue::Set(token.token_hash),
            label: ActiveValue::Set(token.label),
            created_at: ActiveValue::Set(token.created_at),
            revoked_at: ActiveValue::Set(token.revoked_at),
        };
        let saved = entities::ApiTokens::insert(active)
            .exec_with_returning(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(to_domain(saved))
    }

    async fn revoke(&self, id: i64, now: OffsetDateTime) -> RepoResult<()> {
        let model = entities::ApiTokens::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        let mut active: entities::api_tokens::ActiveModel = model.into();
        active.revoked_at = ActiveValue::Set(Some(now));
        entities::ApiTokens::update(active)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
