use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use time::OffsetDateTime;

use polyroute_model::repo::{RepoError, RepoResult, SessionRepo};
use polyroute_model::Session;

use crate::convert::{client_type_to_string, string_to_client_type};
use crate::entities;

pub struct SeaOrmSessionRepo {
    db: DatabaseConnection,
}

impl SeaOrmSessionRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::sessions::Model) -> RepoResult<Session> {
    let client_type = string_to_client_type(&model.client_type)
        .ok_or_else(|| RepoError::Backend(format!("session {} has no client_type", model.session_id)))?;
    Ok(Session {
        session_id: model.session_id,
        client_type,
        created_at: model.created_at,
        project_id: model.project_id,
        rejected_at: model.rejected_at,
    })
}

#[async_trait]
impl SessionRepo for SeaOrmSessionRepo {
    async fn get(&self, session_id: &str) -> RepoResult<Option<Session>> {
        let model = entities::Sessions::find_by_id(session_id.to_string())
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        model.map(to_domain).transpose()
    }

    async fn upsert(&self, session: Session) -> RepoResult<Session> {
        let active = entities::sessions::ActiveModel {
            session_id: ActiveValue::Set(session.session_id.clone()),
            client_type: ActiveValue::Set(client_type_to_string(Some(session.client_type))),
            created_at: ActiveValue::Set(session.created_at),
            project_id: ActiveValue::Set(session.project_id),
            rejected_at: ActiveValue::Set(session.rejected_at),
        };
        let exists = entities::Sessions::find_by_id(session.session_id.clone())
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .is_some();
        let saved = if exists {
            entities::Sessions::update(active).exec(&self.db).await
        } else {
            entities::Sessions::insert(active).exec_with_returning(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn bind_project(&self, session_id: &str, project_id: i64) -> RepoResult<Session> {
        let model = entities::Sessions::find_by_id(session_id.to_string())
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        let mut active: entities::sessions::ActiveModel = model.into();
        active.project_id = ActiveValue::Set(Some(project_id));
        active.rejected_at = ActiveValue::Set(None);
        let saved = entities::Sessions::update(active)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn reject(&self, session_id: &str, now: OffsetDateTime) -> RepoResult<Session> {
        let model = entities::Sessions::find_by_id(session_id.to_string())
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        let mut active: entities::sessions::ActiveModel = model.into();
        active.rejected_at = ActiveValue::Set(Some(now));
        let saved = entities::Sessions::update(active)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn clear_rejection(&self, session_id: &str) -> RepoResult<()> {
        let model = entities::Sessions::find_by_id(session_id.to_string())
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        let mut active: entities::sessions::ActiveModel = model.into();
        active.rejected_at = ActiveValue::Set(None);
        entities::Sessions::update(active)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
