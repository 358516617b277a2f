use async_trait::async_trait;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use polyroute_model::repo::{ProjectRepo, RepoError, RepoResult};
use polyroute_model::Project;

use crate::entities;

pub struct SeaOrmProjectRepo {
    db: DatabaseConnection,
}

impl SeaOrmProjectRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::projects::Model) -> Project {
    Project {
        id: model.id,
        name: model.name,
        slug: model.slug,
        routing_strategy_id: model.routing_strategy_id,
    }
}

#[async_trait]
impl ProjectRepo for SeaOrmProjectRepo {
    async fn get(&self, id: i64) -> RepoResult<Project> {
        let model = entities::Projects::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        Ok(to_domain(model))
    }

    async fn get_by_slug(&self, slug: &str) -> RepoResult<Project> {
        let model = entities::Projects::find()
            .filter(entities::projects::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        Ok(to_domain(model))
    }

    async fn list(&self) -> RepoResult<Vec<Project>> {
        let models = entities::Projects::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(models.into_iter().map(to_domain).collect())
    }

    async fn upsert(&self, project: Project) -> RepoResult<Project> {
        let active = entities::projects::ActiveModel {
            id: if project.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(project.id) },
            name: ActiveValue::Set(project.name),
            slug: ActiveValue::Set(project.slug),
            routing_strategy_id: ActiveValue::Set(project.routing_strategy_id),
        };
        let saved = if project.id == 0 {
            entities::Projects::insert(active).exec_with_returning(&self.db).await
        } else {
            entities::Projects::update(active).exec(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(to_domain(saved))
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        entities::Projects::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
