use async_trait::async_trait;
use sea_orm::{ActiveValue, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};

use polyroute_common::ClientType;
use polyroute_model::repo::{RepoError, RepoResult, RouteRepo};
use polyroute_model::Route;

use crate::convert::{client_type_to_string, string_to_client_type};
use crate::entities;

pub struct SeaOrmRouteRepo {
    db: DatabaseConnection,
}

impl SeaOrmRouteRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::routes::Model) -> RepoResult<Route> {
    let client_type = string_to_client_type(&model.client_type)
        .ok_or_else(|| RepoError::Backend(format!("route {} has no client_type", model.id)))?;
    Ok(Route {
        id: model.id,
        project_id: model.project_id,
        client_type,
        provider_id: model.provider_id,
        position: model.position,
        enabled: model.enabled,
        is_native: model.is_native,
        retry_config_id: model.retry_config_id,
    })
}

#[async_trait]
impl RouteRepo for SeaOrmRouteRepo {
    async fn get(&self, id: i64) -> RepoResult<Route> {
        let model = entities::Routes::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        to_domain(model)
    }

    async fn list_for_scope(&self, project_id: i64, client_type: ClientType) -> RepoResult<Vec<Route>> {
        let models = entities::Routes::find()
            .filter(
                Condition::all()
                    .add(entities::routes::Column::ClientType.eq(client_type.as_str()))
                    .add(
                        Condition::any()
                            .add(entities::routes::Column::ProjectId.eq(project_id))
                            .add(entities::routes::Column::ProjectId.eq(0i64)),
                    ),
            )
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }

    async fn list_all(&self) -> RepoResult<Vec<Route>> {
        let models = entities::Routes::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        models.into_iter().map(to_domain).collect()
    }

    async fn upsert(&self, route: Route) -> RepoResult<Route> {
        let active = entities::routes::ActiveModel {
            id: if route.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(route.id) },
            project_id: ActiveValue::Set(route.project_id),
            client_type: ActiveValue::Set(client_type_to_string(Some(route.client_type))),
            provider_id: ActiveValue::Set(route.provider_id),
            position: ActiveValue::Set(route.position),
            enabled: ActiveValue::Set(route.enabled),
            is_native: ActiveValue::Set(route.is_native),
            retry_config_id: ActiveValue::Set(route.retry_config_id),
        };
        let saved = if route.id == 0 {
            entities::Routes::insert(active).exec_with_returning(&self.db).await
        } else {
            entities::Routes::update(active).exec(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        entities::Routes::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn renumber(&self, project_id: i64, client_type: ClientType, ordered_route_ids: Vec<i64>) -> RepoResult<()> {
        let txn = self.db.begin().await.map_err(|err| RepoError::Backend(err.to_string()))?;
        for (position, route_id) in ordered_route_ids.into_iter().enumerate() {
            let active = entities::routes::ActiveModel {
                id: ActiveValue::Set(route_id),
                project_id: ActiveValue::Set(project_id),
                client_type: ActiveValue::Set(client_type_to_string(Some(client_type))),
                position: ActiveValue::Set(position as i32),
                ..Default::default()
            };
            entities::Routes::update(active)
                .exec(&txn)
                .await
                .map_err(|err| RepoError::Backend(err.to_string()))?;
        }
        txn.commit().await.map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
