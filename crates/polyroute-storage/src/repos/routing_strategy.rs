use std::collections::BTreeMap;

use async_trait::async_trait;
use sea_orm::{ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use polyroute_model::repo::{RepoError, RepoResult, RoutingStrategyRepo};
use polyroute_model::RoutingStrategy;

use crate::convert::{strategy_type_to_string, string_to_strategy_type};
use crate::entities;

pub struct SeaOrmRoutingStrategyRepo {
    db: DatabaseConnection,
}

impl SeaOrmRoutingStrategyRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_domain(model: entities::routing_strategies::Model) -> RepoResult<RoutingStrategy> {
    let weights: BTreeMap<i64, u32> =
        serde_json::from_value(model.weights_json).map_err(|err| RepoError::Backend(err.to_string()))?;
    Ok(RoutingStrategy {
        id: model.id,
        project_id: model.project_id,
        strategy_type: string_to_strategy_type(&model.strategy_type),
        weights,
    })
}

#[async_trait]
impl RoutingStrategyRepo for SeaOrmRoutingStrategyRepo {
    async fn get_for_project(&self, project_id: i64) -> RepoResult<RoutingStrategy> {
        let model = entities::RoutingStrategies::find()
            .filter(entities::routing_strategies::Column::ProjectId.eq(project_id))
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?
            .ok_or(RepoError::NotFound)?;
        to_domain(model)
    }

    async fn upsert(&self, strategy: RoutingStrategy) -> RepoResult<RoutingStrategy> {
        let weights_json = serde_json::to_value(&strategy.weights).map_err(|err| RepoError::Backend(err.to_string()))?;
        let active = entities::routing_strategies::ActiveModel {
            id: if strategy.id == 0 { ActiveValue::NotSet } else { ActiveValue::Set(strategy.id) },
            project_id: ActiveValue::Set(strategy.project_id),
            strategy_type: ActiveValue::Set(strategy_type_to_string(strategy.strategy_type).to_string()),
            weights_json: ActiveValue::Set(weights_json),
        };
        let saved = if strategy.id == 0 {
            entities::RoutingStrategies::insert(active).exec_with_returning(&self.db).await
        } else {
            entities::RoutingStrategies::update(active).exec(&self.db).await
        }
        .map_err(|err| RepoError::Backend(err.to_string()))?;
        to_domain(saved)
    }
}
