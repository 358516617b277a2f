use async_trait::async_trait;
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};

use polyroute_model::repo::{RepoError, RepoResult, SystemSettingRepo};
use polyroute_model::SystemSetting;

use crate::entities;

pub struct SeaOrmSystemSettingRepo {
    db: DatabaseConnection,
}

impl SeaOrmSystemSettingRepo {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SystemSettingRepo for SeaOrmSystemSettingRepo {
    async fn get(&self, key: &str) -> RepoResult<Option<SystemSetting>> {
        let model = entities::SystemSettings::find_by_id(key.to_string())
            .one(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(model.map(|model| SystemSetting { key: model.key, value: model.value }))
    }

    async fn list(&self) -> RepoResult<Vec<SystemSetting>> {
        let models = entities::SystemSettings::find()
            .all(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(models
            .into_iter()
            .map(|model| SystemSetting { key: model.key, value: model.value })
            .collect())
    }

    async fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        let active = entities::system_settings::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
        };
        entities::SystemSettings::insert(active)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(entities::system_settings::Column::Key)
                    .update_column(entities::system_settings::Column::Value)
                    .to_owned(),
            )
            .exec(&self.db)
            .await
            .map_err(|err| RepoError::Backend(err.to_string()))?;
        Ok(())
    }
}
