//! Connection bootstrap and entity-first schema sync (SeaORM 2.0).

use sea_orm::{Database, DatabaseBackend, DatabaseConnection, DbErr, Schema};

use crate::entities;

pub async fn connect(dsn: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(dsn).await?;
    if db.get_database_backend() == DatabaseBackend::Sqlite {
        use sea_orm::ConnectionTrait;
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;
    }
    Ok(db)
}

/// Creates or migrates every table this crate owns. Safe to call on every
/// boot; SeaORM's entity registry diffs the live schema against the
/// entity definitions and only applies what's missing (§10.5).
pub async fn sync(db: &DatabaseConnection) -> Result<(), DbErr> {
    Schema::new(db.get_database_backend())
        .builder()
        .register(entities::Providers)
        .register(entities::Projects)
        .register(entities::Routes)
        .register(entities::RoutingStrategies)
        .register(entities::RetryConfigs)
        .register(entities::ModelMappings)
        .register(entities::SystemSettings)
        .register(entities::ApiTokens)
        .register(entities::Cooldowns)
        .register(entities::Sessions)
        .register(entities::ProxyRequests)
        .register(entities::ProxyUpstreamAttempts)
        .sync(db)
        .await
}
