// connexion BD

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::config::AppConfig;
use crate::models::{boarding_history, bus, driver, parent, route, student, users};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Crée les tables manquantes à partir des entités (ordre = dépendances des FK)
pub async fn create_schema<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, parent::Entity).await?;
    create_table(db, driver::Entity).await?;
    create_table(db, bus::Entity).await?;
    create_table(db, route::Entity).await?;
    create_table(db, student::Entity).await?;
    create_table(db, boarding_history::Entity).await?;
    info!("Database schema ready");
    Ok(())
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}
