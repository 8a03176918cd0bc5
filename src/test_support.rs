// Fixtures partagées par les tests: SQLite en mémoire + jeu de données minimal

use actix_web::http::header;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, EntityTrait, PaginatorTrait, Set};

use crate::config::AppConfig;
use crate::db;
use crate::models::{boarding_history, bus, driver, parent, route, student, users};
use crate::services::access_policy::{Identity, Role};
use crate::services::store_service::{NewRoute, NewStudent, NewUser, StoreService};
use crate::utils::{jwt, password};

pub const PASSWORD: &str = "correct-horse";
pub const BUS_ID: i32 = 7;

pub struct Fixture {
    pub admin: users::Model,
    pub parent_user: users::Model,
    pub parent: parent::Model,
    pub student: student::Model,
    pub driver_user: users::Model,
    pub driver: driver::Model,
    pub bus: bus::Model,
    pub route: route::Model,
}

impl Fixture {
    pub fn admin_identity(&self) -> Identity {
        Identity { user_id: self.admin.id, username: self.admin.username.clone(), role: Role::Admin }
    }

    pub fn parent_identity(&self) -> Identity {
        Identity {
            user_id: self.parent_user.id,
            username: self.parent_user.username.clone(),
            role: Role::Parent { parent_id: self.parent.id },
        }
    }

    pub fn driver_identity(&self) -> Identity {
        Identity {
            user_id: self.driver_user.id,
            username: self.driver_user.username.clone(),
            role: Role::Driver { driver_id: self.driver.id },
        }
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "sqlite::memory:".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "test-secret".to_string(),
        token_ttl_hours: 1,
        map_base_url: "https://maps.example.org".to_string(),
        init_schema: true,
        password_iterations: 1000,
        admin_seed: None,
    }
}

/// App actix complète (routes + BD + config de test)
macro_rules! test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(actix_web::web::Data::new($crate::test_support::test_config()))
                .configure($crate::routes::configure_routes),
        )
        .await
    };
}
pub(crate) use test_app;

/// En-tête Authorization pour une identité donnée
pub fn bearer(identity: &Identity) -> (header::HeaderName, String) {
    let config = test_config();
    let token = jwt::generate_token(
        identity.user_id,
        &identity.username,
        identity.role,
        &config.jwt_secret,
        config.token_ttl_hours,
    )
    .unwrap();
    (header::AUTHORIZATION, format!("Bearer {}", token))
}

pub async fn setup_db() -> DatabaseConnection {
    // Une seule connexion: chaque connexion SQLite en mémoire est une base distincte
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let conn = Database::connect(options).await.unwrap();
    db::create_schema(&conn).await.unwrap();
    conn
}

pub async fn user(db: &DatabaseConnection, username: &str, is_superuser: bool) -> users::Model {
    StoreService::create_user(
        db,
        NewUser {
            username: username.to_string(),
            email: format!("{}@school.test", username),
            // peu d'itérations pour garder les tests rapides
            password_hash: password::hash_password_with_iterations(PASSWORD, 1000).unwrap(),
            first_name: username.to_string(),
            last_name: "Test".to_string(),
            is_superuser,
        },
    )
    .await
    .unwrap()
}

/// Un parent (avec son compte) et un enfant sans trajet
pub async fn family(
    db: &DatabaseConnection,
    username: &str,
    phone: &str,
    child_name: &str,
    rfid: &str,
) -> (parent::Model, student::Model) {
    let account = user(db, username, false).await;
    let parent = StoreService::create_parent(db, account.id, phone).await.unwrap();
    let child = StoreService::create_student(
        db,
        NewStudent {
            name: child_name.to_string(),
            rfid: rfid.to_string(),
            parent_id: parent.id,
            route_id: None,
        },
    )
    .await
    .unwrap();
    (parent, child)
}

/// Amy (TAG42), parent 5551234, trajet Depot -> Central School sur le bus 7
pub async fn seeded_db() -> (DatabaseConnection, Fixture) {
    let db = setup_db().await;

    let admin = user(&db, "admin", true).await;

    let route = StoreService::create_route(
        &db,
        NewRoute {
            name: "North loop".to_string(),
            start_location: "Depot".to_string(),
            end_location: "Central School".to_string(),
        },
    )
    .await
    .unwrap();

    let parent_user = user(&db, "amy_parent", false).await;
    let parent = StoreService::create_parent(&db, parent_user.id, "5551234").await.unwrap();
    let student = StoreService::create_student(
        &db,
        NewStudent {
            name: "Amy".to_string(),
            rfid: "TAG42".to_string(),
            parent_id: parent.id,
            route_id: Some(route.id),
        },
    )
    .await
    .unwrap();

    let driver_user = user(&db, "driver7", false).await;
    let driver = StoreService::create_driver(&db, driver_user.id, "5559876").await.unwrap();

    // id explicite pour coller aux scénarios "bus_id=7"
    bus::ActiveModel {
        id: Set(BUS_ID),
        number_plate: Set("SCH-007".to_string()),
        driver_id: Set(None),
        current_latitude: Set(None),
        current_longitude: Set(None),
        location_reported_at: Set(None),
    }
    .insert(&db)
    .await
    .unwrap();

    let bus = StoreService::assign_driver_to_bus(&db, BUS_ID, Some(driver.id)).await.unwrap();
    let route = StoreService::assign_bus_to_route(&db, route.id, Some(bus.id)).await.unwrap();

    let fixture = Fixture { admin, parent_user, parent, student, driver_user, driver, bus, route };
    (db, fixture)
}

pub async fn history_count(db: &DatabaseConnection) -> u64 {
    boarding_history::Entity::find().count(db).await.unwrap()
}
