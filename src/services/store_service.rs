use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Condition, Expr};
use sea_orm::*;

use crate::error::{AppError, EntityKind};
use crate::models::boarding_history::BoardingAction;
use crate::models::dto::BoardingHistoryEntry;
use crate::models::{boarding_history, bus, driver, parent, route, student, users};

/// Accès aux entités: lectures par clé / clé alternative et écritures simples.
/// Une ligne absente est `Ok(None)`, jamais une erreur.
pub struct StoreService;

pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub is_superuser: bool,
}

pub struct NewStudent {
    pub name: String,
    pub rfid: String,
    pub parent_id: i32,
    pub route_id: Option<i32>,
}

pub struct NewRoute {
    pub name: String,
    pub start_location: String,
    pub end_location: String,
}

/// Résultat d'une écriture de position conditionnelle
#[derive(Debug, PartialEq)]
pub enum LocationWrite {
    Applied,
    Stale,
    MissingBus,
}

impl StoreService {
    // ---------------------------------------------------------------- users

    pub async fn create_user<C: ConnectionTrait>(db: &C, new_user: NewUser) -> Result<users::Model, AppError> {
        let user = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            first_name: Set(new_user.first_name),
            last_name: Set(new_user.last_name),
            is_superuser: Set(new_user.is_superuser),
            last_login: Set(None),
            ..Default::default()
        };

        user.insert(db)
            .await
            .map_err(|e| unique_to_conflict(e, "Username already exists"))
    }

    pub async fn find_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<users::Model>, AppError> {
        Ok(users::Entity::find_by_id(user_id).one(db).await?)
    }

    pub async fn find_user_by_username<C: ConnectionTrait>(db: &C, username: &str) -> Result<Option<users::Model>, AppError> {
        Ok(users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(db)
            .await?)
    }

    pub async fn find_user_by_email<C: ConnectionTrait>(db: &C, email: &str) -> Result<Option<users::Model>, AppError> {
        Ok(users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(db)
            .await?)
    }

    pub async fn touch_last_login<C: ConnectionTrait>(db: &C, user_id: i32, at: DateTime<Utc>) -> Result<(), AppError> {
        users::Entity::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(Some(at)))
            .filter(users::Column::Id.eq(user_id))
            .exec(db)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------ parents/drivers

    pub async fn create_parent<C: ConnectionTrait>(db: &C, user_id: i32, phone_number: &str) -> Result<parent::Model, AppError> {
        parent::ActiveModel {
            user_id: Set(user_id),
            phone_number: Set(phone_number.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| unique_to_conflict(e, "User already has a parent profile"))
    }

    pub async fn find_parent<C: ConnectionTrait>(db: &C, parent_id: i32) -> Result<Option<parent::Model>, AppError> {
        Ok(parent::Entity::find_by_id(parent_id).one(db).await?)
    }

    pub async fn find_parent_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<parent::Model>, AppError> {
        Ok(parent::Entity::find()
            .filter(parent::Column::UserId.eq(user_id))
            .one(db)
            .await?)
    }

    /// Refuse la suppression tant que des élèves y sont rattachés
    pub async fn delete_parent<C: ConnectionTrait>(db: &C, parent_id: i32) -> Result<(), AppError> {
        let parent = Self::find_parent(db, parent_id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Parent))?;

        let children = Self::students_of_parent(db, parent.id).await?;
        if !children.is_empty() {
            return Err(AppError::Conflict(format!(
                "Parent still has {} student(s); reassign them first.",
                children.len()
            )));
        }

        parent.delete(db).await?;
        Ok(())
    }

    pub async fn create_driver<C: ConnectionTrait>(db: &C, user_id: i32, phone_number: &str) -> Result<driver::Model, AppError> {
        driver::ActiveModel {
            user_id: Set(user_id),
            phone_number: Set(phone_number.to_string()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| unique_to_conflict(e, "User already has a driver profile"))
    }

    pub async fn find_driver<C: ConnectionTrait>(db: &C, driver_id: i32) -> Result<Option<driver::Model>, AppError> {
        Ok(driver::Entity::find_by_id(driver_id).one(db).await?)
    }

    pub async fn find_driver_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<driver::Model>, AppError> {
        Ok(driver::Entity::find()
            .filter(driver::Column::UserId.eq(user_id))
            .one(db)
            .await?)
    }

    // ------------------------------------------------------------- students

    /// Un badge RFID ne peut appartenir qu'à un seul élève
    pub async fn create_student<C: ConnectionTrait>(db: &C, new_student: NewStudent) -> Result<student::Model, AppError> {
        let rfid = new_student.rfid.trim().to_string();
        if rfid.is_empty() {
            return Err(AppError::invalid("RFID is required."));
        }
        if Self::find_student_by_rfid(db, &rfid).await?.is_some() {
            return Err(AppError::Conflict("RFID already assigned to another student.".to_string()));
        }
        if Self::find_parent(db, new_student.parent_id).await?.is_none() {
            return Err(AppError::NotFound(EntityKind::Parent));
        }
        if let Some(route_id) = new_student.route_id {
            if Self::find_route(db, route_id).await?.is_none() {
                return Err(AppError::NotFound(EntityKind::Route));
            }
        }

        student::ActiveModel {
            name: Set(new_student.name),
            rfid: Set(rfid),
            parent_id: Set(new_student.parent_id),
            route_id: Set(new_student.route_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| unique_to_conflict(e, "RFID already assigned to another student."))
    }

    pub async fn find_student<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<Option<student::Model>, AppError> {
        Ok(student::Entity::find_by_id(student_id).one(db).await?)
    }

    pub async fn find_student_by_rfid<C: ConnectionTrait>(db: &C, rfid: &str) -> Result<Option<student::Model>, AppError> {
        Ok(student::Entity::find()
            .filter(student::Column::Rfid.eq(rfid))
            .one(db)
            .await?)
    }

    pub async fn students_of_parent<C: ConnectionTrait>(db: &C, parent_id: i32) -> Result<Vec<student::Model>, AppError> {
        Ok(student::Entity::find()
            .filter(student::Column::ParentId.eq(parent_id))
            .order_by_asc(student::Column::Name)
            .all(db)
            .await?)
    }

    /// Élèves d'un trajet (dérivé de student.route_id, rien n'est stocké sur route)
    pub async fn students_on_route<C: ConnectionTrait>(db: &C, route_id: i32) -> Result<Vec<student::Model>, AppError> {
        Ok(student::Entity::find()
            .filter(student::Column::RouteId.eq(route_id))
            .order_by_asc(student::Column::Name)
            .all(db)
            .await?)
    }

    // ---------------------------------------------------------------- buses

    pub async fn create_bus<C: ConnectionTrait>(db: &C, number_plate: &str) -> Result<bus::Model, AppError> {
        bus::ActiveModel {
            number_plate: Set(number_plate.to_string()),
            driver_id: Set(None),
            current_latitude: Set(None),
            current_longitude: Set(None),
            location_reported_at: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| unique_to_conflict(e, "Number plate already exists"))
    }

    pub async fn find_bus<C: ConnectionTrait>(db: &C, bus_id: i32) -> Result<Option<bus::Model>, AppError> {
        Ok(bus::Entity::find_by_id(bus_id).one(db).await?)
    }

    pub async fn find_bus_by_driver<C: ConnectionTrait>(db: &C, driver_id: i32) -> Result<Option<bus::Model>, AppError> {
        Ok(bus::Entity::find()
            .filter(bus::Column::DriverId.eq(driver_id))
            .one(db)
            .await?)
    }

    /// UPDATE unique et conditionnel: la ligne n'est jamais dans un état mixte.
    /// Avec `reported_at`, un rapport plus ancien que celui stocké est ignoré.
    pub async fn write_bus_location<C: ConnectionTrait>(
        db: &C,
        bus_id: i32,
        latitude: f64,
        longitude: f64,
        reported_at: DateTime<Utc>,
        reject_older: bool,
    ) -> Result<LocationWrite, AppError> {
        let mut condition = Condition::all().add(bus::Column::Id.eq(bus_id));
        if reject_older {
            condition = condition.add(
                Condition::any()
                    .add(bus::Column::LocationReportedAt.is_null())
                    .add(bus::Column::LocationReportedAt.lte(reported_at)),
            );
        }

        let result = bus::Entity::update_many()
            .col_expr(bus::Column::CurrentLatitude, Expr::value(Some(latitude)))
            .col_expr(bus::Column::CurrentLongitude, Expr::value(Some(longitude)))
            .col_expr(bus::Column::LocationReportedAt, Expr::value(Some(reported_at)))
            .filter(condition)
            .exec(db)
            .await?;

        if result.rows_affected > 0 {
            return Ok(LocationWrite::Applied);
        }

        match Self::find_bus(db, bus_id).await? {
            Some(_) => Ok(LocationWrite::Stale),
            None => Ok(LocationWrite::MissingBus),
        }
    }

    /// Affecte (ou retire) le chauffeur d'un bus. Le chauffeur est d'abord
    /// retiré de tout autre bus, dans la même transaction.
    pub async fn assign_driver_to_bus(
        db: &DatabaseConnection,
        bus_id: i32,
        driver_id: Option<i32>,
    ) -> Result<bus::Model, AppError> {
        let txn = db.begin().await?;

        let bus = Self::find_bus(&txn, bus_id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Bus))?;

        if let Some(driver_id) = driver_id {
            if Self::find_driver(&txn, driver_id).await?.is_none() {
                return Err(AppError::NotFound(EntityKind::Driver));
            }

            bus::Entity::update_many()
                .col_expr(bus::Column::DriverId, Expr::value(Option::<i32>::None))
                .filter(bus::Column::DriverId.eq(driver_id))
                .filter(bus::Column::Id.ne(bus_id))
                .exec(&txn)
                .await?;
        }

        let mut active: bus::ActiveModel = bus.into();
        active.driver_id = Set(driver_id);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    // --------------------------------------------------------------- routes

    pub async fn create_route<C: ConnectionTrait>(db: &C, new_route: NewRoute) -> Result<route::Model, AppError> {
        Ok(route::ActiveModel {
            name: Set(new_route.name),
            start_location: Set(new_route.start_location),
            end_location: Set(new_route.end_location),
            bus_id: Set(None),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    pub async fn find_route<C: ConnectionTrait>(db: &C, route_id: i32) -> Result<Option<route::Model>, AppError> {
        Ok(route::Entity::find_by_id(route_id).one(db).await?)
    }

    /// Recherche inverse: le trajet dont bus_id pointe vers ce bus
    pub async fn find_route_by_bus<C: ConnectionTrait>(db: &C, bus_id: i32) -> Result<Option<route::Model>, AppError> {
        Ok(route::Entity::find()
            .filter(route::Column::BusId.eq(bus_id))
            .one(db)
            .await?)
    }

    /// Affecte (ou retire) le bus d'un trajet; le bus quitte son ancien trajet.
    pub async fn assign_bus_to_route(
        db: &DatabaseConnection,
        route_id: i32,
        bus_id: Option<i32>,
    ) -> Result<route::Model, AppError> {
        let txn = db.begin().await?;

        let route = Self::find_route(&txn, route_id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Route))?;

        if let Some(bus_id) = bus_id {
            if Self::find_bus(&txn, bus_id).await?.is_none() {
                return Err(AppError::NotFound(EntityKind::Bus));
            }

            route::Entity::update_many()
                .col_expr(route::Column::BusId, Expr::value(Option::<i32>::None))
                .filter(route::Column::BusId.eq(bus_id))
                .filter(route::Column::Id.ne(route_id))
                .exec(&txn)
                .await?;
        }

        let mut active: route::ActiveModel = route.into();
        active.bus_id = Set(bus_id);
        let updated = active.update(&txn).await?;

        txn.commit().await?;
        Ok(updated)
    }

    // ------------------------------------------------------------- history

    pub async fn append_boarding<C: ConnectionTrait>(
        db: &C,
        student_id: i32,
        bus_id: i32,
        action: BoardingAction,
        gps_location: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<boarding_history::Model, AppError> {
        Ok(boarding_history::ActiveModel {
            student_id: Set(student_id),
            bus_id: Set(bus_id),
            action: Set(action),
            gps_location: Set(gps_location.to_string()),
            timestamp: Set(timestamp),
            ..Default::default()
        }
        .insert(db)
        .await?)
    }

    /// Dernière montée (action = board), pas forcément "à bord" maintenant
    pub async fn latest_boarding<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<Option<boarding_history::Model>, AppError> {
        Ok(boarding_history::Entity::find()
            .filter(boarding_history::Column::StudentId.eq(student_id))
            .filter(boarding_history::Column::Action.eq(BoardingAction::Board))
            .order_by_desc(boarding_history::Column::Timestamp)
            .order_by_desc(boarding_history::Column::Id)
            .one(db)
            .await?)
    }

    /// Dernier événement, montée ou descente
    pub async fn latest_event<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<Option<boarding_history::Model>, AppError> {
        Ok(boarding_history::Entity::find()
            .filter(boarding_history::Column::StudentId.eq(student_id))
            .order_by_desc(boarding_history::Column::Timestamp)
            .order_by_desc(boarding_history::Column::Id)
            .one(db)
            .await?)
    }

    #[cfg(test)]
    pub async fn history_for_student<C: ConnectionTrait>(db: &C, student_id: i32) -> Result<Vec<boarding_history::Model>, AppError> {
        Ok(boarding_history::Entity::find()
            .filter(boarding_history::Column::StudentId.eq(student_id))
            .order_by_asc(boarding_history::Column::Timestamp)
            .order_by_asc(boarding_history::Column::Id)
            .all(db)
            .await?)
    }

    /// Journal complet avec nom de l'élève et plaque du bus, plus récent d'abord
    pub async fn history_with_details<C: ConnectionTrait>(db: &C) -> Result<Vec<BoardingHistoryEntry>, AppError> {
        let rows = boarding_history::Entity::find()
            .find_also_related(student::Entity)
            .order_by_desc(boarding_history::Column::Timestamp)
            .order_by_desc(boarding_history::Column::Id)
            .all(db)
            .await?;

        let buses: std::collections::HashMap<i32, String> = bus::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|b| (b.id, b.number_plate))
            .collect();

        Ok(rows
            .into_iter()
            .map(|(record, student)| BoardingHistoryEntry {
                id: record.id,
                student_name: student.map(|s| s.name).unwrap_or_default(),
                bus_number_plate: buses.get(&record.bus_id).cloned().unwrap_or_default(),
                action: record.action,
                gps_location: record.gps_location,
                timestamp: record.timestamp,
            })
            .collect())
    }
}

fn unique_to_conflict(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.to_string()),
        _ => AppError::StorageUnavailable(err),
    }
}
