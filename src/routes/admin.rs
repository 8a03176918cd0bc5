use actix_web::{delete, get, post, put, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::models::dto::{
    AssignBusRequest, AssignDriverRequest, CreateAccountRequest, CreateBusRequest, CreateRouteRequest,
    CreateStudentRequest,
};
use crate::routes::tracking::redirect_to_map;
use crate::services::access_policy::Identity;
use crate::services::account_service::AccountService;
use crate::services::store_service::{NewRoute, NewStudent, StoreService};
use crate::services::tracking_service::TrackingService;

fn require_admin(auth_user: &AuthUser) -> Result<&Identity, AppError> {
    let identity = auth_user.identity();
    if !identity.is_admin() {
        warn!(user_id = identity.user_id, "admin endpoint denied");
        return Err(AppError::Forbidden);
    }
    Ok(identity)
}

/// POST /admin/accounts - Créer un compte admin, parent ou chauffeur
#[post("/accounts")]
pub async fn create_account(
    auth_user: AuthUser,
    body: web::Json<CreateAccountRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth_user)?;
    let (user, role) = AccountService::create_account(db.get_ref(), &config, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(json!({
        "user_id": user.id,
        "username": user.username,
        "role": role
    })))
}

/// POST /admin/students - Inscrire un élève (badge RFID unique)
#[post("/students")]
pub async fn create_student(
    auth_user: AuthUser,
    body: web::Json<CreateStudentRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth_user)?;
    let body = body.into_inner();
    let student = StoreService::create_student(
        db.get_ref(),
        NewStudent {
            name: body.name,
            rfid: body.rfid,
            parent_id: body.parent_id,
            route_id: body.route_id,
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(student))
}

/// POST /admin/buses
#[post("/buses")]
pub async fn create_bus(
    auth_user: AuthUser,
    body: web::Json<CreateBusRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth_user)?;
    let plate = body.number_plate.trim();
    if plate.is_empty() {
        return Err(AppError::invalid("Number plate is required."));
    }
    let bus = StoreService::create_bus(db.get_ref(), plate).await?;
    Ok(HttpResponse::Created().json(bus))
}

/// POST /admin/routes
#[post("/routes")]
pub async fn create_route(
    auth_user: AuthUser,
    body: web::Json<CreateRouteRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth_user)?;
    let body = body.into_inner();
    if body.name.trim().is_empty() || body.start_location.trim().is_empty() || body.end_location.trim().is_empty() {
        return Err(AppError::invalid("Name, start and end locations are required."));
    }
    let route = StoreService::create_route(
        db.get_ref(),
        NewRoute {
            name: body.name.trim().to_string(),
            start_location: body.start_location.trim().to_string(),
            end_location: body.end_location.trim().to_string(),
        },
    )
    .await?;
    Ok(HttpResponse::Created().json(route))
}

/// GET /admin/boarding-history - Journal complet, plus récent d'abord
#[get("/boarding-history")]
pub async fn boarding_history(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth_user)?;
    let entries = StoreService::history_with_details(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(entries))
}

/// PUT /admin/buses/{id}/driver - Affecter ou retirer le chauffeur d'un bus
#[put("/buses/{bus_id}/driver")]
pub async fn assign_driver(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<AssignDriverRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let identity = require_admin(&auth_user)?;
    let bus = StoreService::assign_driver_to_bus(db.get_ref(), path.into_inner(), body.driver_id).await?;
    info!(user_id = identity.user_id, bus_id = bus.id, driver_id = ?bus.driver_id, "driver assignment changed");
    Ok(HttpResponse::Ok().json(bus))
}

/// PUT /admin/routes/{id}/bus - Affecter ou retirer le bus d'un trajet
#[put("/routes/{route_id}/bus")]
pub async fn assign_bus(
    auth_user: AuthUser,
    path: web::Path<i32>,
    body: web::Json<AssignBusRequest>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let identity = require_admin(&auth_user)?;
    let route = StoreService::assign_bus_to_route(db.get_ref(), path.into_inner(), body.bus_id).await?;
    info!(user_id = identity.user_id, route_id = route.id, bus_id = ?route.bus_id, "bus assignment changed");
    Ok(HttpResponse::Ok().json(route))
}

/// DELETE /admin/parents/{id} - Refusé tant que des élèves y sont rattachés
#[delete("/parents/{parent_id}")]
pub async fn delete_parent(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    require_admin(&auth_user)?;
    StoreService::delete_parent(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /admin/map/driver/{id} - Carte du trajet de n'importe quel chauffeur
#[get("/map/driver/{driver_id}")]
pub async fn driver_map(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let identity = require_admin(&auth_user)?;
    let tracking = TrackingService::driver(db.get_ref(), identity, path.into_inner()).await?;
    redirect_to_map(&tracking, &config)
}

pub fn admin_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(create_account)
            .service(create_student)
            .service(create_bus)
            .service(create_route)
            .service(boarding_history)
            .service(assign_driver)
            .service(assign_bus)
            .service(delete_parent)
            .service(driver_map)
    );
}
