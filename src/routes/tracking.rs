use actix_web::{get, http::header, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::tracking_service::{Tracking, TrackingService};

/// Redirection vers le service de cartes, ou 404 si rien à afficher
pub(crate) fn redirect_to_map(tracking: &Tracking, config: &AppConfig) -> Result<HttpResponse, AppError> {
    let endpoints = tracking.endpoints().ok_or(AppError::TrackingUnavailable)?;
    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, endpoints.map_url(&config.map_base_url)))
        .finish())
}

// ------------------------------------------------------------------ JSON

/// GET /api/tracking/student/{id} - Dernière position connue d'un enfant (PROTÉGÉE)
#[get("/student/{student_id}")]
pub async fn student_tracking(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let tracking = TrackingService::student(db.get_ref(), auth_user.identity(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tracking.to_response(&config.map_base_url)))
}

/// GET /api/tracking/route/{id} (PROTÉGÉE)
#[get("/route/{route_id}")]
pub async fn route_tracking(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let tracking = TrackingService::route(db.get_ref(), auth_user.identity(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(tracking.to_response(&config.map_base_url)))
}

/// GET /api/tracking/driver - Trajet du bus de l'appelant (PROTÉGÉE, chauffeur)
#[get("/driver")]
pub async fn driver_tracking(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let tracking = TrackingService::own_bus(db.get_ref(), auth_user.identity()).await?;
    Ok(HttpResponse::Ok().json(tracking.to_response(&config.map_base_url)))
}

// ------------------------------------------------------------ redirections

#[get("/student/{student_id}")]
pub async fn student_map(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let tracking = TrackingService::student(db.get_ref(), auth_user.identity(), path.into_inner()).await?;
    redirect_to_map(&tracking, &config)
}

#[get("/route/{route_id}")]
pub async fn route_map(
    auth_user: AuthUser,
    path: web::Path<i32>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let tracking = TrackingService::route(db.get_ref(), auth_user.identity(), path.into_inner()).await?;
    redirect_to_map(&tracking, &config)
}

#[get("/driver")]
pub async fn driver_map(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let tracking = TrackingService::own_bus(db.get_ref(), auth_user.identity()).await?;
    redirect_to_map(&tracking, &config)
}

pub fn tracking_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tracking")
            .service(student_tracking)
            .service(route_tracking)
            .service(driver_tracking)
    );
    cfg.service(
        web::scope("/map")
            .service(student_map)
            .service(route_map)
            .service(driver_map)
    );
}
