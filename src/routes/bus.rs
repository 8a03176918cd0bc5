use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde_json::json;
use tracing::error;

use crate::error::AppError;
use crate::models::dto::LocationUpdateForm;
use crate::services::location_service::{LocationReport, LocationService};

/// POST /api/bus/location - Position envoyée par l'appareil du chauffeur (PUBLIC)
/// Champs formulaire: bus_id, lat, lng (+ reported_at optionnel)
pub async fn update_location(
    body: web::Bytes,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let form: LocationUpdateForm = serde_urlencoded::from_bytes(&body)
        .map_err(|_| AppError::invalid("Missing required parameters"))?;

    let report = LocationReport::from_form(form)?;

    match LocationService::update_location(db.get_ref(), report).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "status": "success" }))),
        Err(AppError::StorageUnavailable(e)) => {
            error!(error = %e, "failed to update bus location");
            Ok(HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Failed to update location"
            })))
        }
        Err(e) => Err(e),
    }
}

async fn method_not_allowed() -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(json!({
        "status": "error",
        "message": "Method not allowed"
    }))
}

pub fn bus_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/bus").service(
            web::resource("/location")
                .route(web::post().to(update_location))
                .default_service(web::to(method_not_allowed)),
        ),
    );
}
