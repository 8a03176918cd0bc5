use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::dashboard_service::DashboardService;

/// GET /driver/dashboard - Bus, trajet et élèves du chauffeur (PROTÉGÉE)
#[get("/dashboard")]
pub async fn dashboard(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let dashboard = DashboardService::driver_dashboard(db.get_ref(), auth_user.identity()).await?;
    Ok(HttpResponse::Ok().json(dashboard))
}

pub fn driver_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/driver")
            .service(dashboard)
    );
}
