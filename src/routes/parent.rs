use actix_web::{get, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::error::AppError;
use crate::middleware::AuthUser;
use crate::services::dashboard_service::DashboardService;

/// GET /parent/children - Enfants du parent connecté (PROTÉGÉE)
#[get("/children")]
pub async fn children(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let overview = DashboardService::parent_children(db.get_ref(), auth_user.identity()).await?;
    Ok(HttpResponse::Ok().json(overview))
}

pub fn parent_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/parent")
            .service(children)
    );
}
