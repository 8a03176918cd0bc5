use actix_web::{get, post, web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::{AppError, EntityKind};
use crate::middleware::AuthUser;
use crate::services::access_policy::Role;
use crate::services::auth_service::AuthService;
use crate::services::store_service::StoreService;

// DTO pour la connexion
#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// Réponse après login
#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

// Réponse pour /auth/me
#[derive(Serialize)]
pub struct MeResponse {
    pub user_id: i32,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
}

/// POST /auth/login - Se connecter (PUBLIC)
#[post("/login")]
pub async fn login(
    body: web::Json<LoginRequest>,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
) -> Result<HttpResponse, AppError> {
    let result = AuthService::login(db.get_ref(), &config, &body.username, &body.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        token: result.token,
        user_id: result.identity.user_id,
        username: result.identity.username,
        role: result.identity.role,
    }))
}

/// GET /auth/me - Identité de l'appelant (PROTÉGÉE)
#[get("/me")]
pub async fn me(
    auth_user: AuthUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, AppError> {
    let identity = auth_user.identity();
    let user = StoreService::find_user(db.get_ref(), identity.user_id)
        .await?
        .ok_or(AppError::NotFound(EntityKind::User))?;

    Ok(HttpResponse::Ok().json(MeResponse {
        user_id: user.id,
        full_name: user.full_name(),
        username: user.username,
        email: user.email,
        role: identity.role,
    }))
}

pub fn auth_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .service(login)
            .service(me)
    );
}
