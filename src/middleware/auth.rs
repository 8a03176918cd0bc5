use actix_web::{dev::Payload, web, Error, FromRequest, HttpRequest};
use futures::future::{ready, Ready};
use tracing::warn;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::services::access_policy::Identity;
use crate::utils::jwt;

/// Identité de l'appelant extraite du JWT
/// Utilisée comme extracteur dans les routes protégées
#[derive(Debug, Clone)]
pub struct AuthUser(pub Identity);

impl AuthUser {
    pub fn identity(&self) -> &Identity {
        &self.0
    }
}

/// Implémentation de FromRequest pour AuthUser
/// Cela permet à Actix-Web d'extraire automatiquement AuthUser des requêtes
impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req).map(AuthUser).map_err(Error::from))
    }
}

fn authenticate(req: &HttpRequest) -> Result<Identity, AppError> {
    let config = req
        .app_data::<web::Data<AppConfig>>()
        .ok_or_else(|| AppError::Internal("AppConfig missing from app data".to_string()))?;

    // 1. Extraire le header Authorization
    let auth_header = req
        .headers()
        .get("Authorization")
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    // 2. Convertir le header en string
    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid Authorization header".to_string()))?;

    // 3. Extraire le token (format: "Bearer <token>")
    let token = auth_str.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::Unauthorized("Invalid Authorization format (expected: Bearer <token>)".to_string())
    })?;

    // 4. Vérifier le token JWT
    let claims = jwt::verify_token(token, &config.jwt_secret).map_err(|e| {
        warn!(error = %e, "rejected bearer token");
        AppError::Unauthorized("Invalid token".to_string())
    })?;

    Ok(Identity {
        user_id: claims.sub,
        username: claims.username,
        role: claims.role,
    })
}
