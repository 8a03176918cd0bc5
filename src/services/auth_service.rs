use chrono::Utc;
use sea_orm::ConnectionTrait;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::users;
use crate::services::access_policy::{Identity, Role};
use crate::services::store_service::StoreService;
use crate::utils::{jwt, password};

pub struct LoginResult {
    pub identity: Identity,
    pub token: String,
}

pub struct AuthService;

impl AuthService {
    /// Admin si superuser, sinon profil parent, sinon profil chauffeur
    pub async fn resolve_role<C: ConnectionTrait>(db: &C, user: &users::Model) -> Result<Role, AppError> {
        if user.is_superuser {
            return Ok(Role::Admin);
        }
        if let Some(parent) = StoreService::find_parent_by_user(db, user.id).await? {
            return Ok(Role::Parent { parent_id: parent.id });
        }
        if let Some(driver) = StoreService::find_driver_by_user(db, user.id).await? {
            return Ok(Role::Driver { driver_id: driver.id });
        }
        Ok(Role::Unknown)
    }

    pub async fn login<C: ConnectionTrait>(
        db: &C,
        config: &AppConfig,
        username: &str,
        plain_password: &str,
    ) -> Result<LoginResult, AppError> {
        let invalid = || AppError::Unauthorized("Invalid username or password".to_string());

        if username.trim().is_empty() || plain_password.is_empty() {
            return Err(AppError::invalid("Please fill in all fields"));
        }

        let user = StoreService::find_user_by_username(db, username)
            .await?
            .ok_or_else(invalid)?;

        let is_valid = password::verify_password(plain_password, &user.password_hash).unwrap_or_else(|e| {
            warn!(user_id = user.id, error = %e, "unreadable password hash");
            false
        });
        if !is_valid {
            return Err(invalid());
        }

        StoreService::touch_last_login(db, user.id, Utc::now()).await?;

        let role = Self::resolve_role(db, &user).await?;
        let token = jwt::generate_token(user.id, &user.username, role, &config.jwt_secret, config.token_ttl_hours)
            .map_err(AppError::Internal)?;

        info!(user_id = user.id, role = role.name(), "user logged in");

        Ok(LoginResult {
            identity: Identity {
                user_id: user.id,
                username: user.username,
                role,
            },
            token,
        })
    }
}
