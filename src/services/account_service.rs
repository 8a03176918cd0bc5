// ============================================================================
// COMPTES
// ============================================================================
//
// Création des comptes (admin, parent, chauffeur) par un administrateur, et
// amorçage du superuser au démarrage (ADMIN_USERNAME / ADMIN_PASSWORD).
// Le compte et son profil sont écrits dans la même transaction.
//
// ============================================================================

use sea_orm::{DatabaseConnection, TransactionTrait};
use tracing::info;

use crate::config::{AdminSeed, AppConfig};
use crate::error::AppError;
use crate::models::dto::{AccountProfile, CreateAccountRequest};
use crate::models::users;
use crate::services::access_policy::Role;
use crate::services::store_service::{NewUser, StoreService};
use crate::utils::password;

pub struct AccountService;

impl AccountService {
    pub async fn create_account(
        db: &DatabaseConnection,
        config: &AppConfig,
        request: CreateAccountRequest,
    ) -> Result<(users::Model, Role), AppError> {
        let username = request.username.trim().to_string();
        let email = request.email.trim().to_string();

        if username.is_empty() || request.password.is_empty() {
            return Err(AppError::invalid("Username and password are required."));
        }
        if !email.contains('@') {
            return Err(AppError::invalid("A valid email address is required."));
        }

        // 1. Unicité du nom et de l'email
        if StoreService::find_user_by_username(db, &username).await?.is_some() {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }
        if StoreService::find_user_by_email(db, &email).await?.is_some() {
            return Err(AppError::Conflict("Email already exists".to_string()));
        }

        // 2. Hash du mot de passe (hors transaction, c'est le plus lent)
        let password_hash = password::hash_password_with_iterations(&request.password, config.password_iterations)
            .map_err(AppError::Internal)?;

        // 3. Compte + profil
        let txn = db.begin().await?;

        let user = StoreService::create_user(
            &txn,
            NewUser {
                username,
                email,
                password_hash,
                first_name: request.first_name.trim().to_string(),
                last_name: request.last_name.trim().to_string(),
                is_superuser: matches!(request.profile, AccountProfile::Admin),
            },
        )
        .await?;

        let role = match request.profile {
            AccountProfile::Admin => Role::Admin,
            AccountProfile::Parent { phone_number } => {
                let parent = StoreService::create_parent(&txn, user.id, phone_number.trim()).await?;
                Role::Parent { parent_id: parent.id }
            }
            AccountProfile::Driver { phone_number } => {
                let driver = StoreService::create_driver(&txn, user.id, phone_number.trim()).await?;
                Role::Driver { driver_id: driver.id }
            }
        };

        txn.commit().await?;

        info!(user_id = user.id, role = role.name(), "account created");
        Ok((user, role))
    }

    /// Crée le superuser s'il n'existe pas. Renvoie true si un compte a été créé.
    pub async fn ensure_admin(db: &DatabaseConnection, config: &AppConfig, seed: &AdminSeed) -> Result<bool, AppError> {
        if let Some(existing) = StoreService::find_user_by_username(db, &seed.username).await? {
            info!(user_id = existing.id, "admin account already present");
            return Ok(false);
        }

        let request = CreateAccountRequest {
            username: seed.username.clone(),
            email: seed.email.clone(),
            password: seed.password.clone(),
            first_name: String::new(),
            last_name: String::new(),
            profile: AccountProfile::Admin,
        };
        Self::create_account(db, config, request).await?;
        Ok(true)
    }
}
