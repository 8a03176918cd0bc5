use std::fmt;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use sea_orm::DbErr;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Type d'entité introuvable (message distinct par entité pour les appelants)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    Bus,
    Route,
    Driver,
    Parent,
    User,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Student => "Student",
            EntityKind::Bus => "Bus",
            EntityKind::Route => "Route",
            EntityKind::Driver => "Driver",
            EntityKind::Parent => "Parent",
            EntityKind::User => "User",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Champ manquant ou invalide, rejeté avant tout accès à la BD
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0} not found.")]
    NotFound(EntityKind),

    #[error("Access denied")]
    Forbidden,

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Stale location report")]
    StaleReport,

    #[error("Tracking unavailable")]
    TrackingUnavailable,

    #[error("internal error: {0}")]
    Internal(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] DbErr),
}

impl AppError {
    pub fn invalid(message: impl Into<String>) -> Self {
        AppError::InvalidInput(message.into())
    }

    // Le détail BD ne sort jamais du serveur
    fn public_message(&self) -> String {
        match self {
            AppError::StorageUnavailable(_) | AppError::Internal(_) => {
                "An unexpected server error occurred.".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) | AppError::TrackingUnavailable => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Conflict(_) | AppError::StaleReport => StatusCode::CONFLICT,
            AppError::StorageUnavailable(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::StorageUnavailable(e) => error!(error = %e, "storage failure"),
            AppError::Internal(e) => error!(error = %e, "internal failure"),
            _ => {}
        }

        HttpResponse::build(self.status_code()).json(json!({
            "status": "error",
            "message": self.public_message()
        }))
    }
}
