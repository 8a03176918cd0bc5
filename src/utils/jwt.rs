use jsonwebtoken::{encode, decode, Header, Validation, EncodingKey, DecodingKey, Algorithm};
use serde::{Deserialize, Serialize};
use chrono::{Utc, Duration};

use crate::services::access_policy::Role;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,        // user_id
    pub username: String,
    pub role: Role,      // rôle + id du profil (parent/chauffeur)
    pub exp: i64,        // expiration timestamp
}

/// Génère un JWT token pour un utilisateur
pub fn generate_token(
    user_id: i32,
    username: &str,
    role: Role,
    secret: &str,
    ttl_hours: i64,
) -> Result<String, String> {
    let expiration = Utc::now()
        .checked_add_signed(Duration::hours(ttl_hours))
        .ok_or("Failed to calculate expiration")?
        .timestamp();

    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        role,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
        .map_err(|e| format!("Failed to generate token: {}", e))
}

/// Vérifie et décode un JWT token
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
        .map(|data| data.claims)
        .map_err(|e| format!("Invalid token: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn test_generate_and_verify_token() {
        let token = generate_token(123, "parent1", Role::Parent { parent_id: 7 }, SECRET, 1).unwrap();
        let claims = verify_token(&token, SECRET).unwrap();

        assert_eq!(claims.sub, 123);
        assert_eq!(claims.username, "parent1");
        assert_eq!(claims.role, Role::Parent { parent_id: 7 });
    }

    #[test]
    fn test_invalid_token() {
        let result = verify_token("invalid.token.here", SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let token = generate_token(1, "admin", Role::Admin, SECRET, 1).unwrap();
        assert!(verify_token(&token, "another-secret").is_err());
    }

    #[test]
    fn test_expired_token() {
        // Au-delà de la marge par défaut (60s) de jsonwebtoken
        let token = generate_token(1, "driver1", Role::Driver { driver_id: 2 }, SECRET, -2).unwrap();
        assert!(verify_token(&token, SECRET).is_err());
    }
}
