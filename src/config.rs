// configuration lue depuis l'environnement (.env chargé par main)

use std::env;

use thiserror::Error;
use tracing::warn;

use crate::utils::password;

const DEFAULT_JWT_SECRET: &str = "default-insecure-key-change-this";
const DEFAULT_MAP_BASE_URL: &str = "https://schoolroute.silicon4forge.org";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in .env file")]
    Missing(&'static str),
    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Compte superuser créé au démarrage s'il n'existe pas encore
#[derive(Debug, Clone, PartialEq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub map_base_url: String,
    pub init_schema: bool,
    pub password_iterations: u32,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Construit la config à partir d'une fonction de lecture (testable sans toucher à l'env)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or("PORT", lookup("PORT"), 8080u16)?;
        let token_ttl_hours = parse_or("TOKEN_TTL_HOURS", lookup("TOKEN_TTL_HOURS"), 24i64)?;
        let init_schema = parse_or("INIT_SCHEMA", lookup("INIT_SCHEMA"), true)?;

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not found in .env, using default (INSECURE)");
            DEFAULT_JWT_SECRET.to_string()
        });

        let map_base_url = lookup("MAP_BASE_URL")
            .unwrap_or_else(|| DEFAULT_MAP_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let password_iterations = parse_or("PASSWORD_ITERATIONS", lookup("PASSWORD_ITERATIONS"), password::ITERATIONS)?;

        // ADMIN_USERNAME active l'amorçage; le mot de passe devient alors obligatoire
        let admin_seed = match lookup("ADMIN_USERNAME").filter(|v| !v.trim().is_empty()) {
            None => None,
            Some(username) => {
                let password = lookup("ADMIN_PASSWORD")
                    .filter(|v| !v.is_empty())
                    .ok_or(ConfigError::Missing("ADMIN_PASSWORD"))?;
                let email = lookup("ADMIN_EMAIL").unwrap_or_else(|| format!("{}@localhost", username.trim()));
                Some(AdminSeed {
                    username: username.trim().to_string(),
                    email,
                    password,
                })
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            jwt_secret,
            token_ttl_hours,
            map_base_url,
            init_schema,
            password_iterations,
            admin_seed,
        })
    }
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")])).unwrap();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.token_ttl_hours, 24);
        assert_eq!(cfg.map_base_url, DEFAULT_MAP_BASE_URL);
        assert!(cfg.init_schema);
        assert_eq!(cfg.password_iterations, password::ITERATIONS);
        assert_eq!(cfg.admin_seed, None);
    }

    #[test]
    fn test_admin_seed() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();
        let seed = cfg.admin_seed.unwrap();
        assert_eq!(seed.username, "root");
        assert_eq!(seed.email, "root@localhost");
        assert_eq!(seed.password, "hunter22");
    }

    #[test]
    fn test_admin_seed_requires_password() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("ADMIN_USERNAME", "root"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("ADMIN_PASSWORD"))));
    }

    #[test]
    fn test_missing_database_url() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("DATABASE_URL"))));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("PORT", "eighty"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { name: "PORT", .. })));
    }

    #[test]
    fn test_map_base_url_trailing_slash() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://x"),
            ("MAP_BASE_URL", "https://maps.example.org/"),
        ]))
        .unwrap();
        assert_eq!(cfg.map_base_url, "https://maps.example.org");
    }
}
