pub mod access_policy;
pub mod account_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod ingestion_service;
pub mod location_service;
pub mod store_service;
pub mod tracking_service;
