use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use tracing::{debug, warn};
use validator::Validate;

use crate::error::{AppError, EntityKind};
use crate::models::dto::LocationUpdateForm;
use crate::services::store_service::{LocationWrite, StoreService};

/// Position validée envoyée par l'appareil du chauffeur
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct LocationReport {
    pub bus_id: i32,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    /// Horodatage côté appareil; absent = dernier arrivé gagne
    pub reported_at: Option<DateTime<Utc>>,
}

impl LocationReport {
    pub fn from_form(form: LocationUpdateForm) -> Result<Self, AppError> {
        let (Some(bus_id), Some(lat), Some(lng)) = (present(form.bus_id), present(form.lat), present(form.lng)) else {
            return Err(AppError::invalid("Missing required parameters"));
        };

        let bus_id = bus_id
            .parse::<i32>()
            .map_err(|_| AppError::invalid("Bus ID must be a valid number."))?;
        let latitude = parse_coordinate(&lat)?;
        let longitude = parse_coordinate(&lng)?;

        let reported_at = match present(form.reported_at) {
            None => None,
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|_| AppError::invalid("reported_at must be an RFC 3339 timestamp"))?
                    .with_timezone(&Utc),
            ),
        };

        let report = Self { bus_id, latitude, longitude, reported_at };
        report
            .validate()
            .map_err(|_| AppError::invalid("Coordinates out of range"))?;
        Ok(report)
    }
}

pub struct LocationService;

impl LocationService {
    /// Écrase la position courante du bus (pas d'historique).
    /// Un rapport horodaté plus ancien que la position stockée est refusé.
    pub async fn update_location<C: ConnectionTrait>(db: &C, report: LocationReport) -> Result<(), AppError> {
        let reported_at = report.reported_at.unwrap_or_else(Utc::now);

        let outcome = StoreService::write_bus_location(
            db,
            report.bus_id,
            report.latitude,
            report.longitude,
            reported_at,
            report.reported_at.is_some(),
        )
        .await?;

        match outcome {
            LocationWrite::Applied => {
                debug!(bus_id = report.bus_id, lat = report.latitude, lng = report.longitude, "bus location updated");
                Ok(())
            }
            LocationWrite::Stale => {
                warn!(bus_id = report.bus_id, %reported_at, "stale location report ignored");
                Err(AppError::StaleReport)
            }
            LocationWrite::MissingBus => Err(AppError::NotFound(EntityKind::Bus)),
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_coordinate(raw: &str) -> Result<f64, AppError> {
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::invalid("Coordinates must be numbers"))
}
