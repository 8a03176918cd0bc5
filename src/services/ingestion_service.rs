use chrono::Utc;
use sea_orm::ConnectionTrait;
use tracing::info;

use crate::error::{AppError, EntityKind};
use crate::models::boarding_history::BoardingAction;
use crate::models::dto::{ScalarField, ScanPayload, ScanResponse};
use crate::services::store_service::StoreService;

/// Scan validé, prêt à être enregistré
#[derive(Debug, Clone, PartialEq)]
pub struct ScanCommand {
    pub rfid: String,
    pub bus_id: i32,
    pub gps_location: String,
    pub action: BoardingAction,
}

impl ScanCommand {
    /// Valide le corps brut. Aucune requête BD ici.
    pub fn from_payload(payload: ScanPayload) -> Result<Self, AppError> {
        let rfid = non_empty(payload.rfid.map(ScalarField::into_text)).ok_or_else(|| AppError::invalid("RFID is required."))?;

        let bus_id = match payload.bus_id {
            None => return Err(AppError::invalid("Bus ID is required.")),
            Some(ScalarField::Text(text)) if text.trim().is_empty() => {
                return Err(AppError::invalid("Bus ID is required."));
            }
            Some(ScalarField::Text(text)) => text.trim().parse::<i32>().ok(),
            Some(ScalarField::Number(n)) => i32::try_from(n).ok(),
        }
        .ok_or_else(|| AppError::invalid("Bus ID must be a valid number."))?;

        let action = match non_empty(payload.action) {
            None => BoardingAction::Board,
            Some(raw) => BoardingAction::parse(&raw)
                .ok_or_else(|| AppError::invalid("Action must be 'board' or 'alight'."))?,
        };

        Ok(Self {
            rfid,
            bus_id,
            gps_location: payload.gps_location.unwrap_or_default(),
            action,
        })
    }
}

pub struct IngestionService;

impl IngestionService {
    /// Enregistre un scan: élève puis bus résolus avant l'unique écriture.
    /// Pas de déduplication des scans répétés.
    pub async fn record_scan<C: ConnectionTrait>(db: &C, command: ScanCommand) -> Result<ScanResponse, AppError> {
        // 1. Élève par badge
        let student = StoreService::find_student_by_rfid(db, &command.rfid)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Student))?;

        // 2. Bus
        let bus = StoreService::find_bus(db, command.bus_id)
            .await?
            .ok_or(AppError::NotFound(EntityKind::Bus))?;

        // 3. Ajout au journal
        let record = StoreService::append_boarding(
            db,
            student.id,
            bus.id,
            command.action,
            &command.gps_location,
            Utc::now(),
        )
        .await?;

        info!(
            record_id = record.id,
            student_id = student.id,
            bus_id = bus.id,
            action = command.action.as_str(),
            "boarding event recorded"
        );

        // 4. Téléphone du parent pour la notification côté lecteur
        let parent_phone_number = StoreService::find_parent(db, student.parent_id)
            .await?
            .map(|p| p.phone_number)
            .unwrap_or_default();

        Ok(ScanResponse {
            student_name: student.name,
            parent_phone_number,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
