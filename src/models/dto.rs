// pour les requêtes et réponses structurées
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::boarding_history::BoardingAction;

/// Valeur scalaire d'un scan: nombre (JSON) ou texte (JSON ou formulaire)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScalarField {
    Number(i64),
    Text(String),
}

impl ScalarField {
    pub fn into_text(self) -> String {
        match self {
            ScalarField::Number(n) => n.to_string(),
            ScalarField::Text(text) => text,
        }
    }
}

/// Corps brut d'un scan RFID, JSON ou formulaire
#[derive(Debug, Default, Deserialize)]
pub struct ScanPayload {
    pub rfid: Option<ScalarField>,
    pub bus_id: Option<ScalarField>,
    pub gps_location: Option<String>,
    pub action: Option<String>,
}

// Réponse minimale attendue par les lecteurs embarqués
#[derive(Debug, Serialize, PartialEq)]
pub struct ScanResponse {
    pub student_name: String,
    pub parent_phone_number: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LocationUpdateForm {
    pub bus_id: Option<String>,
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub reported_at: Option<String>, // RFC 3339, optionnel
}

#[derive(Debug, Serialize)]
pub struct TrackingResponse {
    pub available: bool,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub map_url: Option<String>,
    pub on_board: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub id: i32,
    pub name: String,
    pub start_location: String,
    pub end_location: String,
}

#[derive(Debug, Serialize)]
pub struct BusPosition {
    pub id: i32,
    pub number_plate: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub reported_at: Option<DateTime<Utc>>,
}

// 1 enfant avec son trajet et son bus (tableau de bord parent)
#[derive(Debug, Serialize)]
pub struct ChildOverview {
    pub student_id: i32,
    pub name: String,
    pub route: Option<RouteInfo>,
    pub bus: Option<BusPosition>,
}

#[derive(Debug, Serialize)]
pub struct StudentSummary {
    pub id: i32,
    pub name: String,
    pub rfid: String,
}

#[derive(Debug, Serialize)]
pub struct DriverDashboard {
    pub bus: Option<BusPosition>,
    pub route: Option<RouteInfo>,
    pub students: Vec<StudentSummary>,
}

#[derive(Debug, Serialize)]
pub struct BoardingHistoryEntry {
    pub id: i32,
    pub student_name: String,
    pub bus_number_plate: String,
    pub action: BoardingAction,
    pub gps_location: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct AssignDriverRequest {
    pub driver_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct AssignBusRequest {
    pub bus_id: Option<i32>,
}

/// Profil rattaché au compte créé
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AccountProfile {
    Admin,
    Parent { phone_number: String },
    Driver { phone_number: String },
}

#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub profile: AccountProfile,
}

#[derive(Debug, Deserialize)]
pub struct CreateStudentRequest {
    pub name: String,
    pub rfid: String,
    pub parent_id: i32,
    pub route_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct CreateBusRequest {
    pub number_plate: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateRouteRequest {
    pub name: String,
    pub start_location: String,
    pub end_location: String,
}
