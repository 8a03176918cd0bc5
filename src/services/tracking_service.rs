// ============================================================================
// TRACKING QUERY
// ============================================================================
//
// "Où est mon enfant / mon bus ?" -> paire origine/destination à passer au
// service de cartes externe. Toujours autorisé via AccessPolicy AVANT la
// lecture des données dérivées.
//
//   - Élève   : origine = GPS de la dernière montée, destination = fin du trajet
//   - Trajet  : origine = départ du trajet, destination = fin du trajet
//   - Chauffeur : trajet trouvé par recherche inverse route.bus_id == bus.id
//
// "Tracking indisponible" n'est pas une erreur métier: élève jamais monté,
// pas de trajet, bus sans trajet...
//
// ============================================================================

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use sea_orm::ConnectionTrait;
use tracing::warn;

use crate::error::{AppError, EntityKind};
use crate::models::boarding_history::BoardingAction;
use crate::models::dto::TrackingResponse;
use crate::models::{route, student};
use crate::services::access_policy::{AccessPolicy, Identity};
use crate::services::store_service::StoreService;

#[derive(Debug, Clone, PartialEq)]
pub struct MapEndpoints {
    pub origin: String,
    pub destination: String,
}

impl MapEndpoints {
    /// URL du service de cartes: <base>/?origin=..&destination=..
    pub fn map_url(&self, base_url: &str) -> String {
        format!(
            "{}/?origin={}&destination={}",
            base_url.trim_end_matches('/'),
            utf8_percent_encode(&self.origin, NON_ALPHANUMERIC),
            utf8_percent_encode(&self.destination, NON_ALPHANUMERIC)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tracking {
    Available {
        endpoints: MapEndpoints,
        /// Élèves seulement: dernier événement = montée
        on_board: Option<bool>,
    },
    Unavailable,
}

impl Tracking {
    pub fn endpoints(&self) -> Option<&MapEndpoints> {
        match self {
            Tracking::Available { endpoints, .. } => Some(endpoints),
            Tracking::Unavailable => None,
        }
    }

    pub fn to_response(&self, base_url: &str) -> TrackingResponse {
        match self {
            Tracking::Available { endpoints, on_board } => TrackingResponse {
                available: true,
                origin: Some(endpoints.origin.clone()),
                destination: Some(endpoints.destination.clone()),
                map_url: Some(endpoints.map_url(base_url)),
                on_board: *on_board,
            },
            Tracking::Unavailable => TrackingResponse {
                available: false,
                origin: None,
                destination: None,
                map_url: None,
                on_board: None,
            },
        }
    }
}

pub struct TrackingService;

impl TrackingService {
    pub async fn student<C: ConnectionTrait>(db: &C, identity: &Identity, student_id: i32) -> Result<Tracking, AppError> {
        let student = StoreService::find_student(db, student_id).await?;

        // Même réponse pour "inexistant" et "pas à vous"
        if !AccessPolicy::student(identity, student.as_ref()).is_allowed() {
            warn!(user_id = identity.user_id, student_id, "student tracking denied");
            return Err(AppError::Forbidden);
        }
        let student = student.ok_or(AppError::NotFound(EntityKind::Student))?;

        Self::derive_student(db, &student).await
    }

    async fn derive_student<C: ConnectionTrait>(db: &C, student: &student::Model) -> Result<Tracking, AppError> {
        let Some(route_id) = student.route_id else {
            return Ok(Tracking::Unavailable);
        };
        let Some(boarding) = StoreService::latest_boarding(db, student.id).await? else {
            return Ok(Tracking::Unavailable);
        };
        let Some(route) = StoreService::find_route(db, route_id).await? else {
            return Ok(Tracking::Unavailable);
        };

        let on_board = StoreService::latest_event(db, student.id)
            .await?
            .map(|event| event.action == BoardingAction::Board);

        Ok(Tracking::Available {
            endpoints: MapEndpoints {
                origin: boarding.gps_location,
                destination: route.end_location,
            },
            on_board,
        })
    }

    pub async fn route<C: ConnectionTrait>(db: &C, identity: &Identity, route_id: i32) -> Result<Tracking, AppError> {
        let route = StoreService::find_route(db, route_id).await?;

        let route_bus = match route.as_ref().and_then(|r| r.bus_id) {
            Some(bus_id) => StoreService::find_bus(db, bus_id).await?,
            None => None,
        };
        let children = match identity.parent_id() {
            Some(parent_id) => StoreService::students_of_parent(db, parent_id).await?,
            None => Vec::new(),
        };

        if !AccessPolicy::route(identity, route.as_ref(), route_bus.as_ref(), &children).is_allowed() {
            warn!(user_id = identity.user_id, route_id, "route tracking denied");
            return Err(AppError::Forbidden);
        }
        let route = route.ok_or(AppError::NotFound(EntityKind::Route))?;

        Ok(route_endpoints(route))
    }

    /// Trajet du bus conduit par l'appelant (chauffeur)
    pub async fn own_bus<C: ConnectionTrait>(db: &C, identity: &Identity) -> Result<Tracking, AppError> {
        let driver_id = identity.driver_id().ok_or(AppError::Forbidden)?;
        Self::driver(db, identity, driver_id).await
    }

    /// Trajet du bus d'un chauffeur donné (admin, ou le chauffeur lui-même)
    pub async fn driver<C: ConnectionTrait>(db: &C, identity: &Identity, driver_id: i32) -> Result<Tracking, AppError> {
        if !identity.is_admin() && identity.driver_id() != Some(driver_id) {
            warn!(user_id = identity.user_id, driver_id, "driver tracking denied");
            return Err(AppError::Forbidden);
        }
        if StoreService::find_driver(db, driver_id).await?.is_none() {
            return Err(AppError::NotFound(EntityKind::Driver));
        }

        let Some(bus) = StoreService::find_bus_by_driver(db, driver_id).await? else {
            return Ok(Tracking::Unavailable);
        };
        if !AccessPolicy::bus(identity, Some(&bus)).is_allowed() {
            return Err(AppError::Forbidden);
        }

        match StoreService::find_route_by_bus(db, bus.id).await? {
            Some(route) => Ok(route_endpoints(route)),
            None => Ok(Tracking::Unavailable),
        }
    }
}

fn route_endpoints(route: route::Model) -> Tracking {
    Tracking::Available {
        endpoints: MapEndpoints {
            origin: route.start_location,
            destination: route.end_location,
        },
        on_board: None,
    }
}
