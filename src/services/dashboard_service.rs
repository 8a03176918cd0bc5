use sea_orm::ConnectionTrait;
use tracing::warn;

use crate::error::AppError;
use crate::models::dto::{BusPosition, ChildOverview, DriverDashboard, RouteInfo, StudentSummary};
use crate::models::{bus, route};
use crate::services::access_policy::Identity;
use crate::services::store_service::StoreService;

pub struct DashboardService;

impl DashboardService {
    /// Enfants du parent connecté, avec leur trajet et la position du bus
    pub async fn parent_children<C: ConnectionTrait>(db: &C, identity: &Identity) -> Result<Vec<ChildOverview>, AppError> {
        let parent_id = identity.parent_id().ok_or(AppError::Forbidden)?;
        let children = StoreService::students_of_parent(db, parent_id).await?;

        let mut overview = Vec::with_capacity(children.len());
        for child in children {
            let route = match child.route_id {
                Some(route_id) => StoreService::find_route(db, route_id).await?,
                None => None,
            };
            let bus = match route.as_ref().and_then(|r| r.bus_id) {
                Some(bus_id) => StoreService::find_bus(db, bus_id).await?,
                None => None,
            };

            overview.push(ChildOverview {
                student_id: child.id,
                name: child.name,
                route: route.map(route_info),
                bus: bus.map(bus_position),
            });
        }

        Ok(overview)
    }

    /// Bus du chauffeur connecté, son trajet et les élèves inscrits
    pub async fn driver_dashboard<C: ConnectionTrait>(db: &C, identity: &Identity) -> Result<DriverDashboard, AppError> {
        let driver_id = identity.driver_id().ok_or(AppError::Forbidden)?;

        let Some(bus) = StoreService::find_bus_by_driver(db, driver_id).await? else {
            warn!(driver_id, "no bus assigned to driver");
            return Ok(DriverDashboard { bus: None, route: None, students: Vec::new() });
        };

        let route = StoreService::find_route_by_bus(db, bus.id).await?;
        let students = match route.as_ref() {
            Some(r) => StoreService::students_on_route(db, r.id).await?,
            None => {
                warn!(bus_id = bus.id, driver_id, "no route assigned to bus");
                Vec::new()
            }
        };

        Ok(DriverDashboard {
            bus: Some(bus_position(bus)),
            route: route.map(route_info),
            students: students
                .into_iter()
                .map(|s| StudentSummary { id: s.id, name: s.name, rfid: s.rfid })
                .collect(),
        })
    }
}

fn route_info(route: route::Model) -> RouteInfo {
    RouteInfo {
        id: route.id,
        name: route.name,
        start_location: route.start_location,
        end_location: route.end_location,
    }
}

fn bus_position(bus: bus::Model) -> BusPosition {
    BusPosition {
        id: bus.id,
        number_plate: bus.number_plate,
        latitude: bus.current_latitude,
        longitude: bus.current_longitude,
        reported_at: bus.location_reported_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[actix_web::test]
    async fn test_parent_sees_only_own_children() {
        let (db, fx) = test_support::seeded_db().await;
        test_support::family(&db, "p2", "5550000", "Zoe", "TAG99").await;

        let children = DashboardService::parent_children(&db, &fx.parent_identity()).await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].name, "Amy");
        assert_eq!(children[0].route.as_ref().unwrap().end_location, "Central School");
        assert_eq!(children[0].bus.as_ref().unwrap().number_plate, "SCH-007");
    }

    #[actix_web::test]
    async fn test_driver_dashboard() {
        let (db, fx) = test_support::seeded_db().await;

        let dashboard = DashboardService::driver_dashboard(&db, &fx.driver_identity()).await.unwrap();
        assert_eq!(dashboard.bus.unwrap().id, fx.bus.id);
        assert_eq!(dashboard.route.unwrap().id, fx.route.id);
        assert_eq!(dashboard.students.len(), 1);
        assert_eq!(dashboard.students[0].rfid, "TAG42");
    }

    #[actix_web::test]
    async fn test_wrong_role_forbidden() {
        let (db, fx) = test_support::seeded_db().await;
        assert!(matches!(
            DashboardService::driver_dashboard(&db, &fx.parent_identity()).await,
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            DashboardService::parent_children(&db, &fx.admin_identity()).await,
            Err(AppError::Forbidden)
        ));
    }
}
