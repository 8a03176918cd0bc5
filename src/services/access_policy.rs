// ============================================================================
// ACCESS POLICY
// ============================================================================
//
// Décide si une identité authentifiée peut voir un élève, un bus ou un trajet.
// Logique pure: aucune requête BD ici, les entités sont passées par l'appelant.
//
//   - Parent  -> Élève : autorisé ssi student.parent_id == parent_id
//   - Chauffeur -> Bus : autorisé ssi bus.driver_id == driver_id
//   - Admin           : toujours autorisé
//
// Un élève inexistant donne DENY pour un parent/chauffeur (pas de fuite
// d'existence entre familles).
//
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::{bus, route, student};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Role {
    Admin,
    Parent { parent_id: i32 },
    Driver { driver_id: i32 },
    Unknown,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Parent { .. } => "parent",
            Role::Driver { .. } => "driver",
            Role::Unknown => "unknown",
        }
    }
}

/// Identité explicite passée à chaque appel (pas d'état de session global)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn parent_id(&self) -> Option<i32> {
        match self.role {
            Role::Parent { parent_id } => Some(parent_id),
            _ => None,
        }
    }

    pub fn driver_id(&self) -> Option<i32> {
        match self.role {
            Role::Driver { driver_id } => Some(driver_id),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

pub struct AccessPolicy;

impl AccessPolicy {
    pub fn student(identity: &Identity, target: Option<&student::Model>) -> Decision {
        match identity.role {
            Role::Admin => Decision::Allow,
            Role::Parent { parent_id } => {
                Decision::from_bool(target.is_some_and(|s| s.parent_id == parent_id))
            }
            Role::Driver { .. } | Role::Unknown => Decision::Deny,
        }
    }

    pub fn bus(identity: &Identity, target: Option<&bus::Model>) -> Decision {
        match identity.role {
            Role::Admin => Decision::Allow,
            Role::Driver { driver_id } => {
                Decision::from_bool(target.is_some_and(|b| b.driver_id == Some(driver_id)))
            }
            Role::Parent { .. } | Role::Unknown => Decision::Deny,
        }
    }

    /// Trajet: le chauffeur du bus affecté, ou un parent dont un enfant y est inscrit.
    /// `route_bus` est le bus référencé par route.bus_id, `children` les enfants du parent.
    pub fn route(
        identity: &Identity,
        target: Option<&route::Model>,
        route_bus: Option<&bus::Model>,
        children: &[student::Model],
    ) -> Decision {
        let Some(target) = target else {
            return Decision::from_bool(identity.is_admin());
        };

        match identity.role {
            Role::Admin => Decision::Allow,
            Role::Driver { .. } => {
                let bus_matches = route_bus.is_some_and(|b| Some(b.id) == target.bus_id);
                Decision::from_bool(bus_matches && Self::bus(identity, route_bus).is_allowed())
            }
            Role::Parent { .. } => Decision::from_bool(children.iter().any(|child| {
                child.route_id == Some(target.id) && Self::student(identity, Some(child)).is_allowed()
            })),
            Role::Unknown => Decision::Deny,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity { user_id: 1, username: "u".to_string(), role }
    }

    fn student(id: i32, parent_id: i32, route_id: Option<i32>) -> student::Model {
        student::Model {
            id,
            name: format!("student{}", id),
            rfid: format!("TAG{}", id),
            parent_id,
            route_id,
        }
    }

    fn bus(id: i32, driver_id: Option<i32>) -> bus::Model {
        bus::Model {
            id,
            number_plate: format!("BUS-{}", id),
            driver_id,
            current_latitude: None,
            current_longitude: None,
            location_reported_at: None,
        }
    }

    fn route(id: i32, bus_id: Option<i32>) -> route::Model {
        route::Model {
            id,
            name: "North".to_string(),
            start_location: "Depot".to_string(),
            end_location: "School".to_string(),
            bus_id,
        }
    }

    #[test]
    fn test_parent_student_matrix() {
        let students: Vec<_> = (1..=3).map(|id| student(id, id, None)).collect();
        for parent_id in 1..=3 {
            let who = identity(Role::Parent { parent_id });
            for s in &students {
                let expected = s.parent_id == parent_id;
                assert_eq!(AccessPolicy::student(&who, Some(s)).is_allowed(), expected);
            }
        }
    }

    #[test]
    fn test_parent_missing_student_denied() {
        let who = identity(Role::Parent { parent_id: 2 });
        assert_eq!(AccessPolicy::student(&who, None), Decision::Deny);
    }

    #[test]
    fn test_missing_and_foreign_student_same_outcome() {
        let who = identity(Role::Parent { parent_id: 2 });
        let foreign = student(1, 1, None);
        assert_eq!(
            AccessPolicy::student(&who, Some(&foreign)),
            AccessPolicy::student(&who, None)
        );
    }

    #[test]
    fn test_driver_bus_matrix() {
        let buses = vec![bus(1, Some(1)), bus(2, Some(2)), bus(3, None)];
        for driver_id in 1..=3 {
            let who = identity(Role::Driver { driver_id });
            for b in &buses {
                let expected = b.driver_id == Some(driver_id);
                assert_eq!(AccessPolicy::bus(&who, Some(b)).is_allowed(), expected);
            }
        }
    }

    #[test]
    fn test_admin_allows_everything() {
        let who = identity(Role::Admin);
        assert!(AccessPolicy::student(&who, Some(&student(1, 9, None))).is_allowed());
        assert!(AccessPolicy::student(&who, None).is_allowed());
        assert!(AccessPolicy::bus(&who, Some(&bus(1, None))).is_allowed());
        assert!(AccessPolicy::route(&who, Some(&route(1, None)), None, &[]).is_allowed());
    }

    #[test]
    fn test_cross_role_denied() {
        let driver = identity(Role::Driver { driver_id: 1 });
        assert!(!AccessPolicy::student(&driver, Some(&student(1, 1, None))).is_allowed());

        let parent = identity(Role::Parent { parent_id: 1 });
        assert!(!AccessPolicy::bus(&parent, Some(&bus(1, Some(1)))).is_allowed());

        let unknown = identity(Role::Unknown);
        assert!(!AccessPolicy::student(&unknown, Some(&student(1, 1, None))).is_allowed());
        assert!(!AccessPolicy::bus(&unknown, Some(&bus(1, Some(1)))).is_allowed());
    }

    #[test]
    fn test_route_access() {
        let r = route(5, Some(10));
        let own_bus = bus(10, Some(3));

        let driver = identity(Role::Driver { driver_id: 3 });
        assert!(AccessPolicy::route(&driver, Some(&r), Some(&own_bus), &[]).is_allowed());

        let other_driver = identity(Role::Driver { driver_id: 4 });
        assert!(!AccessPolicy::route(&other_driver, Some(&r), Some(&own_bus), &[]).is_allowed());

        let parent = identity(Role::Parent { parent_id: 8 });
        let on_route = [student(1, 8, Some(5))];
        let elsewhere = [student(2, 8, Some(6))];
        assert!(AccessPolicy::route(&parent, Some(&r), None, &on_route).is_allowed());
        assert!(!AccessPolicy::route(&parent, Some(&r), None, &elsewhere).is_allowed());
        assert!(!AccessPolicy::route(&parent, None, None, &on_route).is_allowed());
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_value(Role::Driver { driver_id: 4 }).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "driver", "driver_id": 4}));
    }
}
