//! Role-scoped visibility: which incidents a user may see at all.
//!
//! Runs before any user-chosen filter. Callers handle the signed-out case
//! themselves (see [`crate::dashboard`]); there is no scope for "no user".

use serde::Serialize;

use crate::model::{Incident, OrganizationId, Role, StationId, User};

/// The slice of the incident set a role is entitled to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "scope", content = "id", rename_all = "snake_case")]
pub enum VisibilityScope {
    Station(StationId),
    Organization(OrganizationId),
    Global,
    /// A scoped role whose account carries no station/organization.
    Nothing,
}

impl VisibilityScope {
    pub fn for_user(user: &User) -> Self {
        match user.role {
            Role::StationStaff | Role::StationAdmin => match &user.station_id {
                Some(id) => VisibilityScope::Station(id.clone()),
                None => VisibilityScope::Nothing,
            },
            Role::SuperAdmin => match &user.organization_id {
                Some(id) => VisibilityScope::Organization(id.clone()),
                None => VisibilityScope::Nothing,
            },
            Role::Citizen | Role::MainAdmin => VisibilityScope::Global,
        }
    }

    pub fn contains(&self, incident: &Incident) -> bool {
        match self {
            VisibilityScope::Station(id) => incident.station_id.as_ref() == Some(id),
            VisibilityScope::Organization(id) => incident.organization_id.as_ref() == Some(id),
            VisibilityScope::Global => true,
            VisibilityScope::Nothing => false,
        }
    }
}

/// Incidents visible to `user`, in their original order.
pub fn scope_incidents<'a>(incidents: &'a [Incident], user: &User) -> Vec<&'a Incident> {
    let scope = VisibilityScope::for_user(user);
    incidents.iter().filter(|i| scope.contains(i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{incident, user};

    fn fleet() -> Vec<Incident> {
        vec![
            incident("1", "s1", "o1"),
            incident("2", "s2", "o1"),
            incident("3", "s3", "o2"),
            incident("4", "s1", "o1"),
        ]
    }

    fn ids(list: &[&Incident]) -> Vec<String> {
        list.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn station_roles_see_their_station() {
        let list = fleet();
        for role in [Role::StationStaff, Role::StationAdmin] {
            let u = user("u", role, Some("s1"), Some("o1"));
            assert_eq!(ids(&scope_incidents(&list, &u)), ["1", "4"]);
        }
    }

    #[test]
    fn super_admin_sees_their_organization() {
        let list = fleet();
        let u = user("u", Role::SuperAdmin, None, Some("o1"));
        assert_eq!(ids(&scope_incidents(&list, &u)), ["1", "2", "4"]);
    }

    #[test]
    fn other_roles_are_unrestricted() {
        let list = fleet();
        for role in [Role::Citizen, Role::MainAdmin] {
            let u = user("u", role, None, None);
            assert_eq!(scope_incidents(&list, &u).len(), list.len());
        }
    }

    #[test]
    fn station_role_without_station_sees_nothing() {
        let list = fleet();
        let u = user("u", Role::StationStaff, None, Some("o1"));
        assert!(scope_incidents(&list, &u).is_empty());
    }

    #[test]
    fn scoped_result_is_subset_satisfying_predicate() {
        let list = fleet();
        let users = [
            user("a", Role::StationStaff, Some("s2"), Some("o1")),
            user("b", Role::SuperAdmin, None, Some("o2")),
            user("c", Role::Citizen, None, None),
        ];
        for u in &users {
            let scope = VisibilityScope::for_user(u);
            for item in scope_incidents(&list, u) {
                assert!(list.iter().any(|i| i == item));
                assert!(scope.contains(item));
            }
        }
    }
}
