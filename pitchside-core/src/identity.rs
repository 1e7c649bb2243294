use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    TurfAdmin,
    SuperAdmin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::TurfAdmin | Self::SuperAdmin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::User => "user",
            Self::TurfAdmin => "turf_admin",
            Self::SuperAdmin => "super_admin",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "turf_admin" => Ok(Self::TurfAdmin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// The caller of an operation, as established upstream. An empty id means
/// the caller is anonymous.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Privileged operations. Every capability decision in the engine goes
/// through [`permits`]; handlers never re-derive role logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ViewReservation,
    ViewRivalHolder,
    ReleaseReservation,
    ForceCleanup,
}

/// Single capability check. `owner_id` is the holder the operation would
/// expose or affect, when there is one.
pub fn permits(actor: &Actor, operation: Operation, owner_id: Option<&str>) -> bool {
    match operation {
        Operation::ViewReservation | Operation::ViewRivalHolder => {
            actor.role.is_admin() || owner_id.is_some_and(|owner| !actor.id.is_empty() && owner == actor.id)
        }
        Operation::ReleaseReservation => actor.role.is_admin(),
        Operation::ForceCleanup => actor.role == Role::SuperAdmin,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(id: &str, role: Role) -> Actor {
        Actor {
            id: id.to_string(),
            name: "Test Actor".to_string(),
            email: "actor@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn owners_and_admins_view_reservations() {
        let owner = actor("u1", Role::User);
        let stranger = actor("u2", Role::User);
        let admin = actor("a1", Role::TurfAdmin);

        assert!(permits(&owner, Operation::ViewReservation, Some("u1")));
        assert!(!permits(&stranger, Operation::ViewReservation, Some("u1")));
        assert!(permits(&admin, Operation::ViewReservation, Some("u1")));
    }

    #[test]
    fn rival_identity_needs_self_or_admin() {
        let rival = actor("u1", Role::User);
        let stranger = actor("u2", Role::User);
        let admin = actor("a1", Role::SuperAdmin);

        assert!(permits(&rival, Operation::ViewRivalHolder, Some("u1")));
        assert!(!permits(&stranger, Operation::ViewRivalHolder, Some("u1")));
        assert!(permits(&admin, Operation::ViewRivalHolder, Some("u1")));
    }

    #[test]
    fn anonymous_caller_is_never_an_owner() {
        let anonymous = actor("", Role::User);
        assert!(!permits(&anonymous, Operation::ViewReservation, Some("")));
    }

    #[test]
    fn release_requires_an_admin_role() {
        assert!(!permits(&actor("u1", Role::User), Operation::ReleaseReservation, None));
        assert!(permits(&actor("a1", Role::TurfAdmin), Operation::ReleaseReservation, None));
        assert!(permits(&actor("a2", Role::SuperAdmin), Operation::ReleaseReservation, None));
    }

    #[test]
    fn cleanup_is_super_admin_only() {
        assert!(!permits(&actor("u1", Role::User), Operation::ForceCleanup, None));
        assert!(!permits(&actor("a1", Role::TurfAdmin), Operation::ForceCleanup, None));
        assert!(permits(&actor("a2", Role::SuperAdmin), Operation::ForceCleanup, None));
    }
}
