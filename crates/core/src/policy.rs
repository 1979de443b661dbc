//! Authorization policy for lifecycle and ledger operations
//!
//! Pure ownership/role checks. Identity resolution (who the actor is)
//! belongs to the authentication collaborator outside this crate.

use uuid::Uuid;

use crate::models::Role;

/// Roles allowed to act on resources they do not own
pub const ELEVATED_ROLES: &[Role] = &[Role::Moderator, Role::Admin];

/// The authenticated caller of an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }
}

/// True if the actor owns the resource or holds one of the elevated roles.
///
/// No state, no I/O; both the lifecycle and the ledger gate on this.
pub fn can_act(actor: &Actor, resource_owner_id: Uuid, elevated_roles: &[Role]) -> bool {
    actor.id == resource_owner_id || elevated_roles.contains(&actor.role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_can_act() {
        let id = Uuid::new_v4();
        let actor = Actor::new(id, Role::User);
        assert!(can_act(&actor, id, ELEVATED_ROLES));
    }

    #[test]
    fn test_other_user_cannot_act() {
        let actor = Actor::new(Uuid::new_v4(), Role::User);
        assert!(!can_act(&actor, Uuid::new_v4(), ELEVATED_ROLES));
    }

    #[test]
    fn test_staff_can_act_on_any_resource() {
        let moderator = Actor::new(Uuid::new_v4(), Role::Moderator);
        let admin = Actor::new(Uuid::new_v4(), Role::Admin);
        let owner = Uuid::new_v4();
        assert!(can_act(&moderator, owner, ELEVATED_ROLES));
        assert!(can_act(&admin, owner, ELEVATED_ROLES));
    }

    #[test]
    fn test_empty_elevation_table_means_owner_only() {
        let moderator = Actor::new(Uuid::new_v4(), Role::Moderator);
        assert!(!can_act(&moderator, Uuid::new_v4(), &[]));
    }
}
