//! Access Policy Evaluator: pure capability checks over a [`Principal`].
//!
//! Role names are compared with ASCII case folding everywhere, the same rule
//! the RBAC gate applies.

use crate::services::auth::principal::{Principal, ROLE_ADMIN};

pub fn has_role(principal: &Principal, name: &str) -> bool {
    principal.role().eq_ignore_ascii_case(name)
}

pub fn is_admin(principal: &Principal) -> bool {
    has_role(principal, ROLE_ADMIN)
}

/// Self-service rule: admins may access any user record, everyone else only
/// their own.
pub fn can_access(principal: &Principal, target_user_id: u32) -> bool {
    is_admin(principal) || principal.id() == target_user_id
}

/// Single-role model: one element, or none when the role is empty.
pub fn roles(principal: &Principal) -> Vec<&str> {
    match principal.role() {
        "" => Vec::new(),
        role => vec![role],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn role_match_folds_case() {
        let p = Principal::new(1, "ADMIN");
        assert!(has_role(&p, "admin"));
        assert!(is_admin(&p));
        assert!(!has_role(&p, "user"));
    }

    #[test]
    fn empty_role_has_no_roles() {
        assert!(roles(&Principal::new(1, "")).is_empty());
        assert_eq!(roles(&Principal::new(1, "user")), vec!["user"]);
    }

    proptest! {
        #[test]
        fn admin_can_access_anyone(id in any::<u32>(), target in any::<u32>()) {
            prop_assert!(can_access(&Principal::new(id, "admin"), target));
        }

        #[test]
        fn others_only_access_themselves(
            id in any::<u32>(),
            target in any::<u32>(),
            role in "[a-z]{1,8}",
        ) {
            prop_assume!(role != "admin");
            let p = Principal::new(id, role);
            prop_assert_eq!(can_access(&p, target), id == target);
        }
    }
}
