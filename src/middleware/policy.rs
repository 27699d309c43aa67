use crate::database::models::Role;

/// Who may call a route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Public,
    Authenticated,
    Roles(&'static [Role]),
}

/// (method, matched route pattern, access). Anything not listed requires a
/// valid token.
pub static POLICIES: &[(&str, &str, Access)] = &[
    ("GET", "/", Access::Public),
    ("GET", "/health", Access::Public),
    // Accounts
    ("POST", "/api/users/register", Access::Public),
    ("POST", "/api/users/login", Access::Public),
    ("GET", "/api/users", Access::Authenticated),
    ("POST", "/api/users", Access::Roles(Role::PRIVILEGED)),
    ("GET", "/api/users/me", Access::Authenticated),
    ("GET", "/api/users/:id", Access::Authenticated),
    ("PUT", "/api/users/:id", Access::Roles(Role::PRIVILEGED)),
    ("DELETE", "/api/users/:id", Access::Roles(Role::PRIVILEGED)),
    ("PUT", "/api/users/:id/activate", Access::Roles(Role::PRIVILEGED)),
    ("PUT", "/api/users/:id/deactivate", Access::Roles(Role::PRIVILEGED)),
    // Owner-or-privileged is checked in the handler
    ("PUT", "/api/users/:id/password", Access::Authenticated),
    // Catalogue reads are public; materials are internal
    ("GET", "/api/accessories", Access::Public),
    ("GET", "/api/accessories/:id", Access::Public),
    ("GET", "/api/cabs", Access::Public),
    ("GET", "/api/cabs/:id", Access::Public),
];

pub fn access_for(method: &str, path: &str) -> Access {
    POLICIES
        .iter()
        .find(|(m, p, _)| *m == method && *p == path)
        .map(|(_, _, access)| *access)
        .unwrap_or(Access::Authenticated)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogue_reads_are_public_writes_are_not() {
        assert_eq!(access_for("GET", "/api/accessories"), Access::Public);
        assert_eq!(access_for("GET", "/api/cabs/:id"), Access::Public);
        assert_eq!(access_for("POST", "/api/accessories"), Access::Authenticated);
        assert_eq!(access_for("DELETE", "/api/cabs/:id"), Access::Authenticated);
    }

    #[test]
    fn materials_always_need_a_token() {
        assert_eq!(access_for("GET", "/api/materials"), Access::Authenticated);
        assert_eq!(access_for("GET", "/api/materials/:id"), Access::Authenticated);
    }

    #[test]
    fn user_management_needs_a_privileged_role() {
        assert_eq!(access_for("PUT", "/api/users/:id/deactivate"), Access::Roles(Role::PRIVILEGED));
        assert_eq!(access_for("POST", "/api/users"), Access::Roles(Role::PRIVILEGED));
        assert_eq!(access_for("GET", "/api/users"), Access::Authenticated);
        assert_eq!(access_for("POST", "/api/users/login"), Access::Public);
    }

    #[test]
    fn no_duplicate_entries() {
        for (i, (m, p, _)) in POLICIES.iter().enumerate() {
            assert!(
                POLICIES[i + 1..].iter().all(|(m2, p2, _)| !(m == m2 && p == p2)),
                "duplicate policy for {} {}",
                m,
                p
            );
        }
    }
}
