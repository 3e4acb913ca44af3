use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;

/// Account roles, ordered by rank: admin > manager > user.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, sqlx::Type, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    User,
}

impl Role {
    pub fn rank(self) -> u8 {
        match self {
            Role::Admin => 3,
            Role::Manager => 2,
            Role::User => 1,
        }
    }

    /// Satisfied iff this role ranks at least as high as `required`.
    pub fn has_permission(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::str::FromStr;

    #[rstest]
    #[case(Role::Admin, Role::Admin, true)]
    #[case(Role::Admin, Role::Manager, true)]
    #[case(Role::Admin, Role::User, true)]
    #[case(Role::Manager, Role::Admin, false)]
    #[case(Role::Manager, Role::Manager, true)]
    #[case(Role::Manager, Role::User, true)]
    #[case(Role::User, Role::Admin, false)]
    #[case(Role::User, Role::Manager, false)]
    #[case(Role::User, Role::User, true)]
    fn permission_follows_rank(#[case] role: Role, #[case] required: Role, #[case] expected: bool) {
        assert_eq!(role.has_permission(required), expected);
    }

    #[test]
    fn parses_lowercase_names() {
        assert_eq!(Role::from_str("admin").unwrap(), Role::Admin);
        assert_eq!(Role::from_str("manager").unwrap(), Role::Manager);
        assert_eq!(Role::from_str("user").unwrap(), Role::User);
        assert!(Role::from_str("superuser").is_err());
    }

    #[test]
    fn displays_lowercase() {
        assert_eq!(Role::Manager.to_string(), "manager");
    }
}
