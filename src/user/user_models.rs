use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn to_db_str(self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// The single registration contract: one field set for every role.
#[derive(Clone, Debug)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub phone: String,
    pub role: UserRole,
}

/// A stored account, without credential material.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub full_name: String,
    pub phone: String,
    pub created: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_db_roundtrip() {
        assert_eq!(UserRole::from_db_str("user"), Some(UserRole::User));
        assert_eq!(UserRole::from_db_str("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::from_db_str("root"), None);
        assert_eq!(UserRole::Admin.to_db_str(), "admin");
    }
}
