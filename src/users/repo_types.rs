use std::fmt;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Account lifecycle flag; only `Active` accounts may log in.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
    Blocked,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Blocked => "blocked",
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String, // stored as submitted, never exposed in JSON
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub status: UserStatus,
    pub created_at: OffsetDateTime,
}

/// Values for a row about to be inserted.
#[derive(Debug, Clone, Copy)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub full_name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub status: UserStatus,
}

/// One row of `PRAGMA table_info(users)`.
#[derive(Debug, Clone, FromRow)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    #[sqlx(rename = "type")]
    pub ty: String,
    pub notnull: i64,
    pub dflt_value: Option<String>,
    pub pk: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn user_serialization_hides_password() {
        let user = User {
            id: 1,
            username: "admin".into(),
            password: "admin123".into(),
            full_name: None,
            email: Some("admin@example.com".into()),
            status: UserStatus::Blocked,
            created_at: datetime!(2024-01-01 0:00 UTC),
        };

        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"status\":\"blocked\""));
        assert!(json.contains("admin@example.com"));
        assert!(!json.contains("admin123"));
    }

    #[test]
    fn status_defaults_to_active() {
        assert_eq!(UserStatus::default(), UserStatus::Active);
        assert_eq!(UserStatus::Inactive.to_string(), "inactive");
    }
}
