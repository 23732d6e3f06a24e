use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::validation::{Checks, Validate};
use crate::error::AppResult;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Staff,
}

impl TryFrom<String> for Role {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "username": "admin",
    "name": "Admin User",
    "email": "admin@plexpay.com",
    "role": "admin"
}))]
pub struct User {
    pub id: u64,
    pub username: String,
    /// argon2 PHC string; never leaves the server
    #[serde(skip_serializing)]
    #[schema(write_only)]
    pub password: String,
    pub name: String,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[schema(example = "jane")]
    pub username: String,
    /// Required on create. On update, omitting it keeps the current password.
    #[schema(example = "s3cret-pass")]
    pub password: Option<String>,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@plexpay.com")]
    pub email: String,
    #[serde(default)]
    pub role: Role,
}

impl Validate for UserInput {
    fn validate(&self) -> AppResult<()> {
        Checks::new()
            .required("username", &self.username)
            .required("name", &self.name)
            .email("email", &self.email)
            .check(
                self.password.as_deref().is_none_or(|p| !p.is_empty()),
                "password",
                "must not be empty",
            )
            .finish()
    }
}

/// What the storage layer persists for a user; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_is_not_serialized() {
        let user = User {
            id: 7,
            username: "admin".into(),
            password: "$argon2id$v=19$hash".into(),
            name: "Admin User".into(),
            email: "admin@plexpay.com".into(),
            role: Role::Admin,
        };

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "admin");
    }

    #[test]
    fn role_defaults_to_staff() {
        let input: UserInput = serde_json::from_str(
            r#"{"username":"bob","password":"pw","name":"Bob","email":"bob@x.io"}"#,
        )
        .unwrap();
        assert_eq!(input.role, Role::Staff);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn unknown_roles_are_rejected() {
        let parsed = serde_json::from_str::<UserInput>(
            r#"{"username":"bob","name":"Bob","email":"bob@x.io","role":"owner"}"#,
        );
        assert!(parsed.is_err());
        assert!(Role::try_from("owner".to_string()).is_err());
        assert_eq!(Role::try_from("admin".to_string()).unwrap(), Role::Admin);
    }
}
