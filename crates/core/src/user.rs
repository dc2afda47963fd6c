//! User model - the partial view of an account the backend exposes.

use serde::{Deserialize, Serialize};
use crate::id::UserId;

/// A marketplace account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: UserId,

    /// Display name
    #[serde(default)]
    pub fullname: String,

    /// Contact email
    #[serde(default)]
    pub email: String,

    /// Account role
    pub role: Role,

    /// Whether an admin approved the account's verification
    #[serde(default)]
    pub verified: bool,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl User {
    /// Check whether the user holds the given role.
    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

/// Account roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Posts projects and hires
    Client,
    /// Bids on projects and delivers work
    Freelancer,
    /// Moderates the platform
    Admin,
}

impl Role {
    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Freelancer => "freelancer",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Populated user fields embedded in other documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    /// Unique identifier
    #[serde(rename = "_id")]
    pub id: UserId,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullname: Option<String>,

    /// Contact email
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Avatar URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

/// A reference to a user: either a bare id or a populated document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserRef {
    /// Bare id
    Id(UserId),
    /// Populated subset of the user document
    User(UserSummary),
}

impl UserRef {
    /// The referenced user's id.
    pub fn id(&self) -> &UserId {
        match self {
            UserRef::Id(id) => id,
            UserRef::User(user) => &user.id,
        }
    }

    /// Display name when the reference was populated.
    pub fn name(&self) -> Option<&str> {
        match self {
            UserRef::Id(_) => None,
            UserRef::User(user) => user.fullname.as_deref(),
        }
    }
}

impl From<UserId> for UserRef {
    fn from(id: UserId) -> Self {
        UserRef::Id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_ref_accepts_id_or_document() {
        let bare: UserRef = serde_json::from_str("\"u1\"").unwrap();
        assert_eq!(bare.id().as_str(), "u1");
        assert!(bare.name().is_none());

        let populated: UserRef =
            serde_json::from_str(r#"{"_id":"u2","fullname":"Ada Lovelace"}"#).unwrap();
        assert_eq!(populated.id().as_str(), "u2");
        assert_eq!(populated.name(), Some("Ada Lovelace"));
    }

    #[test]
    fn test_user_decodes_backend_shape() {
        let user: User = serde_json::from_str(
            r#"{"_id":"u1","fullname":"Jo","email":"jo@x.io","role":"freelancer","verified":true}"#,
        )
        .unwrap();
        assert!(user.is(Role::Freelancer));
        assert!(user.verified);
        assert!(user.profile_photo.is_none());
    }
}
