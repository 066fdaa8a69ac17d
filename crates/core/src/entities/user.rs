//! User entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Credential, Email, Gender, UserId};

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Unique case-insensitively across the user set.
    pub email: Email,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub password: Credential,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_year: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_month: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_day: Option<u8>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

/// Payload for registration; the repository mints id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub last_name: Option<String>,
    pub email: Email,
    pub phone: String,
    pub avatar: Option<String>,
    pub password: Credential,
    pub gender: Option<Gender>,
    pub birth_year: Option<u16>,
    pub birth_month: Option<u8>,
    pub birth_day: Option<u8>,
    pub is_admin: bool,
}

impl NewUser {
    /// Attach an id and creation time, producing a full [`User`].
    #[must_use]
    pub fn into_user(self, id: UserId, created_at: DateTime<Utc>) -> User {
        User {
            id,
            name: self.name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            avatar: self.avatar,
            password: self.password,
            gender: self.gender,
            birth_year: self.birth_year,
            birth_month: self.birth_month,
            birth_day: self.birth_day,
            is_admin: self.is_admin,
            created_at,
        }
    }
}

/// Profile update for the current user. Email, password, and the admin flag
/// are not patchable through this surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub last_name: Option<Option<String>>,
    pub phone: Option<String>,
    pub avatar: Option<Option<String>>,
    pub gender: Option<Option<Gender>>,
    pub birth_year: Option<Option<u16>>,
    pub birth_month: Option<Option<u8>>,
    pub birth_day: Option<Option<u8>>,
}

impl UserPatch {
    /// Apply this patch to a user in place.
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(last_name) = self.last_name {
            user.last_name = last_name;
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = avatar;
        }
        if let Some(gender) = self.gender {
            user.gender = gender;
        }
        if let Some(birth_year) = self.birth_year {
            user.birth_year = birth_year;
        }
        if let Some(birth_month) = self.birth_month {
            user.birth_month = birth_month;
        }
        if let Some(birth_day) = self.birth_day {
            user.birth_day = birth_day;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_record_without_is_admin_deserializes() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Bat",
            "email": "bat@example.com",
            "phone": "99110011",
            "password": "pw",
            "createdAt": 1_700_000_000_000_i64
        }))
        .unwrap();
        assert!(!user.is_admin);
        assert!(user.last_name.is_none());
    }

    #[test]
    fn test_patch_does_not_touch_credentials() {
        let mut user: User = serde_json::from_value(serde_json::json!({
            "id": "u1", "name": "Bat", "email": "bat@example.com",
            "phone": "99110011", "password": "pw",
            "createdAt": 1_700_000_000_000_i64
        }))
        .unwrap();
        UserPatch {
            name: Some("Bold".into()),
            ..UserPatch::default()
        }
        .apply(&mut user);
        assert_eq!(user.name, "Bold");
        assert!(user.password.matches("pw"));
        assert_eq!(user.email.as_str(), "bat@example.com");
    }
}
