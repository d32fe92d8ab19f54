//! Signed-in identity types.

use serde::{Deserialize, Serialize};

use super::email::Email;
use super::id::IdentityId;
use super::status::Role;

/// The authenticated user or administrator.
///
/// Persisted as the global identity record, so field names stay camelCase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: IdentityId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Identity {
    /// Whether this identity may use the admin dashboard.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Apply a partial profile update, keeping fields that are `None`.
    ///
    /// The role and id are never touched by a profile update.
    #[must_use]
    pub fn merged(mut self, update: ProfileUpdate) -> Self {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
        self
    }
}

/// Fields a signed-in identity may change on the profile page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none() && self.address.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn shopper() -> Identity {
        Identity {
            id: IdentityId::new("user-1"),
            name: "priya".to_string(),
            email: Email::parse("priya@styleaura.com").unwrap(),
            role: Role::User,
            phone: None,
            address: None,
        }
    }

    #[test]
    fn test_merged_keeps_unset_fields() {
        let updated = shopper().merged(ProfileUpdate {
            phone: Some("9123456780".to_string()),
            ..ProfileUpdate::default()
        });

        assert_eq!(updated.name, "priya");
        assert_eq!(updated.phone.as_deref(), Some("9123456780"));
        assert_eq!(updated.role, Role::User);
    }

    #[test]
    fn test_persisted_layout_omits_missing_contact_fields() {
        let json = serde_json::to_string(&shopper()).unwrap();
        assert_eq!(
            json,
            r#"{"id":"user-1","name":"priya","email":"priya@styleaura.com","role":"user"}"#
        );
    }
}
