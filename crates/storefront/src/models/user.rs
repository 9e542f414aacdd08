//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, Role, UserId};

/// Longest accepted value for free-text profile fields.
const MAX_FIELD_LENGTH: usize = 500;

/// A marketplace account (domain type).
///
/// The password hash is never part of this type; it is only read by the
/// login path through [`crate::db::UserRepository::get_password_hash`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to insert a new account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
    pub store_name: Option<String>,
    pub store_description: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
}

impl NewUser {
    /// A bare account with only the registration fields set.
    #[must_use]
    pub const fn new(name: String, email: Email, password_hash: String, role: Role) -> Self {
        Self {
            name,
            email,
            password_hash,
            role,
            store_name: None,
            store_description: None,
            phone: None,
            address: None,
            city: None,
            zip_code: None,
        }
    }
}

/// Profile edit request body.
///
/// Only the listed fields can change; email, role and password are not part
/// of the profile and any such keys in the body are ignored. Absent fields
/// keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    pub store_name: Option<String>,
    pub store_description: Option<String>,
}

impl ProfileUpdate {
    /// Trim every supplied field and check it.
    ///
    /// # Errors
    ///
    /// Returns a message naming the offending field if the name is blank or
    /// any text field is too long.
    pub fn validate(mut self) -> Result<Self, String> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_owned();
            if name.is_empty() {
                return Err("name cannot be empty".to_owned());
            }
        }

        let fields = [
            ("name", &mut self.name),
            ("phone", &mut self.phone),
            ("address", &mut self.address),
            ("city", &mut self.city),
            ("zipCode", &mut self.zip_code),
            ("storeName", &mut self.store_name),
            ("storeDescription", &mut self.store_description),
        ];
        for (field, value) in fields {
            if let Some(v) = value.as_mut() {
                *v = v.trim().to_owned();
                if v.chars().count() > MAX_FIELD_LENGTH {
                    return Err(format!(
                        "{field} must be at most {MAX_FIELD_LENGTH} characters"
                    ));
                }
            }
        }

        Ok(self)
    }
}
