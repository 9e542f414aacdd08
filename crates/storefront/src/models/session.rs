//! Session-related types.
//!
//! The authenticated identity carried by a verified session token.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, Role, UserId};

/// The logged-in account, as recorded in its session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: UserId,
    pub role: Role,
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_name: Option<String>,
}

impl CurrentUser {
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.role == Role::Seller
    }

    #[must_use]
    pub fn is_buyer(&self) -> bool {
        self.role == Role::Buyer
    }
}

impl From<&super::User> for CurrentUser {
    fn from(user: &super::User) -> Self {
        Self {
            id: user.id,
            role: user.role,
            name: user.name.clone(),
            email: user.email.clone(),
            store_name: user.store_name.clone(),
        }
    }
}
