//! Account management commands.
//!
//! Accounts go through the same validation and hashing as
//! `POST /auth/register`.

use bazaar_storefront::services::auth::{AuthError, AuthService, RegistrationForm};
use thiserror::Error;

use super::{ConnectError, connect};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

fn registration_form(email: &str, name: &str, role: &str, password: &str) -> RegistrationForm {
    RegistrationForm {
        name: name.to_owned(),
        email: email.to_owned(),
        password: password.to_owned(),
        confirm_password: password.to_owned(),
        role: role.to_owned(),
    }
}

/// Create a new account.
///
/// The form is validated before any connection is opened.
///
/// # Errors
///
/// Returns `UserError::Auth` for invalid input or an existing email.
pub async fn create(email: &str, name: &str, role: &str, password: &str) -> Result<(), UserError> {
    let registration = registration_form(email, name, role, password).validate()?;

    let pool = connect().await?;
    let user = AuthService::new(&pool).register(registration).await?;

    tracing::info!(user_id = %user.id, email = %user.email, role = %user.role, "Account created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_confirms_password() {
        let form = registration_form("a@b.co", "Ann", "seller", "secret1");
        assert_eq!(form.confirm_password, form.password);
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let form = registration_form("a@b.co", "Ann", "admin", "secret1");
        assert!(form.validate().is_err());
    }

    #[tokio::test]
    async fn test_invalid_input_fails_before_connecting() {
        let result = create("not-an-email", "Ann", "buyer", "secret1").await;
        assert!(matches!(result, Err(UserError::Auth(_))));
    }
}
