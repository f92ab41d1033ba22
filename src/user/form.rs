//! The request body for registering, creating and updating users.

use email_address::EmailAddress;
use serde::Deserialize;

use crate::{
    Error,
    auth::{PasswordHash, ValidatedPassword},
    user::NewUser,
    validation::{ValidationErrors, required_text},
};

const MAX_NAME_LENGTH: usize = 255;

/// The user details entered by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserForm {
    /// The display name.
    #[serde(default)]
    pub name: Option<String>,
    /// The email address used to log in.
    #[serde(default)]
    pub email: Option<String>,
    /// The plain text password.
    #[serde(default)]
    pub password: Option<String>,
}

impl UserForm {
    /// Validate every field and hash the password with bcrypt `hash_cost`.
    ///
    /// # Errors
    ///
    /// Returns an [Error::Validation] listing every invalid field, or an
    /// [Error::HashingError] if the password could not be hashed.
    pub fn validate(self, hash_cost: u32) -> Result<NewUser, Error> {
        let mut errors = ValidationErrors::default();

        let name = required_text(self.name, "name", "name", MAX_NAME_LENGTH, &mut errors);
        let email = required_text(self.email, "email", "email", MAX_NAME_LENGTH, &mut errors);
        if !email.is_empty() && !EmailAddress::is_valid(&email) {
            errors.add("email", "The email must be a valid email address.");
        }

        let password = self.password.unwrap_or_default();
        let validated_password = if password.is_empty() {
            errors.add("password", "The password field is required.");
            None
        } else {
            match ValidatedPassword::new(&password, &[&name, &email]) {
                Ok(validated_password) => Some(validated_password),
                Err(Error::TooWeak(feedback)) => {
                    errors.add("password", feedback);
                    None
                }
                Err(error) => return Err(error),
            }
        };

        let validated_password = match (errors.is_empty(), validated_password) {
            (true, Some(validated_password)) => validated_password,
            _ => return Err(Error::Validation(errors)),
        };

        Ok(NewUser {
            name,
            email,
            password_hash: PasswordHash::new(validated_password, hash_cost)?,
        })
    }
}

#[cfg(test)]
mod user_form_tests {
    use crate::Error;

    use super::UserForm;

    fn form(name: &str, email: &str, password: &str) -> UserForm {
        UserForm {
            name: Some(name.to_owned()),
            email: Some(email.to_owned()),
            password: Some(password.to_owned()),
        }
    }

    #[test]
    fn valid_form_produces_hashed_user() {
        let new_user = form("Alice", "alice@example.com", "correct horse battery staple")
            .validate(4)
            .unwrap();

        assert_eq!(new_user.name, "Alice");
        assert_eq!(new_user.email, "alice@example.com");
        assert!(
            new_user
                .password_hash
                .verify("correct horse battery staple")
                .unwrap()
        );
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let result = UserForm::default().validate(4);

        let Err(Error::Validation(errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        assert!(errors.get("name").is_some());
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
    }

    #[test]
    fn invalid_email_and_weak_password_are_rejected() {
        let result = form("Alice", "not an email", "password").validate(4);

        let Err(Error::Validation(errors)) = result else {
            panic!("want validation error, got {result:?}");
        };
        assert_eq!(
            errors.get("email").unwrap(),
            ["The email must be a valid email address.".to_owned()]
        );
        assert!(errors.get("password").is_some());
        assert!(errors.get("name").is_none());
    }
}
