// SPDX-License-Identifier: GPL-3.0-only

use secrecy::{ExposeSecret, SecretString};

use crate::app::core::NewAuthenticator;

/// Raw contents of the add form
#[derive(Debug, Clone)]
pub struct InputableAuthenticator {
    pub name: String,
    pub email: String,
    pub secret: SecretString,
}

impl Default for InputableAuthenticator {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            secret: SecretString::from(String::new()),
        }
    }
}

impl TryFrom<&InputableAuthenticator> for NewAuthenticator {
    type Error = anywho::Error;

    fn try_from(value: &InputableAuthenticator) -> Result<Self, anywho::Error> {
        NewAuthenticator::new(&value.name, &value.email, value.secret.expose_secret())
    }
}

impl InputableAuthenticator {
    /// Returns true if the form is ready for submission
    pub fn valid(&self) -> bool {
        !self.name.trim().is_empty()
            && self.email.contains('@')
            && !self.secret.expose_secret().trim().is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled() -> InputableAuthenticator {
        InputableAuthenticator {
            name: String::from("GitHub"),
            email: String::from("me@example.com"),
            secret: SecretString::from(" jbswy3dpehpk3pxp "),
        }
    }

    #[test]
    fn empty_form_is_not_valid() {
        assert!(!InputableAuthenticator::default().valid());
    }

    #[test]
    fn every_field_is_required() {
        let mut form = filled();
        assert!(form.valid());

        form.name = String::from("  ");
        assert!(!form.valid());

        let mut form = filled();
        form.email = String::from("me");
        assert!(!form.valid());

        let mut form = filled();
        form.secret = SecretString::from(" ");
        assert!(!form.valid());
    }

    #[test]
    fn converts_into_submission() {
        let new = NewAuthenticator::try_from(&filled()).expect("valid form");

        assert_eq!(new.name(), "GitHub");
        assert_eq!(new.secret(), "JBSWY3DPEHPK3PXP");
    }

    #[test]
    fn clear_resets_form() {
        let mut form = filled();
        form.clear();

        assert!(form.name.is_empty());
        assert!(form.secret.expose_secret().is_empty());
    }
}
