use serde::{Deserialize, Serialize};

/// Fallback display name when a principal carries neither a name nor an email
pub const UNKNOWN_NAME: &str = "Unknown";

/// An identity verified by an external authentication provider.
///
/// This is distinct from the local `User` row; the identity resolver maps
/// one onto the other the first time a principal is seen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub external_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Principal {
    pub fn new(external_id: impl Into<String>) -> Self {
        Self {
            external_id: external_id.into(),
            first_name: None,
            last_name: None,
            email: None,
            image_url: None,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    /// Primary email address, or empty string when the provider has none
    pub fn primary_email(&self) -> &str {
        self.email.as_deref().map(str::trim).unwrap_or("")
    }

    /// Display name for a newly created user.
    ///
    /// First and last name joined with a space, else the email, else
    /// [`UNKNOWN_NAME`].
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();

        if !first.is_empty() || !last.is_empty() {
            return format!("{} {}", first, last).trim().to_string();
        }

        let email = self.primary_email();
        if !email.is_empty() {
            return email.to_string();
        }

        UNKNOWN_NAME.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_from_full_name() {
        let p = Principal::new("ext_1").with_name("Ada", "Lovelace");
        assert_eq!(p.display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_display_name_from_partial_name() {
        let mut p = Principal::new("ext_1");
        p.last_name = Some("Hopper".to_string());
        assert_eq!(p.display_name(), "Hopper");

        let mut p = Principal::new("ext_2");
        p.first_name = Some("Grace".to_string());
        assert_eq!(p.display_name(), "Grace");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let p = Principal::new("ext_1").with_email("ada@example.com");
        assert_eq!(p.display_name(), "ada@example.com");
    }

    #[test]
    fn test_display_name_falls_back_to_unknown() {
        let p = Principal::new("ext_1");
        assert_eq!(p.display_name(), UNKNOWN_NAME);
        assert_eq!(p.primary_email(), "");
    }

    #[test]
    fn test_blank_names_are_ignored() {
        let p = Principal::new("ext_1")
            .with_name("  ", "")
            .with_email("x@example.com");
        assert_eq!(p.display_name(), "x@example.com");
    }
}
