//! Field validation for ticker bodies.

use crate::errors::AppError;
use crate::models::TickerFields;

/// Chainable checks over a single string field. The first failing rule wins.
pub struct Validate<'a> {
    field: &'static str,
    value: &'a str,
    error: Option<String>,
}

impl<'a> Validate<'a> {
    pub fn field(field: &'static str, value: &'a str) -> Self {
        Self {
            field,
            value,
            error: None,
        }
    }

    /// The value must not be blank.
    pub fn required(mut self) -> Self {
        if self.error.is_none() && self.value.trim().is_empty() {
            self.error = Some("is required".to_string());
        }
        self
    }

    /// Non-empty values must have at least `min` characters.
    pub fn min_length(mut self, min: usize) -> Self {
        if self.error.is_none()
            && !self.value.is_empty()
            && self.value.chars().count() < min
        {
            self.error = Some(format!("must be at least {} characters", min));
        }
        self
    }

    /// Non-empty values must look like an email address.
    pub fn email(mut self) -> Self {
        if self.error.is_none() && !self.value.is_empty() && !is_email(self.value) {
            self.error = Some("is not a valid email address".to_string());
        }
        self
    }

    pub fn finish(self) -> Result<(), AppError> {
        match self.error {
            Some(reason) => Err(AppError::Validation {
                field: self.field,
                reason,
            }),
            None => Ok(()),
        }
    }
}

/// Validate a ticker body in fixed field order, stopping at the first failure.
pub fn validate_ticker(fields: &TickerFields) -> Result<(), AppError> {
    let info = &fields.information;

    Validate::field("domain", &fields.domain)
        .required()
        .min_length(5)
        .finish()?;
    Validate::field("title", &fields.title)
        .required()
        .min_length(5)
        .finish()?;
    Validate::field("description", &fields.description)
        .required()
        .min_length(5)
        .finish()?;
    Validate::field("author", &info.author).min_length(3).finish()?;
    Validate::field("url", &info.url).min_length(5).finish()?;
    Validate::field("email", &info.email).email().finish()?;
    Validate::field("twitter", &info.twitter).min_length(5).finish()?;
    Validate::field("facebook", &info.facebook)
        .min_length(5)
        .finish()?;

    Ok(())
}

/// Basic `local@domain.tld` shape check.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && tld.len() >= 2,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Information;

    fn valid() -> TickerFields {
        TickerFields {
            domain: "prozessticker.org".into(),
            title: "Ticker".into(),
            description: "Beschreibung".into(),
            information: Information {
                url: "https://www.systemli.org".into(),
                email: "admin@systemli.org".into(),
                twitter: "systemli".into(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn failing_field(fields: &TickerFields) -> Option<&'static str> {
        match validate_ticker(fields) {
            Err(AppError::Validation { field, .. }) => Some(field),
            _ => None,
        }
    }

    #[test]
    fn test_valid_body_passes() {
        assert!(validate_ticker(&valid()).is_ok());
    }

    #[test]
    fn test_domain_reported_first() {
        let fields = TickerFields {
            domain: "ab".into(),
            ..Default::default()
        };
        match validate_ticker(&fields) {
            Err(AppError::Validation { field, reason }) => {
                assert_eq!(field, "domain");
                assert_eq!(reason, "must be at least 5 characters");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_fields() {
        let mut fields = valid();
        fields.title = "  ".into();
        assert_eq!(failing_field(&fields), Some("title"));

        let mut fields = valid();
        fields.description = String::new();
        assert_eq!(failing_field(&fields), Some("description"));
    }

    #[test]
    fn test_optional_fields_checked_only_when_present() {
        let mut fields = valid();
        fields.information = Information::default();
        assert!(validate_ticker(&fields).is_ok());

        fields.information.author = "ab".into();
        assert_eq!(failing_field(&fields), Some("author"));

        fields.information.author = "abc".into();
        fields.information.facebook = "fb".into();
        fields.information.email = "not-an-email".into();
        // email precedes facebook
        assert_eq!(failing_field(&fields), Some("email"));

        fields.information.email = "admin@systemli.org".into();
        assert_eq!(failing_field(&fields), Some("facebook"));
    }

    #[test]
    fn test_min_length_counts_characters() {
        assert!(Validate::field("title", "Tückö")
            .min_length(5)
            .finish()
            .is_ok());
    }

    #[test]
    fn test_is_email() {
        assert!(is_email("admin@systemli.org"));
        assert!(!is_email("admin@systemli"));
        assert!(!is_email("@systemli.org"));
        assert!(!is_email("a@b@systemli.org"));
        assert!(!is_email("ad min@systemli.org"));
    }
}
