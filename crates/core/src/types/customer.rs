//! Customer contact and shipping details collected at checkout.
//!
//! The details live only as long as the checkout request that carries them.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Country used when the checkout form leaves it empty.
pub const DEFAULT_COUNTRY: &str = "US";

/// Required fields were blank.
///
/// Fields are listed in form order using their wire names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fill in all required fields: {}", .0.join(", "))]
pub struct MissingFields(pub Vec<&'static str>);

/// Free-form contact and address fields from the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerInfo {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl CustomerInfo {
    /// Names of the required fields that are empty or whitespace only.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("email", &self.email),
            ("name", &self.name),
            ("phone", &self.phone),
            ("address", &self.address),
            ("city", &self.city),
            ("state", &self.state),
            ("zipCode", &self.zip_code),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }

    /// Check that every required field is filled in.
    ///
    /// # Errors
    ///
    /// Returns [`MissingFields`] naming each blank field.
    pub fn validate(&self) -> Result<(), MissingFields> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingFields(missing))
        }
    }

    /// Country code, falling back to [`DEFAULT_COUNTRY`] when blank.
    #[must_use]
    pub fn country_code(&self) -> &str {
        let country = self.country.trim();
        if country.is_empty() {
            DEFAULT_COUNTRY
        } else {
            country
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn complete() -> CustomerInfo {
        CustomerInfo {
            email: "ada@example.com".to_string(),
            name: "Ada Lovelace".to_string(),
            phone: "555-0100".to_string(),
            address: "12 Analytical Way".to_string(),
            city: "London".to_string(),
            state: "LDN".to_string(),
            zip_code: "N1 9GU".to_string(),
            country: "GB".to_string(),
        }
    }

    #[test]
    fn test_complete_info_validates() {
        assert!(complete().validate().is_ok());
    }

    #[test]
    fn test_missing_fields_in_form_order() {
        let info = CustomerInfo {
            email: String::new(),
            zip_code: "   ".to_string(),
            ..complete()
        };
        let err = info.validate().unwrap_err();
        assert_eq!(err.0, vec!["email", "zipCode"]);
        assert_eq!(
            err.to_string(),
            "Please fill in all required fields: email, zipCode"
        );
    }

    #[test]
    fn test_empty_info_reports_all_required() {
        let missing = CustomerInfo::default().missing_fields();
        assert_eq!(
            missing,
            vec!["email", "name", "phone", "address", "city", "state", "zipCode"]
        );
    }

    #[test]
    fn test_country_defaults() {
        let info: CustomerInfo = serde_json::from_str(r#"{"email":"a@b.c"}"#).unwrap();
        assert_eq!(info.country, "US");

        let blank = CustomerInfo {
            country: String::new(),
            ..complete()
        };
        assert_eq!(blank.country_code(), "US");
        assert_eq!(complete().country_code(), "GB");
    }
}
