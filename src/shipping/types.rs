//! Shipping address types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::products::non_empty;

/// A saved shipping address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    pub full_name: String,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, with = "crate::timestamp::option", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl ShippingAddress {
    /// Single-line rendering, matching the snapshot stored on orders
    pub fn formatted(&self) -> String {
        let mut out = format!("{}, {}", self.full_name, self.address_line1);
        if let Some(line2) = self.address_line2.as_deref().filter(|l| !l.trim().is_empty()) {
            out.push_str(", ");
            out.push_str(line2);
        }
        out.push_str(&format!(
            ", {}, {} {}, {}",
            self.city, self.state, self.postal_code, self.country
        ));
        if let Some(phone) = self.phone_number.as_deref().filter(|p| !p.trim().is_empty()) {
            out.push_str(&format!(", Phone: {phone}"));
        }
        out
    }
}

/// Address form contents for create and update
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AddressInput {
    pub full_name: String,
    pub address_line1: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub is_default: bool,
}

impl AddressInput {
    /// Check required fields, returning the first missing one
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("full_name", &self.full_name),
            ("address_line1", &self.address_line1),
            ("city", &self.city),
            ("state", &self.state),
            ("postal_code", &self.postal_code),
            ("country", &self.country),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(Error::validation(format!("{field} is required")));
            }
        }
        Ok(())
    }

    /// Trimmed copy with blank optional fields dropped
    pub fn normalized(&self) -> Self {
        Self {
            full_name: self.full_name.trim().to_string(),
            address_line1: self.address_line1.trim().to_string(),
            address_line2: non_empty(self.address_line2.as_deref().map(|s| s.trim().to_string())),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
            phone_number: non_empty(self.phone_number.as_deref().map(|s| s.trim().to_string())),
            is_default: self.is_default,
        }
    }
}

impl From<&ShippingAddress> for AddressInput {
    fn from(address: &ShippingAddress) -> Self {
        Self {
            full_name: address.full_name.clone(),
            address_line1: address.address_line1.clone(),
            address_line2: address.address_line2.clone(),
            city: address.city.clone(),
            state: address.state.clone(),
            postal_code: address.postal_code.clone(),
            country: address.country.clone(),
            phone_number: address.phone_number.clone(),
            is_default: address.is_default,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AddressEnvelope {
    pub address: ShippingAddress,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn address() -> ShippingAddress {
        serde_json::from_value(json!({
            "id": 1,
            "user_id": 7,
            "full_name": "Ada Lovelace",
            "address_line1": "1 Analytical Way",
            "address_line2": "",
            "city": "London",
            "state": "LDN",
            "postal_code": "N1 9GU",
            "country": "UK",
            "phone_number": "555-0100",
            "is_default": true,
            "created_at": "2024-03-01T09:30:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_formatted_skips_blank_line2() {
        assert_eq!(
            address().formatted(),
            "Ada Lovelace, 1 Analytical Way, London, LDN N1 9GU, UK, Phone: 555-0100"
        );
    }

    #[test]
    fn test_validate_reports_missing_field() {
        let mut input = AddressInput::from(&address());
        assert!(input.validate().is_ok());

        input.city = "  ".into();
        let err = input.validate().unwrap_err();
        assert_eq!(err.user_message(), "city is required");
    }

    #[test]
    fn test_normalized_drops_blank_optionals() {
        let mut input = AddressInput::from(&address());
        input.full_name = "  Ada Lovelace ".into();
        input.phone_number = Some("   ".into());

        let normalized = input.normalized();
        assert_eq!(normalized.full_name, "Ada Lovelace");
        assert_eq!(normalized.address_line2, None);
        assert_eq!(normalized.phone_number, None);
    }
}
