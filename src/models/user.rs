use serde::{Deserialize, Serialize};

use crate::models::lenient;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserRole {
    #[serde(alias = "ceo")]
    Ceo,
    #[serde(alias = "manager")]
    Manager,
    #[serde(alias = "shipper")]
    Shipper,
    #[serde(alias = "rider")]
    Rider,
    #[default]
    #[serde(other)]
    Other,
}

impl UserRole {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "CEO" => Some(UserRole::Ceo),
            "MANAGER" => Some(UserRole::Manager),
            "SHIPPER" => Some(UserRole::Shipper),
            "RIDER" => Some(UserRole::Rider),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UserStatus {
    Active,
    Inactive,
}

impl UserStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Some(UserStatus::Active),
            "INACTIVE" => Some(UserStatus::Inactive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleInfo {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub vehicle_type: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub plate_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankDetails {
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub bank_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub account_title: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub account_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, alias = "_id", deserialize_with = "lenient::opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub email: String,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub role: UserRole,
    /// Kept as the raw string so unexpected values are shown as-is.
    #[serde(default, deserialize_with = "lenient::string")]
    pub status: String,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub vehicle_info: Option<VehicleInfo>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub company_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub bank_details: Option<BankDetails>,
    #[serde(default, deserialize_with = "lenient::opt_string")]
    pub created_at: Option<String>,
}

impl User {
    pub fn is_active(&self) -> bool {
        UserStatus::parse(&self.status) == Some(UserStatus::Active)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{User, UserRole};

    #[test]
    fn null_fields_do_not_reject_a_user() {
        let user: User = serde_json::from_value(json!({
            "_id": 17,
            "name": "Rider One",
            "email": null,
            "phone": 3001234567u64,
            "role": null,
            "status": null,
            "vehicleInfo": null,
            "bankDetails": { "accountNumber": 12345678 }
        }))
        .unwrap();

        assert_eq!(user.id.as_deref(), Some("17"));
        assert_eq!(user.email, "");
        assert_eq!(user.phone.as_deref(), Some("3001234567"));
        assert_eq!(user.role, UserRole::Other);
        assert!(!user.is_active());
        assert!(user.vehicle_info.is_none());
        assert_eq!(
            user.bank_details.and_then(|b| b.account_number).as_deref(),
            Some("12345678")
        );
    }

    #[test]
    fn roles_are_read_in_either_case() {
        let user: User = serde_json::from_value(json!({ "role": "rider" })).unwrap();
        assert_eq!(user.role, UserRole::Rider);
    }
}
