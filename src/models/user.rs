use serde::{Deserialize, Deserializer, Serialize};

/// Vehicle details as stored under `motorcycleDetails`. The backend sends
/// `engineCapacity` and `year` as numbers, the signup form keeps them as
/// text; both read into strings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorcycleDetails {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub license_plate: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub year: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub engine_capacity: String,
}

impl MotorcycleDetails {
    /// Vehicle type with its first letter upper-cased, e.g. `Motorcycle`.
    pub fn display_kind(&self) -> String {
        let mut chars = self.kind.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s,
        Some(other) => other.to_string(),
    })
}

/// Response of `GET /auth/get-user`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub phone: String,
    #[serde(default)]
    pub wallet_address: Option<String>,
    #[serde(default)]
    pub motorcycle: Option<MotorcycleDetails>,
}

/// Shortens a wallet address for display, e.g. `0x1234...5678`.
pub fn format_wallet_address(address: Option<&str>) -> String {
    match address {
        None | Some("") => "No wallet address".to_string(),
        Some(address) => {
            let chars: Vec<char> = address.chars().collect();
            if chars.len() <= 10 {
                return address.to_string();
            }
            let head: String = chars[..6].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }
}
