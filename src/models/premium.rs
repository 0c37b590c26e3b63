use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    pub id: String,
    pub name: String,
    pub included: bool,
}

/// A plan as listed by `/policies/get-premiums`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Premium {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_price: f64,
    #[serde(default)]
    pub coverages: Vec<Coverage>,
}

/// Billing frequency. Serialized with its display label (`"Weekly"`); the
/// purchase endpoint takes the lower-case form from [`Frequency::as_duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Monthly,
    Annually,
}

impl Frequency {
    pub const ALL: [Frequency; 4] = [
        Frequency::Daily,
        Frequency::Weekly,
        Frequency::Monthly,
        Frequency::Annually,
    ];

    pub fn as_duration(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Annually => "annually",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
            Frequency::Monthly => "Monthly",
            Frequency::Annually => "Annually",
        }
    }

    /// Suffix shown after a price, e.g. `KES 150 /week`.
    pub fn per_unit(&self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Annually => "year",
        }
    }

    pub fn savings_badge(&self) -> Option<&'static str> {
        match self {
            Frequency::Monthly => Some("Save 5% with monthly payments"),
            Frequency::Annually => Some("Save 20% with annual payments"),
            _ => None,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "annually" | "annual" => Ok(Frequency::Annually),
            other => Err(AppError::invalid_data(format!(
                "Unknown payment frequency: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.label().to_string()
    }
}

/// Price charged per billing period for a plan's weekly base price.
pub fn calculate_price(base_price: f64, frequency: Frequency) -> f64 {
    match frequency {
        Frequency::Daily => (base_price / 7.0).ceil() + 2.0 - 9.0,
        Frequency::Weekly => base_price,
        Frequency::Monthly => (base_price * 4.0 * 0.95).ceil(),
        Frequency::Annually => (base_price * 52.0 * 0.8).ceil(),
    }
}

/// The plan the rider picked, priced for the chosen frequency. Stored under
/// `selectedPremium` and read back by the purchase screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedPremium {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: f64,
    pub period: Frequency,
    #[serde(default)]
    pub coverages: Vec<Coverage>,
}

impl SelectedPremium {
    pub fn from_premium(premium: &Premium, frequency: Frequency) -> Self {
        Self {
            id: premium.id.clone(),
            name: premium.name.clone(),
            description: premium.description.clone(),
            price: calculate_price(premium.base_price, frequency),
            period: frequency,
            coverages: premium.coverages.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PremiumsResponse {
    #[serde(default)]
    pub premiums: Vec<Premium>,
}
