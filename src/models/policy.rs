use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::order::OrderStatusResponse;
use crate::models::premium::{Coverage, SelectedPremium};
use crate::models::user::MotorcycleDetails;

pub const POLICY_STATUS_ACTIVE: &str = "Active";

/// Factor applied to the premium price when the policy record is written.
/// The rider is charged the undiscounted price.
pub const POLICY_PRICE_FACTOR: f64 = 0.99;

/// A confirmed policy, appended to `policies` once per order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub purchase_date: DateTime<Utc>,
    pub status: String,
    #[serde(default)]
    pub period: String,
    #[serde(default)]
    pub coverages: Vec<Coverage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motorcycle_details: Option<MotorcycleDetails>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explorer_link: Option<String>,
}

impl PolicyRecord {
    pub fn confirmed(
        order_id: &str,
        premium: &SelectedPremium,
        motorcycle: Option<&MotorcycleDetails>,
        status: &OrderStatusResponse,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: order_id.to_string(),
            name: premium.name.clone(),
            price: premium.price * POLICY_PRICE_FACTOR,
            purchase_date: at,
            status: POLICY_STATUS_ACTIVE.to_string(),
            period: premium.period.label().to_string(),
            coverages: premium.coverages.clone(),
            motorcycle_details: motorcycle.cloned(),
            transaction_hash: status.transaction_hash.clone(),
            explorer_link: status.explorer_link.clone(),
        }
    }
}
