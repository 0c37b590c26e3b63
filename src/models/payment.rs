use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::premium::SelectedPremium;

pub const PAYMENT_METHOD_MPESA: &str = "M-Pesa";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Successful,
    Failed,
}

/// One entry of `paymentHistory`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: String,
    pub policy_id: String,
    pub policy_name: String,
    pub amount: f64,
    pub date: DateTime<Utc>,
    pub status: PaymentStatus,
    pub method: String,
}

impl PaymentRecord {
    pub fn successful(order_id: &str, premium: &SelectedPremium, at: DateTime<Utc>) -> Self {
        Self {
            id: payment_id(at),
            policy_id: order_id.to_string(),
            policy_name: premium.name.clone(),
            amount: premium.price,
            date: at,
            status: PaymentStatus::Successful,
            method: PAYMENT_METHOD_MPESA.to_string(),
        }
    }
}

/// `payment-<millis>-<7 random chars>`
fn payment_id(at: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("payment-{}-{}", at.timestamp_millis(), &random[..7])
}
