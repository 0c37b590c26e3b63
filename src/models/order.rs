use serde::{Deserialize, Serialize};

use crate::models::premium::Frequency;

/// Backend status of a purchase order. Anything the client does not
/// recognise is treated like `Pending` and polled again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Active,
    Failed,
    #[serde(other)]
    Unknown,
}

/// Buy request built from the selected premium and the rider's phone number.
#[derive(Debug, Clone, PartialEq)]
pub struct PurchaseRequest {
    pub phone: String,
    pub amount: f64,
    pub premium_id: String,
    pub duration: Frequency,
}

/// Wire body of `POST /policies/buy-insurance`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyInsuranceBody<'a> {
    pub phone: &'a str,
    pub amount_kes: f64,
    pub premium_id: &'a str,
    pub duration: &'static str,
}

impl<'a> From<&'a PurchaseRequest> for BuyInsuranceBody<'a> {
    fn from(req: &'a PurchaseRequest) -> Self {
        Self {
            phone: &req.phone,
            amount_kes: req.amount,
            premium_id: &req.premium_id,
            duration: req.duration.as_duration(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BuyInsuranceResponse {
    #[serde(rename = "orderID")]
    pub order_id: String,
}

/// Response of `GET /policies/status/{orderID}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusResponse {
    pub status: OrderStatus,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub explorer_link: Option<String>,
}

impl OrderStatusResponse {
    pub fn with_status(status: OrderStatus) -> Self {
        Self {
            status,
            transaction_hash: None,
            explorer_link: None,
        }
    }
}
