// services/ledger.rs
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::Result;
use crate::models::payment::PaymentRecord;
use crate::models::policy::PolicyRecord;
use crate::services::storage::{keys, KeyValueStore, KeyValueStoreExt};

/// Local record of confirmed policies and payments. Stored entries stay
/// untyped JSON, so fields this client does not know survive a commit.
#[derive(Clone)]
pub struct PolicyLedger {
    store: Arc<dyn KeyValueStore>,
}

impl PolicyLedger {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn policies(&self) -> Result<Vec<PolicyRecord>> {
        self.typed(keys::POLICIES)
    }

    /// Payments, newest first.
    pub fn payments(&self) -> Result<Vec<PaymentRecord>> {
        self.typed(keys::PAYMENT_HISTORY)
    }

    /// Entries that do not read as `T` are skipped.
    fn typed<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        let raw: Vec<Value> = self.store.get_list(key)?;
        Ok(raw
            .into_iter()
            .enumerate()
            .filter_map(|(i, entry)| match serde_json::from_value(entry) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping unreadable {} entry {}: {}", key, i, e);
                    None
                }
            })
            .collect())
    }

    /// Appends the policy and prepends the payment in a single store write.
    /// A list that is not a JSON array fails the commit before anything is
    /// written.
    pub fn commit(&self, policy: &PolicyRecord, payment: &PaymentRecord) -> Result<()> {
        let mut policies: Vec<Value> = self.store.get_list(keys::POLICIES)?;
        let mut payments: Vec<Value> = self.store.get_list(keys::PAYMENT_HISTORY)?;

        policies.push(serde_json::to_value(policy)?);
        payments.insert(0, serde_json::to_value(payment)?);

        self.store.set_many(&[
            (keys::POLICIES, serde_json::to_string(&policies)?),
            (keys::PAYMENT_HISTORY, serde_json::to_string(&payments)?),
        ])?;

        info!(
            "Recorded policy {} and payment {} ({} policies, {} payments)",
            policy.id,
            payment.id,
            policies.len(),
            payments.len()
        );
        Ok(())
    }
}
