use serde::Serialize;

use crate::errors::Result;
use crate::models::payment::{PaymentRecord, PaymentStatus};
use crate::models::policy::PolicyRecord;
use crate::state::AppState;

const MILESTONE_STEP: f64 = 1000.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub amount: f64,
    pub benefit: String,
    /// Percent of the way to `amount`.
    pub progress: f64,
}

/// Rewards accumulated from the rider's payment history.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundingStats {
    pub total_paid: f64,
    pub savings_from_long_term: f64,
    pub loyalty_bonus: f64,
    /// Whole percent added to cover, 2 for every KES 500 paid.
    pub coverage_increase: u32,
    pub next_milestone: Milestone,
}

pub fn compounding_stats(policies: &[PolicyRecord], payments: &[PaymentRecord]) -> CompoundingStats {
    let total_paid: f64 = payments
        .iter()
        .filter(|p| p.status == PaymentStatus::Successful)
        .map(|p| p.amount)
        .sum();

    let savings_from_long_term = policies
        .iter()
        .map(|policy| match policy.period.as_str() {
            "Monthly" => policy.price * 0.05,
            "Annually" => policy.price * 0.2,
            _ => 0.0,
        })
        .sum();

    // One bonus percent per four payments.
    let loyalty_bonus = total_paid * 0.01 * (payments.len() / 4) as f64;
    let coverage_increase = (total_paid / 500.0).floor() as u32 * 2;

    let milestone = if total_paid > 0.0 {
        (total_paid / MILESTONE_STEP).ceil() * MILESTONE_STEP
    } else {
        MILESTONE_STEP
    };

    CompoundingStats {
        total_paid,
        savings_from_long_term,
        loyalty_bonus,
        coverage_increase,
        next_milestone: Milestone {
            amount: milestone,
            benefit: format!("{}% coverage increase", (milestone / 500.0).floor() as u32 * 2),
            progress: total_paid / milestone * 100.0,
        },
    }
}

/// Payment history as stored, newest first.
pub fn payment_history(state: &AppState) -> Result<Vec<PaymentRecord>> {
    state.require_token()?;
    state.ledger().payments().map_err(|e| state.report(e))
}

pub fn benefits(state: &AppState) -> Result<CompoundingStats> {
    state.require_token()?;
    let ledger = state.ledger();
    let policies = ledger.policies().map_err(|e| state.report(e))?;
    let payments = ledger.payments().map_err(|e| state.report(e))?;
    Ok(compounding_stats(&policies, &payments))
}
