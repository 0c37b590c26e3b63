use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, Months, Utc};

use crate::errors::{AppError, Result};
use crate::models::policy::PolicyRecord;
use crate::state::AppState;

pub const STATUS_EXPIRED: &str = "Expired";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    Accident,
    Comprehensive,
    ThirdParty,
}

impl PolicyKind {
    pub fn from_name(name: &str) -> Self {
        if name.contains("Basic") {
            PolicyKind::Accident
        } else if name.contains("Comprehensive") {
            PolicyKind::Comprehensive
        } else {
            PolicyKind::ThirdParty
        }
    }

    /// Sum insured in KES.
    pub fn coverage_amount(&self) -> u32 {
        match self {
            PolicyKind::Accident => 50_000,
            PolicyKind::Comprehensive => 150_000,
            PolicyKind::ThirdParty => 75_000,
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PolicyKind::Accident => "Accident",
            PolicyKind::Comprehensive => "Comprehensive",
            PolicyKind::ThirdParty => "Third Party",
        };
        f.write_str(label)
    }
}

/// A stored policy with the fields the policies screen derives from it.
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyView {
    pub record: PolicyRecord,
    pub kind: PolicyKind,
    pub coverage_amount: u32,
    pub expiry_date: DateTime<Utc>,
    pub status: String,
}

impl PolicyView {
    pub fn new(record: PolicyRecord, now: DateTime<Utc>) -> Self {
        let kind = PolicyKind::from_name(&record.name);
        let expiry_date = expiry_date(record.purchase_date, &record.period);
        let status = if expiry_date < now {
            STATUS_EXPIRED.to_string()
        } else {
            record.status.clone()
        };
        Self {
            coverage_amount: kind.coverage_amount(),
            record,
            kind,
            expiry_date,
            status,
        }
    }

    pub fn license_plate(&self) -> Option<&str> {
        self.record
            .motorcycle_details
            .as_ref()
            .map(|m| m.license_plate.as_str())
    }

    fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.record.name.to_lowercase().contains(&query)
            || self.status.to_lowercase().contains(&query)
            || self
                .license_plate()
                .is_some_and(|plate| plate.to_lowercase().contains(&query))
    }
}

/// End of cover for a period label; unknown periods run for a week.
pub fn expiry_date(purchased: DateTime<Utc>, period: &str) -> DateTime<Utc> {
    let expiry = match period {
        "Daily" => purchased.checked_add_days(Days::new(1)),
        "Monthly" => purchased.checked_add_months(Months::new(1)),
        "Annually" => purchased.checked_add_months(Months::new(12)),
        _ => purchased.checked_add_days(Days::new(7)),
    };
    expiry.unwrap_or(purchased)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyTab {
    #[default]
    All,
    Active,
    Expired,
    Pending,
}

impl PolicyTab {
    fn matches(&self, view: &PolicyView) -> bool {
        let status = view.status.to_lowercase();
        match self {
            PolicyTab::All => true,
            PolicyTab::Active => status == "active",
            PolicyTab::Expired => status == "expired",
            PolicyTab::Pending => status == "pending",
        }
    }
}

impl FromStr for PolicyTab {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(PolicyTab::All),
            "active" => Ok(PolicyTab::Active),
            "expired" => Ok(PolicyTab::Expired),
            "pending" => Ok(PolicyTab::Pending),
            other => Err(AppError::invalid_data(format!("Unknown policy tab: {}", other))),
        }
    }
}

pub fn filter_policies(views: Vec<PolicyView>, query: Option<&str>, tab: PolicyTab) -> Vec<PolicyView> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    views
        .into_iter()
        .filter(|view| query.map_or(true, |q| view.matches_query(q)))
        .filter(|view| tab.matches(view))
        .collect()
}

pub fn list_policies(state: &AppState, query: Option<&str>, tab: PolicyTab) -> Result<Vec<PolicyView>> {
    state.require_token()?;

    let now = state.clock.now();
    let views = state
        .ledger()
        .policies()
        .map_err(|e| state.report(e))?
        .into_iter()
        .map(|record| PolicyView::new(record, now))
        .collect();

    Ok(filter_policies(views, query, tab))
}
