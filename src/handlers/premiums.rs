use tracing::info;

use crate::errors::{AppError, Result};
use crate::models::premium::{calculate_price, Frequency, Premium, SelectedPremium};
use crate::routes::Route;
use crate::services::storage::{keys, KeyValueStoreExt};
use crate::state::AppState;

/// A plan priced for one billing frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct PremiumQuote {
    pub premium: Premium,
    pub frequency: Frequency,
    pub price: f64,
}

impl PremiumQuote {
    pub fn new(premium: Premium, frequency: Frequency) -> Self {
        let price = calculate_price(premium.base_price, frequency);
        Self {
            premium,
            frequency,
            price,
        }
    }

    pub fn savings_badge(&self) -> Option<&'static str> {
        self.frequency.savings_badge()
    }
}

pub async fn list_premiums(state: &AppState, frequency: Frequency) -> Result<Vec<PremiumQuote>> {
    let token = state.require_token()?;

    let premiums = state
        .api
        .get_premiums(&token)
        .await
        .map_err(|e| state.report(e.or_message("Failed to fetch premiums")))?;

    Ok(premiums
        .into_iter()
        .map(|premium| PremiumQuote::new(premium, frequency))
        .collect())
}

/// Stores the plan as the current selection and moves on to the purchase
/// screen. Without a session the rider is sent to signup instead.
pub fn select_premium(
    state: &AppState,
    premium: &Premium,
    frequency: Frequency,
) -> Result<SelectedPremium> {
    state.require_token()?;
    let selected = SelectedPremium::from_premium(premium, frequency);
    state.store.set_json(keys::SELECTED_PREMIUM, &selected)?;
    info!(
        "Selected {} ({}) at KES {}",
        selected.id, selected.period, selected.price
    );
    state.events.navigate(Route::Purchase);
    Ok(selected)
}

/// Looks the plan up in the current catalog, then selects it.
pub async fn select_premium_by_id(
    state: &AppState,
    premium_id: &str,
    frequency: Frequency,
) -> Result<SelectedPremium> {
    let quotes = list_premiums(state, frequency).await?;
    let quote = quotes
        .into_iter()
        .find(|q| q.premium.id == premium_id)
        .ok_or_else(|| state.report(AppError::invalid_data(format!("Unknown premium: {}", premium_id))))?;
    select_premium(state, &quote.premium, frequency)
}
