use tracing::info;

use crate::errors::Result;
use crate::models::user::{format_wallet_address, MotorcycleDetails};
use crate::services::storage::{keys, KeyValueStoreExt};
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub phone: String,
    pub wallet_address: Option<String>,
    pub motorcycle: Option<MotorcycleDetails>,
}

impl ProfileView {
    pub fn wallet_display(&self) -> String {
        format_wallet_address(self.wallet_address.as_deref())
    }
}

/// Fetches the signed-in rider and refreshes the cached wallet address.
pub async fn fetch_profile(state: &AppState) -> Result<ProfileView> {
    let token = state.require_token()?;

    let user = state
        .api
        .get_user(&token)
        .await
        .map_err(|e| state.report(e.or_message("Failed to fetch user data")))?;

    if let Some(address) = &user.wallet_address {
        state.store.set(keys::WALLET_ADDRESS, address)?;
    }
    if let Some(motorcycle) = &user.motorcycle {
        state.store.set_json(keys::MOTORCYCLE_DETAILS, motorcycle)?;
    }
    info!("Loaded profile for {}", user.phone);

    Ok(ProfileView {
        phone: user.phone,
        wallet_address: user.wallet_address,
        motorcycle: user.motorcycle,
    })
}
