use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::premium::SelectedPremium;
use crate::models::user::MotorcycleDetails;
use crate::routes::Route;
use crate::services::purchase_service::Confirmation;
use crate::services::storage::{keys, KeyValueStoreExt};
use crate::state::AppState;

pub const STK_PUSH_SENT: &str = "Please complete the M-Pesa payment on your phone.";
pub const USER_FETCH_FAILED: &str = "Failed to fetch user data. Using cached data if available.";

/// The purchase screen for one visit. Dropping it cancels any pending
/// status check and the redirect that follows a confirmation.
pub struct PurchaseScreen {
    state: AppState,
    token: String,
    premium: SelectedPremium,
    phone: Option<String>,
    motorcycle: Option<MotorcycleDetails>,
    cancel: CancellationToken,
    in_flight: AtomicBool,
    _exit: DropGuard,
}

impl PurchaseScreen {
    /// Loads the session and the selected plan, then prefills the rider's
    /// details. Returns `None` after redirecting when either is missing.
    pub async fn open(state: AppState) -> Result<Option<Self>> {
        let token = match state.token()? {
            Some(token) => token,
            None => {
                state.events.navigate(Route::Signup);
                return Ok(None);
            }
        };

        let premium = match state.store.get_json::<SelectedPremium>(keys::SELECTED_PREMIUM) {
            Ok(Some(premium)) => premium,
            Ok(None) => {
                state.events.navigate(Route::Premiums);
                return Ok(None);
            }
            Err(e) => {
                warn!("Unreadable selected premium, sending rider back: {}", e);
                state.events.navigate(Route::Premiums);
                return Ok(None);
            }
        };

        let (phone, motorcycle) = Self::prefill(&state, &token).await?;

        let cancel = CancellationToken::new();
        let exit = cancel.clone().drop_guard();

        Ok(Some(Self {
            state,
            token,
            premium,
            phone,
            motorcycle,
            cancel,
            in_flight: AtomicBool::new(false),
            _exit: exit,
        }))
    }

    async fn prefill(
        state: &AppState,
        token: &str,
    ) -> Result<(Option<String>, Option<MotorcycleDetails>)> {
        match state.api.get_user(token).await {
            Ok(user) => {
                state.store.set(keys::PHONE_NUMBER, &user.phone)?;
                if let Some(motorcycle) = &user.motorcycle {
                    state.store.set_json(keys::MOTORCYCLE_DETAILS, motorcycle)?;
                }
                Ok((Some(user.phone), user.motorcycle))
            }
            Err(e) => {
                warn!("Failed to fetch user data: {}", e);
                state.events.error(USER_FETCH_FAILED);
                let phone = state.store.get_text(keys::PHONE_NUMBER)?;
                let motorcycle = state
                    .store
                    .get_json::<MotorcycleDetails>(keys::MOTORCYCLE_DETAILS)
                    .unwrap_or_else(|e| {
                        warn!("Ignoring unreadable motorcycle details: {}", e);
                        None
                    });
                Ok((phone, motorcycle))
            }
        }
    }

    pub fn premium(&self) -> &SelectedPremium {
        &self.premium
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn motorcycle(&self) -> Option<&MotorcycleDetails> {
        self.motorcycle.as_ref()
    }

    /// A handle that stops this visit's polling, as leaving the screen does.
    pub fn cancel_handle(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Buys the selected plan and waits for the payment to settle. One
    /// purchase at a time per visit.
    pub async fn buy(&self) -> Result<Confirmation> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(AppError::invalid_data("A purchase is already in progress"));
        }
        let _reset = InFlight(&self.in_flight);
        self.run_purchase().await
    }

    async fn run_purchase(&self) -> Result<Confirmation> {
        let service = self.state.purchase_service();
        let events = &self.state.events;

        let order_id = service
            .initiate(&self.token, Some(&self.premium), self.phone.as_deref())
            .await
            .map_err(|e| self.state.report(e))?;

        events.info(STK_PUSH_SENT);

        let confirmation = match service
            .confirm(
                &self.token,
                &order_id,
                &self.premium,
                self.motorcycle.as_ref(),
                &self.cancel,
            )
            .await
        {
            Ok(confirmation) => confirmation,
            Err(AppError::PollingCancelled) => return Err(AppError::PollingCancelled),
            Err(e) => return Err(self.state.report(e)),
        };

        events.success(format!(
            "You have successfully purchased {} insurance for KES {}.",
            self.premium.name, self.premium.price
        ));

        let delay = service.settings().redirect_delay;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                info!("Left purchase screen before redirect");
            }
            _ = self.state.clock.sleep(delay) => {
                events.navigate(Route::Policies);
            }
        }

        Ok(confirmation)
    }
}

/// Clears the in-flight flag however `buy` ends, including when its future
/// is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
