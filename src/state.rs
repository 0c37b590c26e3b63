use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use crate::events::UiEvents;
use crate::routes::Route;
use crate::services::clock::{Clock, SystemClock};
use crate::services::hima_api::HimaApi;
use crate::services::ledger::PolicyLedger;
use crate::services::purchase_service::PurchaseService;
use crate::services::storage::{keys, KeyValueStore, KeyValueStoreExt};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub api: Arc<dyn HimaApi>,
    pub store: Arc<dyn KeyValueStore>,
    pub clock: Arc<dyn Clock>,
    pub events: UiEvents,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        api: Arc<dyn HimaApi>,
        store: Arc<dyn KeyValueStore>,
        events: UiEvents,
    ) -> Self {
        AppState {
            config,
            api,
            store,
            clock: Arc::new(SystemClock),
            events,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ledger(&self) -> PolicyLedger {
        PolicyLedger::new(self.store.clone())
    }

    pub fn purchase_service(&self) -> PurchaseService {
        PurchaseService::new(
            self.api.clone(),
            self.ledger(),
            self.clock.clone(),
            self.config.poll,
        )
    }

    pub fn token(&self) -> Result<Option<String>> {
        self.store.get_text(keys::TOKEN)
    }

    /// The session token, or a redirect to signup when there is none.
    pub fn require_token(&self) -> Result<String> {
        match self.token()? {
            Some(token) => Ok(token),
            None => {
                self.events.navigate(Route::Signup);
                Err(AppError::Unauthenticated)
            }
        }
    }

    /// Emits the rider-facing text of `err` and hands it back.
    pub fn report(&self, err: AppError) -> AppError {
        self.events.error(err.user_message());
        err
    }
}
