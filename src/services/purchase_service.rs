// services/purchase_service.rs
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::PollSettings;
use crate::errors::{AppError, Result, INITIATE_FAILED};
use crate::models::order::{OrderStatus, OrderStatusResponse, PurchaseRequest};
use crate::models::payment::PaymentRecord;
use crate::models::policy::PolicyRecord;
use crate::models::premium::SelectedPremium;
use crate::models::user::MotorcycleDetails;
use crate::services::clock::Clock;
use crate::services::hima_api::HimaApi;
use crate::services::ledger::PolicyLedger;

pub const MISSING_SELECTION: &str = "Missing premium or phone number";

/// Where the confirmation loop for one order stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Polling { attempts: u32 },
    Confirmed,
    Rejected,
    TimedOut,
    Cancelled,
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollState::Polling { .. })
    }
}

/// What the driver must do after one status observation.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Still pending; check again after the delay.
    Wait(Duration),
    Confirmed(OrderStatusResponse),
    Rejected,
    TimedOut { attempts: u32 },
    TransportFailed(String),
}

/// Bounded status-polling state machine for a single order. It performs no
/// I/O; feed it each status result with [`StatusPoller::observe`].
#[derive(Debug, Clone)]
pub struct StatusPoller {
    order_id: String,
    settings: PollSettings,
    state: PollState,
    checks: u32,
}

impl StatusPoller {
    pub fn new(order_id: impl Into<String>, settings: PollSettings) -> Self {
        Self {
            order_id: order_id.into(),
            settings,
            state: PollState::Polling { attempts: 0 },
            checks: 0,
        }
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    /// Status requests observed so far.
    pub fn checks(&self) -> u32 {
        self.checks
    }

    /// Applies one status result. Returns `None` once the poller is terminal,
    /// so a late or duplicated response can never trigger a second step.
    pub fn observe(&mut self, observed: Result<OrderStatusResponse>) -> Option<PollStep> {
        let PollState::Polling { attempts } = self.state else {
            warn!(
                "Ignoring status for order {} in state {:?}",
                self.order_id, self.state
            );
            return None;
        };
        self.checks += 1;

        let response = match observed {
            Ok(response) => response,
            Err(e) => {
                error!("Status check {} for order {} failed: {}", self.checks, self.order_id, e);
                self.state = PollState::Rejected;
                return Some(PollStep::TransportFailed(e.to_string()));
            }
        };

        match response.status {
            OrderStatus::Active => {
                info!("Order {} active after {} checks", self.order_id, self.checks);
                self.state = PollState::Confirmed;
                Some(PollStep::Confirmed(response))
            }
            OrderStatus::Failed => {
                warn!("Order {} failed after {} checks", self.order_id, self.checks);
                self.state = PollState::Rejected;
                Some(PollStep::Rejected)
            }
            OrderStatus::Pending | OrderStatus::Unknown => {
                if response.status == OrderStatus::Unknown {
                    warn!("Order {} reported an unknown status, still waiting", self.order_id);
                }
                let attempts = attempts + 1;
                if attempts < self.settings.max_attempts {
                    self.state = PollState::Polling { attempts };
                    Some(PollStep::Wait(self.settings.interval))
                } else {
                    warn!("Order {} still pending after {} checks", self.order_id, attempts);
                    self.state = PollState::TimedOut;
                    Some(PollStep::TimedOut { attempts })
                }
            }
        }
    }

    /// Stops a poller that has not reached a terminal state yet.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            info!("Polling for order {} cancelled", self.order_id);
            self.state = PollState::Cancelled;
        }
    }
}

/// The records written when an order is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    pub policy: PolicyRecord,
    pub payment: PaymentRecord,
}

/// Checks a selection and turns it into a buy request; no network involved.
pub fn build_purchase_request(
    premium: Option<&SelectedPremium>,
    phone: Option<&str>,
) -> Result<PurchaseRequest> {
    let (premium, phone) = match (premium, phone.map(str::trim)) {
        (Some(premium), Some(phone)) if !phone.is_empty() => (premium, phone),
        _ => return Err(AppError::invalid_data(MISSING_SELECTION)),
    };

    if !premium.price.is_finite() || premium.price <= 0.0 {
        return Err(AppError::invalid_data("Premium price must be greater than 0"));
    }

    Ok(PurchaseRequest {
        phone: phone.trim_start_matches('+').to_string(),
        amount: premium.price,
        premium_id: premium.id.clone(),
        duration: premium.period,
    })
}

#[derive(Clone)]
pub struct PurchaseService {
    api: Arc<dyn HimaApi>,
    ledger: PolicyLedger,
    clock: Arc<dyn Clock>,
    settings: PollSettings,
}

impl PurchaseService {
    pub fn new(
        api: Arc<dyn HimaApi>,
        ledger: PolicyLedger,
        clock: Arc<dyn Clock>,
        settings: PollSettings,
    ) -> Self {
        Self {
            api,
            ledger,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> PollSettings {
        self.settings
    }

    /// Submits the buy request and returns the accepted order id. Never
    /// retried; any failure is a [`AppError::RequestError`].
    pub async fn initiate(
        &self,
        token: &str,
        premium: Option<&SelectedPremium>,
        phone: Option<&str>,
    ) -> Result<String> {
        let request = build_purchase_request(premium, phone)?;

        self.api
            .buy_insurance(token, &request)
            .await
            .map_err(|e| {
                error!("Purchase of {} failed: {}", request.premium_id, e);
                AppError::RequestError(e.message_or(INITIATE_FAILED))
            })
    }

    /// Polls the order until it settles, the attempt budget runs out, or
    /// `cancel` fires between checks. Records are committed only on the
    /// first `Active` observation.
    pub async fn confirm(
        &self,
        token: &str,
        order_id: &str,
        premium: &SelectedPremium,
        motorcycle: Option<&MotorcycleDetails>,
        cancel: &CancellationToken,
    ) -> Result<Confirmation> {
        let mut poller = StatusPoller::new(order_id, self.settings);
        info!(
            "Polling order {} every {:?}, at most {} times",
            order_id, self.settings.interval, self.settings.max_attempts
        );

        loop {
            if cancel.is_cancelled() {
                poller.cancel();
                return Err(AppError::PollingCancelled);
            }

            let observed = self.api.policy_status(token, order_id).await;

            match poller.observe(observed) {
                Some(PollStep::Wait(delay)) => {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            poller.cancel();
                            return Err(AppError::PollingCancelled);
                        }
                        _ = self.clock.sleep(delay) => {}
                    }
                }
                Some(PollStep::Confirmed(status)) => {
                    let at = self.clock.now();
                    let policy = PolicyRecord::confirmed(order_id, premium, motorcycle, &status, at);
                    let payment = PaymentRecord::successful(order_id, premium, at);
                    self.ledger.commit(&policy, &payment)?;
                    return Ok(Confirmation { policy, payment });
                }
                Some(PollStep::Rejected) => return Err(AppError::BackendRejected),
                Some(PollStep::TimedOut { attempts }) => {
                    return Err(AppError::PollingTimeout { attempts })
                }
                Some(PollStep::TransportFailed(reason)) => {
                    return Err(AppError::PollingTransportError(reason))
                }
                None => return Err(AppError::PollingCancelled),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::premium::Frequency;
    use crate::services::clock::ManualClock;
    use crate::services::fake_api::FakeApi;
    use crate::services::storage::MemoryStore;

    fn settings() -> PollSettings {
        PollSettings::default()
    }

    fn pending() -> Result<OrderStatusResponse> {
        Ok(OrderStatusResponse::with_status(OrderStatus::Pending))
    }

    fn active() -> Result<OrderStatusResponse> {
        Ok(OrderStatusResponse {
            status: OrderStatus::Active,
            transaction_hash: Some("0xabc".into()),
            explorer_link: Some("https://explorer.test/tx/0xabc".into()),
        })
    }

    fn comprehensive() -> SelectedPremium {
        SelectedPremium {
            id: "comprehensive".into(),
            name: "Comprehensive".into(),
            description: String::new(),
            price: 150.0,
            period: Frequency::Weekly,
            coverages: vec![],
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        ledger: PolicyLedger,
        clock: Arc<ManualClock>,
        service: PurchaseService,
    }

    fn harness(api: FakeApi) -> Harness {
        let api = Arc::new(api);
        let ledger = PolicyLedger::new(Arc::new(MemoryStore::new()));
        let clock = Arc::new(ManualClock::default());
        let service = PurchaseService::new(api.clone(), ledger.clone(), clock.clone(), settings());
        Harness {
            api,
            ledger,
            clock,
            service,
        }
    }

    #[test]
    fn poller_times_out_on_the_last_attempt() {
        let mut poller = StatusPoller::new("ORD1", settings());
        for _ in 0..11 {
            assert_eq!(poller.observe(pending()), Some(PollStep::Wait(Duration::from_secs(5))));
        }
        assert_eq!(poller.observe(pending()), Some(PollStep::TimedOut { attempts: 12 }));
        assert_eq!(poller.state(), PollState::TimedOut);
        assert_eq!(poller.checks(), 12);
    }

    #[test]
    fn poller_ignores_everything_after_a_terminal_state() {
        let mut poller = StatusPoller::new("ORD1", settings());
        assert!(matches!(poller.observe(active()), Some(PollStep::Confirmed(_))));
        assert_eq!(poller.observe(active()), None);
        assert_eq!(poller.observe(pending()), None);
        assert_eq!(poller.checks(), 1);

        poller.cancel();
        assert_eq!(poller.state(), PollState::Confirmed);
    }

    #[test]
    fn poller_stops_on_failed_and_transport_errors() {
        let mut failed = StatusPoller::new("ORD1", settings());
        failed.observe(pending());
        assert_eq!(
            failed.observe(Ok(OrderStatusResponse::with_status(OrderStatus::Failed))),
            Some(PollStep::Rejected)
        );
        assert_eq!(failed.state(), PollState::Rejected);

        let mut broken = StatusPoller::new("ORD1", settings());
        let step = broken.observe(Err(AppError::HttpClientError("connection refused".into())));
        assert!(matches!(step, Some(PollStep::TransportFailed(_))));
        assert!(broken.state().is_terminal());
    }

    #[test]
    fn unknown_status_counts_as_pending() {
        let mut poller = StatusPoller::new("ORD1", PollSettings { max_attempts: 2, ..settings() });
        let unknown = || Ok(OrderStatusResponse::with_status(OrderStatus::Unknown));
        assert!(matches!(poller.observe(unknown()), Some(PollStep::Wait(_))));
        assert_eq!(poller.observe(unknown()), Some(PollStep::TimedOut { attempts: 2 }));
    }

    #[test]
    fn selection_is_required_before_any_request() {
        let premium = comprehensive();
        for (p, phone) in [
            (None, Some("254712345678")),
            (Some(&premium), None),
            (Some(&premium), Some("  ")),
        ] {
            let err = build_purchase_request(p, phone).unwrap_err();
            assert_eq!(err.user_message(), MISSING_SELECTION);
        }

        let free = SelectedPremium { price: 0.0, ..comprehensive() };
        assert!(matches!(
            build_purchase_request(Some(&free), Some("254712345678")),
            Err(AppError::ValidationError(_))
        ));

        let req = build_purchase_request(Some(&premium), Some("+254712345678")).unwrap();
        assert_eq!(req.phone, "254712345678");
        assert_eq!(req.amount, 150.0);
        assert_eq!(req.duration, Frequency::Weekly);
    }

    #[tokio::test]
    async fn missing_selection_makes_no_network_call() {
        let h = harness(FakeApi::new());
        let err = h.service.initiate("jwt", None, Some("254712345678")).await.unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(h.api.buy_calls(), 0);
    }

    #[tokio::test]
    async fn initiation_failure_uses_backend_message_or_generic() {
        let h = harness(
            FakeApi::new()
                .with_buy(Err(AppError::api(Some(400), Some("Invalid phone".into()))))
                .with_buy(Err(AppError::HttpClientError("timeout".into()))),
        );
        let premium = comprehensive();

        let first = h
            .service
            .initiate("jwt", Some(&premium), Some("254712345678"))
            .await
            .unwrap_err();
        assert_eq!(first.user_message(), "Invalid phone");

        let second = h
            .service
            .initiate("jwt", Some(&premium), Some("254712345678"))
            .await
            .unwrap_err();
        assert_eq!(second.user_message(), INITIATE_FAILED);
        assert_eq!(h.api.buy_calls(), 2);
    }

    #[tokio::test]
    async fn active_on_nth_poll_records_once_and_stops() {
        for n in [1usize, 5, 12] {
            let mut statuses: Vec<Result<OrderStatusResponse>> = (1..n).map(|_| pending()).collect();
            statuses.push(active());
            statuses.push(active());
            let h = harness(FakeApi::new().with_statuses(statuses));

            let confirmation = h
                .service
                .confirm("jwt", "ORD1", &comprehensive(), None, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(h.api.status_calls(), n);
            assert_eq!(h.clock.sleeps().len(), n - 1);
            assert_eq!(h.ledger.policies().unwrap(), vec![confirmation.policy.clone()]);
            assert_eq!(h.ledger.payments().unwrap(), vec![confirmation.payment.clone()]);
        }
    }

    #[tokio::test]
    async fn twelve_pending_polls_time_out_without_records() {
        let h = harness(FakeApi::new().with_statuses((0..20).map(|_| pending()).collect()));

        let err = h
            .service
            .confirm("jwt", "ORD1", &comprehensive(), None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PollingTimeout { attempts: 12 }));
        assert_eq!(h.api.status_calls(), 12);
        assert_eq!(h.clock.elapsed(), Duration::from_secs(55));
        assert!(h.ledger.policies().unwrap().is_empty());
        assert!(h.ledger.payments().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_at_k_stops_at_k() {
        let h = harness(FakeApi::new().with_statuses(vec![
            pending(),
            pending(),
            Ok(OrderStatusResponse::with_status(OrderStatus::Failed)),
            active(),
        ]));

        let err = h
            .service
            .confirm("jwt", "ORD1", &comprehensive(), None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::BackendRejected));
        assert_eq!(h.api.status_calls(), 3);
        assert!(h.ledger.policies().unwrap().is_empty());
    }

    #[tokio::test]
    async fn transport_error_is_not_retried() {
        let h = harness(FakeApi::new().with_statuses(vec![
            pending(),
            Err(AppError::HttpClientError("connection reset".into())),
            active(),
        ]));

        let err = h
            .service
            .confirm("jwt", "ORD1", &comprehensive(), None, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PollingTransportError(_)));
        assert_eq!(h.api.status_calls(), 2);
        assert!(h.ledger.payments().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_before_start_makes_no_request() {
        let h = harness(FakeApi::new().with_statuses(vec![active()]));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h
            .service
            .confirm("jwt", "ORD1", &comprehensive(), None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::PollingCancelled));
        assert_eq!(h.api.status_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_the_wait_between_polls() {
        let api = Arc::new(FakeApi::new().with_statuses(vec![pending(), active()]));
        let ledger = PolicyLedger::new(Arc::new(MemoryStore::new()));
        let service = PurchaseService::new(
            api.clone(),
            ledger.clone(),
            Arc::new(crate::services::clock::SystemClock),
            settings(),
        );
        let cancel = CancellationToken::new();

        let task = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                service
                    .confirm("jwt", "ORD1", &comprehensive(), None, &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_secs(2)).await;
        cancel.cancel();

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, AppError::PollingCancelled));
        assert_eq!(api.status_calls(), 1);
        assert!(ledger.policies().unwrap().is_empty());
    }

    #[tokio::test]
    async fn confirmation_timestamps_come_from_the_clock() {
        let h = harness(FakeApi::new().with_statuses(vec![pending(), active()]));
        let started = h.clock.now();

        let confirmation = h
            .service
            .confirm("jwt", "ORD1", &comprehensive(), None, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            confirmation.policy.purchase_date,
            started + chrono::Duration::seconds(5)
        );
        assert_eq!(confirmation.payment.date, confirmation.policy.purchase_date);
        assert!((confirmation.policy.price - 148.5).abs() < 1e-9);
        assert_eq!(confirmation.payment.amount, 150.0);
    }
}
