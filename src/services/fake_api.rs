// In-process stand-in for the backend, scripted per test.
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::dtos::auth_dtos::{
    RegisterCompleteRequest, RegisterCompleteResponse, RequestOtpRequest, VerifyOtpRequest,
    VerifyOtpResponse, Wallet,
};
use crate::errors::{AppError, Result};
use crate::models::order::{OrderStatusResponse, PurchaseRequest};
use crate::models::premium::Premium;
use crate::models::user::UserProfile;
use crate::services::hima_api::HimaApi;

#[derive(Default)]
pub struct FakeApi {
    buys: Mutex<VecDeque<Result<String>>>,
    statuses: Mutex<VecDeque<Result<OrderStatusResponse>>>,
    user: Mutex<Option<Result<UserProfile>>>,
    premiums: Mutex<Option<Vec<Premium>>>,
    otp_failure: Mutex<Option<AppError>>,
    logout_failure: Mutex<Option<AppError>>,
    buy_requests: Mutex<Vec<PurchaseRequest>>,
    status_calls: AtomicUsize,
    otp_calls: AtomicUsize,
    logout_calls: AtomicUsize,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_buy(self, result: Result<String>) -> Self {
        self.buys.lock().unwrap().push_back(result);
        self
    }

    pub fn with_statuses(self, statuses: Vec<Result<OrderStatusResponse>>) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    pub fn with_user(self, user: Result<UserProfile>) -> Self {
        *self.user.lock().unwrap() = Some(user);
        self
    }

    pub fn with_premiums(self, premiums: Vec<Premium>) -> Self {
        *self.premiums.lock().unwrap() = Some(premiums);
        self
    }

    pub fn with_otp_failure(self, err: AppError) -> Self {
        *self.otp_failure.lock().unwrap() = Some(err);
        self
    }

    pub fn with_logout_failure(self, err: AppError) -> Self {
        *self.logout_failure.lock().unwrap() = Some(err);
        self
    }

    pub fn buy_calls(&self) -> usize {
        self.buy_requests.lock().unwrap().len()
    }

    pub fn buy_requests(&self) -> Vec<PurchaseRequest> {
        self.buy_requests.lock().unwrap().clone()
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn otp_calls(&self) -> usize {
        self.otp_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }
}

fn replay(err: &AppError) -> AppError {
    match err {
        AppError::ApiError { status, message } => AppError::api(*status, message.clone()),
        other => AppError::HttpClientError(other.to_string()),
    }
}

#[async_trait]
impl HimaApi for FakeApi {
    async fn request_otp(&self, _req: &RequestOtpRequest) -> Result<()> {
        self.otp_calls.fetch_add(1, Ordering::SeqCst);
        match self.otp_failure.lock().unwrap().as_ref() {
            Some(err) => Err(replay(err)),
            None => Ok(()),
        }
    }

    async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<VerifyOtpResponse> {
        self.otp_calls.fetch_add(1, Ordering::SeqCst);
        match self.otp_failure.lock().unwrap().as_ref() {
            Some(err) => Err(replay(err)),
            None => Ok(VerifyOtpResponse {
                token: format!("jwt-{}", req.otp),
            }),
        }
    }

    async fn register_complete(&self, _req: &RegisterCompleteRequest) -> Result<RegisterCompleteResponse> {
        Ok(RegisterCompleteResponse {
            wallet: Wallet {
                address: "0x1234567890abcdef1234567890abcdef12345678".into(),
            },
        })
    }

    async fn get_user(&self, _token: &str) -> Result<UserProfile> {
        match self.user.lock().unwrap().as_ref() {
            Some(Ok(user)) => Ok(user.clone()),
            Some(Err(err)) => Err(replay(err)),
            None => Err(AppError::api(Some(404), Some("User not found".into()))),
        }
    }

    async fn get_premiums(&self, _token: &str) -> Result<Vec<Premium>> {
        Ok(self.premiums.lock().unwrap().clone().unwrap_or_default())
    }

    async fn buy_insurance(&self, _token: &str, req: &PurchaseRequest) -> Result<String> {
        self.buy_requests.lock().unwrap().push(req.clone());
        self.buys
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("ORD1".to_string()))
    }

    async fn policy_status(&self, _token: &str, _order_id: &str) -> Result<OrderStatusResponse> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::HttpClientError("no scripted status".into())))
    }

    async fn logout(&self, _token: &str) -> Result<()> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        match self.logout_failure.lock().unwrap().as_ref() {
            Some(err) => Err(replay(err)),
            None => Ok(()),
        }
    }
}
