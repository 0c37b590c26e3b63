// services/hima_api.rs
use async_trait::async_trait;
use reqwest::{header, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::dtos::auth_dtos::{
    ErrorBody, RegisterCompleteRequest, RegisterCompleteResponse, RequestOtpRequest,
    VerifyOtpRequest, VerifyOtpResponse,
};
use crate::errors::{AppError, Result};
use crate::models::order::{BuyInsuranceBody, BuyInsuranceResponse, OrderStatusResponse, PurchaseRequest};
use crate::models::premium::{Premium, PremiumsResponse};
use crate::models::user::UserProfile;

/// The remote Hima backend. Errors carry the HTTP status and the body's
/// `message` as [`AppError::ApiError`]; transport failures are
/// [`AppError::HttpClientError`].
#[async_trait]
pub trait HimaApi: Send + Sync {
    async fn request_otp(&self, req: &RequestOtpRequest) -> Result<()>;
    async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<VerifyOtpResponse>;
    async fn register_complete(&self, req: &RegisterCompleteRequest) -> Result<RegisterCompleteResponse>;
    async fn get_user(&self, token: &str) -> Result<UserProfile>;
    async fn get_premiums(&self, token: &str) -> Result<Vec<Premium>>;
    /// Succeeds only on `202 Accepted`, returning the order id.
    async fn buy_insurance(&self, token: &str, req: &PurchaseRequest) -> Result<String>;
    async fn policy_status(&self, token: &str, order_id: &str) -> Result<OrderStatusResponse>;
    async fn logout(&self, token: &str) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct HttpHimaApi {
    config: AppConfig,
    client: Client,
}

impl HttpHimaApi {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(HttpHimaApi { config, client })
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {}", token)
    }

    async fn error_from(response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        error!("Backend returned {} - {}", status, body);
        AppError::api(Some(status.as_u16()), parsed.message)
    }

    async fn json_or_error<T: DeserializeOwned>(response: Response) -> Result<T> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(response.json::<T>().await?)
    }

    async fn unit_or_error(response: Response) -> Result<()> {
        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }
        Ok(())
    }
}

#[async_trait]
impl HimaApi for HttpHimaApi {
    async fn request_otp(&self, req: &RequestOtpRequest) -> Result<()> {
        info!("Requesting OTP for {}", req.phone);
        let response = self
            .client
            .post(self.config.endpoint("/auth/request-otp"))
            .json(req)
            .send()
            .await?;
        Self::unit_or_error(response).await
    }

    async fn verify_otp(&self, req: &VerifyOtpRequest) -> Result<VerifyOtpResponse> {
        info!("Verifying OTP for {}", req.phone);
        let response = self
            .client
            .post(self.config.endpoint("/auth/verify-otp"))
            .json(req)
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn register_complete(&self, req: &RegisterCompleteRequest) -> Result<RegisterCompleteResponse> {
        info!("Completing registration for {}", req.phone);
        let response = self
            .client
            .post(self.config.endpoint("/auth/register-complete"))
            .json(req)
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn get_user(&self, token: &str) -> Result<UserProfile> {
        let response = self
            .client
            .get(self.config.endpoint("/auth/get-user"))
            .header(header::AUTHORIZATION, Self::bearer(token))
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn get_premiums(&self, token: &str) -> Result<Vec<Premium>> {
        let response = self
            .client
            .get(self.config.endpoint("/policies/get-premiums"))
            .header(header::AUTHORIZATION, Self::bearer(token))
            .send()
            .await?;
        let body: PremiumsResponse = Self::json_or_error(response).await?;
        info!("Fetched {} premiums", body.premiums.len());
        Ok(body.premiums)
    }

    async fn buy_insurance(&self, token: &str, req: &PurchaseRequest) -> Result<String> {
        info!(
            "Buying premium {} for {} - KES {} ({})",
            req.premium_id,
            req.phone,
            req.amount,
            req.duration.as_duration()
        );

        let response = self
            .client
            .post(self.config.endpoint("/policies/buy-insurance"))
            .header(header::AUTHORIZATION, Self::bearer(token))
            .json(&BuyInsuranceBody::from(req))
            .send()
            .await?;

        if response.status() != StatusCode::ACCEPTED {
            return Err(Self::error_from(response).await);
        }

        let accepted: BuyInsuranceResponse = response.json().await?;
        info!("Purchase accepted, order {}", accepted.order_id);
        Ok(accepted.order_id)
    }

    async fn policy_status(&self, token: &str, order_id: &str) -> Result<OrderStatusResponse> {
        let response = self
            .client
            .get(self.config.endpoint(&format!("/policies/status/{}", order_id)))
            .header(header::AUTHORIZATION, Self::bearer(token))
            .send()
            .await?;
        Self::json_or_error(response).await
    }

    async fn logout(&self, token: &str) -> Result<()> {
        let response = self
            .client
            .post(self.config.endpoint("/logout"))
            .header(header::AUTHORIZATION, Self::bearer(token))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if let Err(e) = Self::unit_or_error(response).await {
            warn!("Logout call failed: {}", e);
            return Err(e);
        }
        Ok(())
    }
}
