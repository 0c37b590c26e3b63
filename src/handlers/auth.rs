use std::time::Duration;

use tracing::{info, warn};
use validator::Validate;

use crate::dtos::auth_dtos::{
    engine_capacity_cc, MotorcycleForm, MotorcycleRegistration, RegisterCompleteRequest,
    RequestOtpRequest, VerifyOtpRequest,
};
use crate::errors::Result;
use crate::models::user::MotorcycleDetails;
use crate::routes::Route;
use crate::services::msisdn::{format_phone_number, to_wire};
use crate::services::storage::{keys, KeyValueStoreExt};
use crate::state::AppState;

/// Pause between the registration confirmation and the premiums screen.
pub const REGISTRATION_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Signup,
    Login,
}

/// Sends an OTP to the rider's phone. Returns the normalised MSISDN.
pub async fn request_otp(state: &AppState, phone_input: &str) -> Result<String> {
    let msisdn = format_phone_number(phone_input);
    let req = RequestOtpRequest {
        phone: to_wire(&msisdn),
        msisdn: msisdn.clone(),
    };
    req.validate().map_err(|e| state.report(e.into()))?;

    state
        .api
        .request_otp(&req)
        .await
        .map_err(|e| state.report(e.or_message("Failed to request OTP")))?;

    info!("OTP sent to {}", req.phone);
    Ok(msisdn)
}

/// Verifies the OTP and starts a session. Login goes straight to the
/// premiums screen; signup continues with the motorcycle step.
pub async fn verify_otp(state: &AppState, phone_input: &str, otp: &str, mode: AuthMode) -> Result<()> {
    let msisdn = format_phone_number(phone_input);
    let req = VerifyOtpRequest {
        phone: to_wire(&msisdn),
        msisdn: msisdn.clone(),
        otp: otp.trim().to_string(),
    };
    req.validate().map_err(|e| state.report(e.into()))?;

    let verified = state
        .api
        .verify_otp(&req)
        .await
        .map_err(|e| state.report(e.or_message("Invalid OTP")))?;

    state.store.set(keys::TOKEN, &verified.token)?;
    state.store.set(keys::PHONE_NUMBER, &msisdn)?;
    info!("Session started for {}", msisdn);

    if mode == AuthMode::Login {
        state.events.navigate(Route::Premiums);
    }
    Ok(())
}

/// Registers the rider's motorcycle, which also issues their wallet.
/// Returns the wallet address.
pub async fn register_motorcycle(state: &AppState, phone_input: &str, form: &MotorcycleForm) -> Result<String> {
    form.validate().map_err(|e| state.report(e.into()))?;

    let msisdn = format_phone_number(phone_input);
    let req = RegisterCompleteRequest {
        phone: to_wire(&msisdn),
        motorcycle: MotorcycleRegistration::from_form(form),
    };

    let registered = state
        .api
        .register_complete(&req)
        .await
        .map_err(|e| state.report(e.or_message("Failed to complete registration")))?;

    let details = MotorcycleDetails {
        kind: form.kind.clone(),
        model: form.model.trim().to_string(),
        license_plate: form.license_plate.clone(),
        year: form.year.trim().to_string(),
        engine_capacity: engine_capacity_cc(&form.engine_capacity).to_string(),
    };
    state.store.set_json(keys::MOTORCYCLE_DETAILS, &details)?;
    state.store.set(keys::WALLET_ADDRESS, &registered.wallet.address)?;
    state.store.set(keys::PHONE_NUMBER, &msisdn)?;
    info!("Registered {} with wallet {}", details.license_plate, registered.wallet.address);

    state.events.success("Registration complete");
    state.clock.sleep(REGISTRATION_REDIRECT_DELAY).await;
    state.events.navigate(Route::Premiums);

    Ok(registered.wallet.address)
}

/// Ends the session. The backend call is best effort; local session data is
/// cleared either way.
pub async fn logout(state: &AppState) -> Result<()> {
    if let Some(token) = state.token()? {
        if let Err(e) = state.api.logout(&token).await {
            warn!("Logout error: {}", e.message_or("backend unreachable"));
        }
    }

    for key in keys::SESSION {
        state.store.remove(key)?;
    }
    info!("Session cleared");

    state.events.navigate(Route::Signup);
    Ok(())
}
