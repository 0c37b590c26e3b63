use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::services::msisdn::validate_msisdn;

pub const MISSING_MOTORCYCLE_FIELDS: &str =
    "Please fill in all required fields (Type, License Plate, Engine Capacity)";

#[derive(Debug, Serialize, Validate)]
pub struct RequestOtpRequest {
    #[serde(skip)]
    #[validate(custom(function = "check_msisdn"))]
    pub msisdn: String,
    pub phone: String,
}

#[derive(Debug, Serialize, Validate)]
pub struct VerifyOtpRequest {
    #[serde(skip)]
    #[validate(custom(function = "check_msisdn"))]
    pub msisdn: String,
    pub phone: String,

    #[validate(
        length(equal = 6, message = "Please enter a 6-digit OTP"),
        custom(function = "check_otp_digits")
    )]
    pub otp: String,
}

/// Fields of the motorcycle step of signup, as typed.
#[derive(Debug, Clone, Default, Validate)]
pub struct MotorcycleForm {
    #[validate(length(min = 1, message = "Please fill in all required fields (Type, License Plate, Engine Capacity)"))]
    pub kind: String,
    pub model: String,
    #[validate(length(min = 1, message = "Please fill in all required fields (Type, License Plate, Engine Capacity)"))]
    pub license_plate: String,
    pub year: String,
    /// One of the capacity buckets (`under50`, `50-125`, ...).
    #[validate(length(min = 1, message = "Please fill in all required fields (Type, License Plate, Engine Capacity)"))]
    pub engine_capacity: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorcycleRegistration {
    #[serde(rename = "type")]
    pub kind: String,
    pub license_plate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub engine_capacity: u32,
}

impl MotorcycleRegistration {
    pub fn from_form(form: &MotorcycleForm) -> Self {
        let model = form.model.trim();
        Self {
            kind: form.kind.clone(),
            license_plate: form.license_plate.clone(),
            model: (!model.is_empty()).then(|| model.to_string()),
            year: form.year.trim().parse().ok(),
            engine_capacity: engine_capacity_cc(&form.engine_capacity),
        }
    }
}

/// Upper bound in cc for a capacity bucket; unknown buckets count as 125.
pub fn engine_capacity_cc(bucket: &str) -> u32 {
    match bucket {
        "under50" => 50,
        "50-125" => 125,
        "126-250" => 250,
        "251-500" => 500,
        "over500" => 501,
        _ => 125,
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterCompleteRequest {
    pub phone: String,
    pub motorcycle: MotorcycleRegistration,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct Wallet {
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterCompleteResponse {
    pub wallet: Wallet,
}

/// Shape of every error body the backend returns.
#[derive(Debug, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

fn check_msisdn(phone: &str) -> Result<(), ValidationError> {
    validate_msisdn(phone)
}

fn check_otp_digits(otp: &str) -> Result<(), ValidationError> {
    if otp.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        let mut err = ValidationError::new("otp_digits");
        err.message = Some(Cow::from("Please enter a 6-digit OTP"));
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::AppError;

    #[test]
    fn otp_must_be_six_digits() {
        let ok = VerifyOtpRequest {
            msisdn: "254712345678".into(),
            phone: "+254712345678".into(),
            otp: "123456".into(),
        };
        assert!(ok.validate().is_ok());

        for otp in ["12345", "1234567", "12a456"] {
            let bad = VerifyOtpRequest {
                msisdn: "254712345678".into(),
                phone: "+254712345678".into(),
                otp: otp.into(),
            };
            let err: AppError = bad.validate().unwrap_err().into();
            assert_eq!(err.user_message(), "Please enter a 6-digit OTP");
        }
    }

    #[test]
    fn request_otp_checks_msisdn() {
        let bad = RequestOtpRequest {
            msisdn: "0712".into(),
            phone: "+0712".into(),
        };
        let err: AppError = bad.validate().unwrap_err().into();
        assert_eq!(
            err.user_message(),
            "Please enter a valid phone number (e.g., 7XXXXXXXX)"
        );

        let json = serde_json::to_value(RequestOtpRequest {
            msisdn: "254712345678".into(),
            phone: "+254712345678".into(),
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "phone": "+254712345678" }));
    }

    #[test]
    fn motorcycle_form_requires_core_fields() {
        let form = MotorcycleForm {
            kind: "motorcycle".into(),
            license_plate: String::new(),
            engine_capacity: "50-125".into(),
            ..Default::default()
        };
        let err: AppError = form.validate().unwrap_err().into();
        assert_eq!(err.user_message(), MISSING_MOTORCYCLE_FIELDS);
    }

    #[test]
    fn registration_maps_capacity_buckets() {
        let form = MotorcycleForm {
            kind: "motorcycle".into(),
            model: " ".into(),
            license_plate: "KMEA 123A".into(),
            year: "2019".into(),
            engine_capacity: "126-250".into(),
        };
        let reg = MotorcycleRegistration::from_form(&form);
        assert_eq!(reg.engine_capacity, 250);
        assert_eq!(reg.year, Some(2019));
        assert!(reg.model.is_none());

        assert_eq!(engine_capacity_cc("over500"), 501);
        assert_eq!(engine_capacity_cc("weird"), 125);
    }
}
