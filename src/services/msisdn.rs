// services/msisdn.rs
use std::borrow::Cow;

use validator::ValidationError;

pub const INVALID_PHONE: &str = "Please enter a valid phone number (e.g., 7XXXXXXXX)";

const COUNTRY_CODE: &str = "254";

/// Brings a Kenyan mobile number into `254XXXXXXXXX` form. Inputs that do
/// not look like one are returned trimmed but otherwise untouched.
pub fn format_phone_number(phone: &str) -> String {
    let phone = phone.trim().trim_start_matches('+');
    if phone.starts_with(COUNTRY_CODE) && phone.len() == 12 {
        return phone.to_string();
    }
    if phone.starts_with("07") && phone.len() == 10 {
        return format!("{}{}", COUNTRY_CODE, &phone[1..]);
    }
    if phone.starts_with('7') && phone.len() == 9 {
        return format!("{}{}", COUNTRY_CODE, phone);
    }
    phone.to_string()
}

/// `254` followed by exactly nine digits.
pub fn is_valid_msisdn(phone: &str) -> bool {
    phone.len() == 12
        && phone.starts_with(COUNTRY_CODE)
        && phone.bytes().all(|b| b.is_ascii_digit())
}

/// Form used by the auth endpoints: `+254XXXXXXXXX`.
pub fn to_wire(phone: &str) -> String {
    format!("+{}", phone.trim_start_matches('+'))
}

pub fn validate_msisdn(phone: &str) -> Result<(), ValidationError> {
    if is_valid_msisdn(phone) {
        Ok(())
    } else {
        let mut err = ValidationError::new("msisdn");
        err.message = Some(Cow::from(INVALID_PHONE));
        Err(err)
    }
}
