pub mod auth;
pub mod payments;
pub mod policies;
pub mod premiums;
pub mod profile;
pub mod purchase;
