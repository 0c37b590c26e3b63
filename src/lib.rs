//! Hima rider insurance client.
//!
//! Onboarding, premium selection and the M-Pesa purchase confirmation flow
//! against the Hima backend, with session data kept in a local key-value
//! store.

pub mod config;
pub mod dtos;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
