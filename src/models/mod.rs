pub mod order;
pub mod payment;
pub mod policy;
pub mod premium;
pub mod user;
