pub mod clock;
pub mod hima_api;
pub mod ledger;
pub mod msisdn;
pub mod purchase_service;
pub mod storage;

#[cfg(test)]
pub(crate) mod fake_api;
