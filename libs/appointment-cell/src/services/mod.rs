pub mod engine;
pub mod ledger;
pub mod lifecycle;
pub mod pricing;
