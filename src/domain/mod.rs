//! Core domain types and logic.

pub mod trade;
pub mod reference;
pub mod normalizer;
pub mod cumulation;
pub mod netting;
pub mod cash_flow;
pub mod root_finder;
pub mod irr;
pub mod settings;
pub mod error;
