//! Port traits for the collaborators outside the domain core.

pub mod calendar_port;
pub mod config_port;
pub mod reference_port;
pub mod trade_port;
