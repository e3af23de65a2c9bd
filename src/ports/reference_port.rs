//! Reference data source port.

use crate::domain::error::LedgerError;
use crate::domain::reference::ReferenceRow;

pub trait ReferencePort {
    fn fetch_reference(&self) -> Result<Vec<ReferenceRow>, LedgerError>;
}
