//! Trade source port.

use crate::domain::error::LedgerError;
use crate::domain::trade::RawTrade;

pub trait TradePort {
    fn fetch_trades(&self) -> Result<Vec<RawTrade>, LedgerError>;
}
