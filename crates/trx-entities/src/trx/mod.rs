pub mod rf_sim;
pub mod transceiver;
pub mod trx_list;
pub mod tx_queue;

pub use rf_sim::{SimParams, SrcInfo};
pub use transceiver::{Transceiver, TrxLinks, TrxState};
pub use trx_list::TrxList;
pub use tx_queue::TxQueue;

/// Index of a transceiver within its `TrxList`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrxId(pub usize);
