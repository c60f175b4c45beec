pub mod fields;
pub mod layouts;
pub mod msgs;

pub use layouts::{SUPPORTED_VERSIONS, best_supported, is_supported};
pub use msgs::{RxMsg, TxMsg, peek_version};
