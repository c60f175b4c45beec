//! Core utilities for the GSM transceiver simulator
//!
//! This crate provides fundamental types and helpers used across the workspace:
//! - GSM TDMA frame number arithmetic and the (T1, T2, T3, TC) time tuple
//! - Hard-bit / soft-bit conversion primitives
//! - Burst modulation types and GMSK training sequences
//! - Frequency hopping sequence generation (3GPP TS 45.002, section 6.2.3)
//! - Common PDU parse errors and logging setup

pub mod bitbuffer;
pub mod bits;
pub mod debug;
pub mod gsm_time;
pub mod hopping;
pub mod modulation;
pub mod pdu_parse_error;
pub mod train_seq;

// Re-export commonly used items
pub use bitbuffer::BitBuffer;
pub use gsm_time::{GsmTime, GSM_FRAME_US, GSM_HYPERFRAME};
pub use hopping::{HoppingError, HoppingParams};
pub use modulation::Modulation;
pub use pdu_parse_error::PduParseErr;

/// Frequency in Hz
pub type FreqHz = u64;

/// Number of timeslots in a TDMA frame
pub const NUM_TIMESLOTS: u8 = 8;
