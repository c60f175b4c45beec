pub mod clck_gen;

pub use clck_gen::{ClockError, ClockGen, TickHandler};
