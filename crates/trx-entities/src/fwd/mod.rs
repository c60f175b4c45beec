pub mod burst_fwd;

pub use burst_fwd::BurstForwarder;
