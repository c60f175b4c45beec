pub mod fake_pm;

pub use fake_pm::FakePowerMeter;

use trx_core::FreqHz;

/// Power measurement provider for the MEASURE command
pub trait PowerMeasurement: Send + Sync {
    /// Measured power on `freq`, in dBm
    fn measure(&self, freq: FreqHz) -> i16;
}
