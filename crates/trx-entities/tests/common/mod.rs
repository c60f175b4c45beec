pub mod component_test;
pub mod sink;

#[allow(unused_imports)]
pub use component_test::{ComponentTest, default_test_config, gmsk_burst};
#[allow(unused_imports)]
pub use sink::SinkLink;
