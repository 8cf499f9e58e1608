pub mod double_init;

pub use double_init::DoubleInitDetector;
