pub mod anomaly;
pub mod ranking;

pub use anomaly::AnomalyDetector;
