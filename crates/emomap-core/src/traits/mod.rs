//! Traits (ports) - interfaces implemented by the infrastructure adapters

mod ports;

pub use ports::{ApiResult, EmotionApi, ReverseGeocoder};
