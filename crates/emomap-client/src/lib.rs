//! # emomap-client
//!
//! Adapters implementing the backend ports of `emomap-core`:
//!
//! - [`HttpEmotionApi`] talks to the REST backend with `reqwest`
//! - [`NominatimGeocoder`] resolves coordinates to addresses
//! - [`InMemoryEmotionApi`] keeps everything in process, for tests and offline demos

mod envelope;
mod error;
mod geocoder;
mod http;
mod memory;

pub use error::{status_error, transport_error};
pub use geocoder::{DisabledGeocoder, NominatimGeocoder};
pub use http::HttpEmotionApi;
pub use memory::InMemoryEmotionApi;
