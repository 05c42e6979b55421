//! Plain HTTP lookups against public data APIs.

pub mod bitcoin;
pub mod weather;

use std::time::Duration;

/// Applied to every lookup request.
pub const LOOKUP_TIMEOUT: Duration = Duration::from_secs(30);

pub use bitcoin::{BitcoinClient, PriceHistory, PricePoint};
pub use weather::{WeatherClient, WeatherReport};
