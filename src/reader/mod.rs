//! Byte streams assembled from hardware words.
//!
//! A [`StreamReader`] fills caller buffers of any length by drawing one
//! word at a time from an [`EntropySource`](crate::source::EntropySource)
//! and copying as many of its bytes as the request still needs.

mod request;
mod rng;
mod stream;

pub use request::ReadRequest;
pub use rng::HardwareRng;
pub use stream::{Delivery, ReadError, StreamReader};
