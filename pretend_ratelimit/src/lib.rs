//! # pretend_ratelimit
//!
//! Client-side admission control for the Pretend API: a fixed-window request
//! counter combined with a bounded-concurrency semaphore.

pub mod error;
pub mod gate;

pub use error::RateLimitError;
pub use error::Result;
pub use gate::DEFAULT_CAPACITY;
pub use gate::DEFAULT_WINDOW;
pub use gate::Gate;
pub use gate::GateBuilder;
pub use gate::GatePermit;
