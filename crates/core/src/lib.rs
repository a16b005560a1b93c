//! Domain model and pure state machines for the radio-discipline trainer.
//!
//! Nothing in this crate performs I/O: storage lives in `storage`, session
//! orchestration and randomness live in `services`.

#![forbid(unsafe_code)]

pub mod model;
pub mod progress;
pub mod ptt;
pub mod scorer;
pub mod time;

pub use progress::{Progress, compute_progress};
pub use time::Clock;
