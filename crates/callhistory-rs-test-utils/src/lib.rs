//! Test helpers shared across call history crates.

pub mod call_log;
pub mod clock;
pub mod contacts;
pub mod dialer;

pub use call_log::{StubCallLog, call_row, numbered_rows};
pub use clock::FixedClock;
pub use contacts::{StubDirectory, contact};
pub use dialer::RecordingDialer;
