pub mod schedule;
pub mod update_detector;

pub use schedule::{spawn_recurring, PollHandle};
pub use update_detector::{TickOutcome, UpdateDetector};
