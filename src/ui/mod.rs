mod app;

pub use self::app::PianoApp;

use std::time::Duration;

/// How often the physical keyboard is polled.
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);
