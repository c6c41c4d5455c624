//! Voice lifecycle: which notes are sounding, and when their engine voices
//! get freed.

mod active;
mod cleanup;
mod clock;
mod manager;

pub use self::active::ActiveKeys;
pub use self::cleanup::{CleanupQueue, PendingCleanup};
pub use self::clock::{Clock, ManualClock, SystemClock};
pub use self::manager::{Outcome, VoiceManager, VoiceStats};
