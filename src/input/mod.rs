mod keyboard;
mod router;

pub use self::keyboard::{key_label, transitions, KeyboardHandler};
pub use self::router::{InputRouter, Modifiers, RawInput};
