//! BBQ keyboard input core
//!
//! Scans a key matrix (plus a few directly wired buttons), tracks the keys
//! that are currently held, resolves each one into a character under the
//! active modifiers and latches, and hands the resulting key events to
//! subscribers.
//!
//! The pieces, from the bottom up:
//!
//! - [`keymap`]: the static description of what each position means.
//! - [`slots`]: the fixed table of keys currently being tracked.
//! - [`modifiers`]: modifier and lock state, and the character resolution rules.
//! - [`keyboard`]: the per-key state machine tying the above together.
//! - [`scan`]: the periodic matrix scan that drives everything.
//! - [`dispatch`]: the subscribers that are told about events.
//!
//! Everything the scan path touches is fixed size.  The only allocation is
//! when subscribers are registered at startup.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
// #![deny(missing_docs)]

extern crate alloc;

pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod keyboard;
pub mod keymap;
pub mod modifiers;
pub mod queue;
pub mod scan;
pub mod slots;
pub mod status;

pub use config::{Config, ConfigFlags, Interrupts, Registers};
pub use dispatch::{Dispatcher, KeyListener, LockListener, SubscriberId};
pub use keyboard::Keyboard;
pub use keymap::{KeyEntry, KeyId, Keymap};
pub use modifiers::{LockChange, Modifier, ModifierState};
pub use queue::{KeyQueue, QueueForwarder, QueueItem, StatusNotifier};
pub use scan::{MatrixIo, ScanTimer, Scanner};
pub use slots::{Slot, SlotTable};
pub use status::KeyStatus;

#[cfg(test)]
mod testlog;

#[cfg(all(feature = "log", not(feature = "defmt")))]
mod log {
    pub use ::log::{debug, info, warn};
}

#[cfg(not(any(feature = "log", feature = "defmt")))]
mod log {
    macro_rules! discard {
        ($($arg:tt)*) => {{
            let _ = ::core::format_args!($($arg)*);
        }};
    }
    pub(crate) use discard as debug;
    pub(crate) use discard as info;
    pub(crate) use discard as warn;
}

#[cfg(feature = "defmt")]
mod log {
    pub use defmt::{debug, info, warn};
}

/// Number of keys that can be tracked at the same time.
pub const SLOT_COUNT: usize = 10;

/// The lifecycle of a tracked key.
///
/// Subscribers only ever see `Pressed`, `Hold` and `Released`.  `Idle` is the
/// state of a slot that isn't bound to a key.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum KeyState {
    #[default]
    Idle,
    Pressed,
    Hold,
    Released,
}

impl KeyState {
    /// Is a key in this state physically down.
    pub fn is_down(&self) -> bool {
        matches!(self, KeyState::Pressed | KeyState::Hold)
    }
}
