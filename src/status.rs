//! Shared key status
//!
//! The scanner is the only writer of keyboard state, but other contexts (the
//! host interface, an LED task) want to ask things like "is caps-lock on" or
//! "is this key down".  Rather than reaching into the scanner's state, the
//! scanner mirrors what can be asked about into a [`KeyStatus`] after every
//! change, and readers use that.
//!
//! Every field is a single atomic, and each is only ever stored by the
//! scanner, so plain loads and stores are all that's needed.

use enumset::EnumSet;
use portable_atomic::{AtomicBool, AtomicU8, Ordering};

use crate::modifiers::Modifier;

#[allow(clippy::declare_interior_mutable_const)]
const NOT_DOWN: AtomicU8 = AtomicU8::new(0);

/// State visible outside of the scanner.  `N` matches the slot count.
pub struct KeyStatus<const N: usize = { crate::SLOT_COUNT }> {
    capslock: AtomicBool,
    numlock: AtomicBool,
    modifiers: AtomicU8,
    /// The resolved character of each slot that is down, 0 otherwise.
    down: [AtomicU8; N],
}

impl<const N: usize> KeyStatus<N> {
    pub const fn new() -> Self {
        KeyStatus {
            capslock: AtomicBool::new(false),
            numlock: AtomicBool::new(false),
            modifiers: AtomicU8::new(0),
            down: [NOT_DOWN; N],
        }
    }

    pub fn capslock(&self) -> bool {
        self.capslock.load(Ordering::Acquire)
    }

    pub fn numlock(&self) -> bool {
        self.numlock.load(Ordering::Acquire)
    }

    pub fn is_modifier_active(&self, modifier: Modifier) -> bool {
        self.modifiers().contains(modifier)
    }

    pub fn modifiers(&self) -> EnumSet<Modifier> {
        EnumSet::from_u8_truncated(self.modifiers.load(Ordering::Acquire))
    }

    /// Is a key producing this character currently down.
    pub fn is_key_down(&self, key: u8) -> bool {
        key != 0 && self.down.iter().any(|d| d.load(Ordering::Acquire) == key)
    }

    pub(crate) fn set_locks(&self, capslock: bool, numlock: bool) {
        self.capslock.store(capslock, Ordering::Release);
        self.numlock.store(numlock, Ordering::Release);
    }

    pub(crate) fn set_modifiers(&self, modifiers: EnumSet<Modifier>) {
        self.modifiers.store(modifiers.as_u8(), Ordering::Release);
    }

    /// Record the character for a slot, 0 once it is no longer down.
    pub(crate) fn set_down(&self, slot: usize, key: u8) {
        if let Some(d) = self.down.get(slot) {
            d.store(key, Ordering::Release);
        }
    }
}

impl<const N: usize> Default for KeyStatus<N> {
    fn default() -> Self {
        Self::new()
    }
}
