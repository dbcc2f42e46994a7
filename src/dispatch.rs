//! Keyboard event dispatch.
//!
//! There are two kinds of subscribers: those that want every key event, and
//! those that want to know when a lock latch changes.  Each kind is called, in
//! the order subscribed, directly from the scan that produced the event.
//!
//! Subscribers run inside of the scan, so they must be quick.  Anything slow
//! (such as waiting on a transport) delays the scan and throws off its timing;
//! hand such work off to a queue instead.  A subscriber that panics is not
//! caught.

use alloc::boxed::Box;
use alloc::vec::Vec;

use crate::modifiers::LockChange;
use crate::KeyState;

/// Something that wants key events.
pub trait KeyListener {
    fn key_event(&mut self, key: u8, state: KeyState);
}

impl<F: FnMut(u8, KeyState)> KeyListener for F {
    fn key_event(&mut self, key: u8, state: KeyState) {
        self(key, state)
    }
}

/// Something that wants to know when caps-lock or num-lock changed.  The new
/// value has to be asked for separately.
pub trait LockListener {
    fn lock_changed(&mut self, caps_changed: bool, num_changed: bool);
}

impl<F: FnMut(bool, bool)> LockListener for F {
    fn lock_changed(&mut self, caps_changed: bool, num_changed: bool) {
        self(caps_changed, num_changed)
    }
}

/// Returned when subscribing, and can be used to unsubscribe.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriberId(u16);

#[derive(Default)]
pub struct Dispatcher<'a> {
    next_id: u16,
    keys: Vec<(SubscriberId, Box<dyn KeyListener + 'a>)>,
    locks: Vec<(SubscriberId, Box<dyn LockListener + 'a>)>,
}

impl<'a> Dispatcher<'a> {
    pub fn new() -> Self {
        Dispatcher {
            next_id: 0,
            keys: Vec::new(),
            locks: Vec::new(),
        }
    }

    fn next_id(&mut self) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    pub fn subscribe_keys(&mut self, listener: impl KeyListener + 'a) -> SubscriberId {
        let id = self.next_id();
        self.keys.push((id, Box::new(listener)));
        id
    }

    pub fn subscribe_locks(&mut self, listener: impl LockListener + 'a) -> SubscriberId {
        let id = self.next_id();
        self.locks.push((id, Box::new(listener)));
        id
    }

    /// Remove a subscriber of either kind.  Returns false if it wasn't
    /// subscribed.
    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.keys.len() + self.locks.len();
        self.keys.retain(|(i, _)| *i != id);
        self.locks.retain(|(i, _)| *i != id);
        before != self.keys.len() + self.locks.len()
    }

    pub fn key_event(&mut self, key: u8, state: KeyState) {
        for (_, listener) in self.keys.iter_mut() {
            listener.key_event(key, state);
        }
    }

    pub fn lock_changed(&mut self, change: LockChange) {
        let caps = change.contains(LockChange::CAPS);
        let num = change.contains(LockChange::NUM);
        for (_, listener) in self.locks.iter_mut() {
            listener.lock_changed(caps, num);
        }
    }
}
