//! The key state machine
//!
//! Every key that is being tracked goes through the same lifecycle:
//!
//! ```text
//! Idle -> Pressed -> Hold -> Released -> Idle
//!            \________________/
//! ```
//!
//! A key becomes `Pressed` as soon as a scan sees it down.  If it stays down
//! for the hold threshold it moves to `Hold`, once.  When it comes up it is
//! `Released`, and immediately goes back to `Idle`, giving up its slot.
//!
//! Each of the three visible transitions sends an event with the key's
//! resolved character.  The character is worked out on the first of them and
//! kept for the rest, so a key released after its modifier still releases the
//! same character it pressed.

use crate::config::Config;
use crate::dispatch::{Dispatcher, KeyListener, LockListener, SubscriberId};
use crate::keymap::{KeyEntry, KeyId, Keymap};
use crate::log::{debug, info};
use crate::modifiers::{Modifier, ModifierState};
use crate::slots::SlotTable;
use crate::status::KeyStatus;
use crate::{KeyState, SLOT_COUNT};

/// The keyboard: the keys being tracked, the modifiers, and who to tell.
///
/// Only the scanner drives this.  Other contexts should look at the
/// [`KeyStatus`] it keeps up to date.
pub struct Keyboard<'a, C, const N: usize = SLOT_COUNT> {
    keymap: &'a Keymap,
    config: C,
    status: &'a KeyStatus<N>,
    slots: SlotTable<N>,
    mods: ModifierState,
    dispatch: Dispatcher<'a>,
}

impl<'a, C: Config, const N: usize> Keyboard<'a, C, N> {
    pub fn new(keymap: &'a Keymap, config: C, status: &'a KeyStatus<N>) -> Self {
        Keyboard {
            keymap,
            config,
            status,
            slots: SlotTable::new(),
            mods: ModifierState::new(),
            dispatch: Dispatcher::new(),
        }
    }

    pub fn keymap(&self) -> &'a Keymap {
        self.keymap
    }

    pub fn config(&self) -> &C {
        &self.config
    }

    pub fn status(&self) -> &'a KeyStatus<N> {
        self.status
    }

    pub fn slots(&self) -> &SlotTable<N> {
        &self.slots
    }

    pub fn modifiers(&self) -> &ModifierState {
        &self.mods
    }

    pub fn dispatcher(&mut self) -> &mut Dispatcher<'a> {
        &mut self.dispatch
    }

    pub fn subscribe_keys(&mut self, listener: impl KeyListener + 'a) -> SubscriberId {
        self.dispatch.subscribe_keys(listener)
    }

    pub fn subscribe_locks(&mut self, listener: impl LockListener + 'a) -> SubscriberId {
        self.dispatch.subscribe_locks(listener)
    }

    pub fn capslock(&self) -> bool {
        self.mods.capslock()
    }

    pub fn numlock(&self) -> bool {
        self.mods.numlock()
    }

    pub fn is_modifier_active(&self, modifier: Modifier) -> bool {
        self.mods.is_active(modifier)
    }

    /// Feed a single scan sample for a key.
    ///
    /// Keys already being tracked advance their state.  A new key that is
    /// down gets a slot, unless there are none left, in which case the press
    /// is dropped.
    pub fn sample(&mut self, key: KeyId, pressed: bool, now: u32) {
        let index = match self.slots.find(key) {
            Some(index) => index,
            None if !pressed => return,
            None => match self.slots.allocate(key) {
                Some(index) => index,
                None => {
                    debug!("No free slot for key {:?}", key);
                    return;
                }
            },
        };
        self.advance(index, pressed, now);
    }

    fn advance(&mut self, index: usize, pressed: bool, now: u32) {
        let slot = *self.slots.get(index);
        let entry = match slot.key.and_then(|k| self.keymap.get(k)) {
            Some(entry) => *entry,
            None => {
                self.slots.free(index);
                return;
            }
        };

        match slot.state {
            KeyState::Idle => {
                if pressed {
                    self.press(index, &entry, now);
                }
            }
            KeyState::Pressed => {
                if !pressed {
                    self.release(index, &entry);
                } else if now.wrapping_sub(slot.press_time) >= self.config.hold_threshold_ms() {
                    self.transition(index, &entry, KeyState::Hold);
                }
            }
            KeyState::Hold => {
                if !pressed {
                    self.release(index, &entry);
                }
            }
            KeyState::Released => self.finish(index, &entry),
        }
    }

    fn press(&mut self, index: usize, entry: &KeyEntry, now: u32) {
        let change = self.mods.press(entry.modifier);
        self.publish_modifiers();

        if !change.is_empty() {
            info!("Locks: caps {} num {}", self.mods.capslock(), self.mods.numlock());
            self.dispatch.lock_changed(change);
        }

        self.slots.get_mut(index).press_time = now;
        self.transition(index, entry, KeyState::Pressed);
    }

    fn release(&mut self, index: usize, entry: &KeyEntry) {
        self.transition(index, entry, KeyState::Released);
        self.finish(index, entry);
    }

    /// Move to a new state, resolving the key if it hasn't been yet, and
    /// sending the event if it resolves to something.
    fn transition(&mut self, index: usize, entry: &KeyEntry, state: KeyState) {
        let flags = self.config.flags();
        let slot = self.slots.get_mut(index);
        slot.state = state;
        if slot.effective == 0 {
            slot.effective = self.mods.resolve(entry, self.keymap, flags);
        }
        let key = slot.effective;

        self.status.set_down(index, if state.is_down() { key } else { 0 });

        if key != 0 {
            debug!("Key {} {:?}", key, state);
            self.dispatch.key_event(key, state);
        }
    }

    /// Back to idle, returning the slot.
    fn finish(&mut self, index: usize, entry: &KeyEntry) {
        self.mods.release(entry.modifier);
        self.publish_modifiers();
        self.status.set_down(index, 0);
        self.slots.free(index);
    }

    fn publish_modifiers(&self) {
        self.status.set_modifiers(self.mods.held());
        self.status.set_locks(self.mods.capslock(), self.mods.numlock());
    }
}
